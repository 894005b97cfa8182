//! Moderato is a terminal chatbot client for working with remote LLM APIs.
//!
//! Every query travels through a linear per-turn pipeline: the input is
//! screened (content moderation, then PII redaction), the sanitized query is
//! sent to a chat-completions endpoint, the answer is screened again before
//! display, and the turn's latency, token usage, and dollar cost are appended
//! to a JSON metrics log.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns configuration, conversation state, the safety gates
//!   (PII filtering and moderation verdicts), the metrics log, and the
//!   interactive chat loop.
//! - [`api`] defines the chat/moderation payloads and the HTTP client used
//!   to talk to OpenAI-compatible endpoints. The client sits behind a trait
//!   so the pipeline can be exercised against a scripted collaborator.
//! - [`cli`] parses command-line arguments and dispatches into the chat
//!   loop or the metrics summary.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
