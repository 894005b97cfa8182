//! The interactive chat loop and the per-turn query pipeline.
//!
//! Each turn runs sanitize → complete → validate → log → print in sequence.
//! Every failure is recovered locally: a flagged or errored turn prints a
//! status line and the loop keeps going.

use std::io::{self, Write};
use std::time::Instant;

use tokio::io::AsyncBufReadExt;

use crate::api::client::{ApiError, ChatApi, HttpChatApi};
use crate::core::config::Config;
use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_METRICS_FILE, DEFAULT_MODEL, DEFAULT_MODERATION_MODEL,
    DEFAULT_PROMPT_FILE,
};
use crate::core::conversation::Conversation;
use crate::core::metrics::{MetricRecord, MetricsLog};
use crate::core::moderation::{screen_input, screen_output, ScreenedInput};

/// Command-line overrides applied on top of the config file and defaults.
#[derive(Debug, Default)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub prompt_file: Option<String>,
    pub metrics_file: Option<String>,
}

pub struct ChatSession<'a> {
    api: &'a dyn ChatApi,
    model: String,
    moderation_model: String,
    conversation: Conversation,
    metrics: MetricsLog,
}

impl<'a> ChatSession<'a> {
    pub fn new(
        api: &'a dyn ChatApi,
        model: String,
        moderation_model: String,
        system_prompt: &str,
        metrics: MetricsLog,
    ) -> Self {
        Self {
            api,
            model,
            moderation_model,
            conversation: Conversation::new(system_prompt),
            metrics,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

/// What the loop should show the user for one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answer(String),
    InputBlocked(Vec<String>),
    OutputWithheld(Vec<String>),
}

/// Run one query through the full pipeline. Transport failures on either
/// endpoint propagate to the caller; the conversation is only mutated once
/// the completion call has succeeded, so a failed turn leaves no trace.
pub async fn run_turn(session: &mut ChatSession<'_>, query: &str) -> Result<TurnOutcome, ApiError> {
    let screened = screen_input(session.api, &session.moderation_model, query).await?;
    let (sanitized, redacted) = match screened {
        ScreenedInput::Blocked(categories) => {
            tracing::info!(?categories, "query rejected by input moderation");
            return Ok(TurnOutcome::InputBlocked(categories));
        }
        ScreenedInput::Accepted { text, redacted } => (text, redacted),
    };
    if redacted {
        tracing::warn!("query contained PII; a redacted copy was sent instead");
    }

    let user_turn = wrap_query(&sanitized);
    let outgoing = session.conversation.with_user_turn(&user_turn);

    let started = Instant::now();
    let response = session.api.complete(&session.model, outgoing).await?;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    let content = response.content();
    let mut record = MetricRecord::new(&sanitized, &response.usage, latency_ms, &session.model);

    let verdict = screen_output(session.api, &session.moderation_model, &content).await?;

    session.conversation.push_user(&user_turn);
    if verdict.flagged {
        // The cost is already incurred; log the turn but keep the flagged
        // answer out of both the display and the running history.
        record.mark_output_blocked();
        record_metrics(&session.metrics, record);
        return Ok(TurnOutcome::OutputWithheld(verdict.categories));
    }

    session.conversation.push_assistant(&content);
    record_metrics(&session.metrics, record);
    Ok(TurnOutcome::Answer(content))
}

fn record_metrics(metrics: &MetricsLog, record: MetricRecord) {
    if let Err(e) = metrics.append(record) {
        eprintln!("⚠️  Failed to record metrics: {e}");
    }
}

/// The user turn as transmitted, mirroring the instruction footer the
/// system prompt establishes.
fn wrap_query(query: &str) -> String {
    format!("User: {query}\n\nReturn only valid JSON in the exact structure shown above.")
}

/// Pretty-print the content when it parses as JSON (four-space indent),
/// otherwise return it unchanged. Never fails.
pub fn format_response(content: &str) -> String {
    use serde::Serialize;

    let Ok(value) = serde_json::from_str::<serde_json::Value>(content) else {
        return content.to_string();
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut serializer).is_err() {
        return content.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| content.to_string())
}

pub fn is_quit_command(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn describe_categories(categories: &[String]) -> String {
    if categories.is_empty() {
        "unspecified".to_string()
    } else {
        categories.join(", ")
    }
}

/// Resolve settings, build the HTTP client, and run the interactive loop
/// until EOF or a quit keyword.
pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
        "❌ OPENAI_API_KEY is not set.\n\n\
         Export your API key first:\n  export OPENAI_API_KEY=\"your-api-key-here\"\n\n\
         Optionally set a custom endpoint:\n  export OPENAI_BASE_URL=\"https://api.openai.com/v1\""
    })?;
    let base_url = std::env::var("OPENAI_BASE_URL")
        .ok()
        .or_else(|| config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let model = options
        .model
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let moderation_model = config
        .moderation_model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODERATION_MODEL.to_string());
    let prompt_file = options
        .prompt_file
        .or_else(|| config.prompt_file.clone())
        .unwrap_or_else(|| DEFAULT_PROMPT_FILE.to_string());
    let metrics_file = options
        .metrics_file
        .or_else(|| config.metrics_file.clone())
        .unwrap_or_else(|| DEFAULT_METRICS_FILE.to_string());

    let system_prompt = std::fs::read_to_string(&prompt_file)
        .map_err(|e| format!("❌ Could not read system prompt file '{prompt_file}': {e}"))?;

    tracing::info!(%model, %base_url, %metrics_file, "starting chat session");

    let api = HttpChatApi::new(base_url, api_key);
    let mut session = ChatSession::new(
        &api,
        model,
        moderation_model,
        &system_prompt,
        MetricsLog::new(&metrics_file),
    );

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Enter a query (or 'exit' to quit): ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_quit_command(input) {
            break;
        }

        match run_turn(&mut session, input).await {
            Ok(TurnOutcome::Answer(content)) => println!("{}", format_response(&content)),
            Ok(TurnOutcome::InputBlocked(categories)) => {
                println!(
                    "⚠️  Query blocked by moderation: {}",
                    describe_categories(&categories)
                );
            }
            Ok(TurnOutcome::OutputWithheld(categories)) => {
                println!(
                    "⚠️  Response withheld by moderation: {}",
                    describe_categories(&categories)
                );
            }
            Err(e) => eprintln!("❌ Request failed: {e}"),
        }
    }

    Ok(())
}
