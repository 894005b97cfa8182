pub mod chat;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod metrics;
pub mod moderation;
pub mod pii;
