//! Shared constants used across the application

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MODERATION_MODEL: &str = "omni-moderation-latest";

pub const DEFAULT_PROMPT_FILE: &str = "prompts/main_prompt.txt";
pub const DEFAULT_METRICS_FILE: &str = "metrics/metrics.json";

/// Fixed completion parameters: deterministic-leaning sampling and a capped
/// JSON-object answer.
pub const TEMPERATURE: f32 = 0.2;
pub const MAX_COMPLETION_TOKENS: u32 = 300;

/// Billing rates in USD per million tokens.
pub const PROMPT_COST_PER_MILLION: f64 = 0.15;
pub const COMPLETION_COST_PER_MILLION: f64 = 0.60;
