//! Moderation verdicts and the input/output safety gates.
//!
//! Input is screened before any completion call is made, so a flagged query
//! costs nothing. Output is screened after the call; a flagged answer is
//! withheld from the user but the turn is still billed and logged.

use crate::api::client::{ApiError, ChatApi};
use crate::api::ModerationResponse;
use crate::core::pii;

/// Outcome of one moderation call: the endpoint's flag plus the names of
/// the categories it reported as violated, in sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModerationVerdict {
    pub flagged: bool,
    pub categories: Vec<String>,
}

impl ModerationVerdict {
    pub fn from_response(response: &ModerationResponse) -> Self {
        let Some(result) = response.results.first() else {
            return Self::default();
        };

        // serde_json's map is ordered by key, so the listing is stable.
        let categories = result
            .categories
            .iter()
            .filter(|(_, flagged)| flagged.as_bool() == Some(true))
            .map(|(name, _)| name.clone())
            .collect();

        Self {
            flagged: result.flagged,
            categories,
        }
    }
}

/// Result of screening a raw user query.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenedInput {
    /// Moderation flagged the query; the turn must be abandoned before any
    /// completion call.
    Blocked(Vec<String>),
    /// The query may proceed. `redacted` marks whether PII placeholders were
    /// silently substituted for the original text.
    Accepted { text: String, redacted: bool },
}

pub async fn screen_input(
    api: &dyn ChatApi,
    moderation_model: &str,
    query: &str,
) -> Result<ScreenedInput, ApiError> {
    let response = api.moderate(moderation_model, query).await?;
    let verdict = ModerationVerdict::from_response(&response);
    if verdict.flagged {
        return Ok(ScreenedInput::Blocked(verdict.categories));
    }

    if pii::contains_pii(query) {
        return Ok(ScreenedInput::Accepted {
            text: pii::redact_pii(query),
            redacted: true,
        });
    }

    Ok(ScreenedInput::Accepted {
        text: query.to_string(),
        redacted: false,
    })
}

pub async fn screen_output(
    api: &dyn ChatApi,
    moderation_model: &str,
    content: &str,
) -> Result<ModerationVerdict, ApiError> {
    let answer = answer_text(content);
    let response = api.moderate(moderation_model, &answer).await?;
    Ok(ModerationVerdict::from_response(&response))
}

/// The text actually shown to the user: the `answer` field when the content
/// parses as a JSON object carrying one, otherwise the raw content.
pub fn answer_text(content: &str) -> String {
    serde_json::from_str::<serde_json::Value>(content)
        .ok()
        .and_then(|value| {
            value
                .get("answer")
                .and_then(|answer| answer.as_str().map(str::to_owned))
        })
        .unwrap_or_else(|| content.to_string())
}
