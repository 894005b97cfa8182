//! Regex-based detection and redaction of personally identifiable
//! information in outbound queries.
//!
//! The pattern set is fixed: email addresses, phone-like digit runs, and
//! loose credit-card digit sequences. The numeric patterns are deliberately
//! broad and will also claim unrelated digit strings; callers should treat a
//! match as "looks like PII", not proof.

use once_cell::sync::Lazy;
use regex::Regex;

struct PiiPattern {
    label: &'static str,
    regex: Regex,
}

// Applied in order: email, phone, credit card. Overlapping matches are not
// specially resolved; whichever pattern runs first claims the span.
static PII_PATTERNS: Lazy<Vec<PiiPattern>> = Lazy::new(|| {
    vec![
        PiiPattern {
            label: "EMAIL",
            regex: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("email pattern"),
        },
        PiiPattern {
            label: "PHONE",
            regex: Regex::new(r"\b(\+?\d{1,3}[\s-]?)?(\(?\d{3}\)?[\s-]?)?\d{3}[\s-]?\d{4}\b")
                .expect("phone pattern"),
        },
        PiiPattern {
            label: "CREDIT_CARD",
            regex: Regex::new(r"\b(?:\d[ -]*?){13,16}\b").expect("credit card pattern"),
        },
    ]
});

/// True if any of the fixed patterns matches anywhere in the text.
pub fn contains_pii(text: &str) -> bool {
    PII_PATTERNS.iter().any(|p| p.regex.is_match(text))
}

/// Replace every match of each pattern with a category-tagged placeholder.
/// Placeholders contain no digits, so a second pass finds nothing further.
pub fn redact_pii(text: &str) -> String {
    let mut redacted = text.to_string();
    for pattern in PII_PATTERNS.iter() {
        let placeholder = format!("[REDACTED-{}]", pattern.label);
        redacted = pattern
            .regex
            .replace_all(&redacted, placeholder.as_str())
            .into_owned();
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_email_addresses() {
        assert!(contains_pii("Contact me at user@example.com"));
    }

    #[test]
    fn detects_phone_numbers() {
        assert!(contains_pii("Call me at 555-123-4567"));
    }

    #[test]
    fn detects_card_like_digit_runs() {
        assert!(contains_pii("Card number: 4532-1234-5678-9010"));
    }

    #[test]
    fn ignores_plain_prose() {
        assert!(!contains_pii(
            "This is a normal message without any sensitive information."
        ));
    }

    #[test]
    fn redacts_emails_with_placeholder() {
        let result = redact_pii("Contact me at user@example.com");
        assert!(result.contains("[REDACTED-EMAIL]"));
        assert!(!result.contains("user@example.com"));
    }

    #[test]
    fn redacts_phone_numbers_with_placeholder() {
        let result = redact_pii("Call me at 555-123-4567");
        assert!(result.contains("[REDACTED-PHONE]"));
        assert!(!result.contains("555-123-4567"));
    }

    #[test]
    fn redacts_mixed_email_and_phone() {
        let result = redact_pii("Email: user@example.com, Phone: 555-123-4567");
        assert!(result.contains("[REDACTED-EMAIL]"));
        assert!(result.contains("[REDACTED-PHONE]"));
        assert!(!result.contains("user@example.com"));
        assert!(!result.contains("555-123-4567"));
    }

    #[test]
    fn text_without_pii_passes_through_unchanged() {
        let text = "This is a normal message.";
        assert_eq!(redact_pii(text), text);
    }

    // The phone pattern runs before the credit-card pattern and claims card
    // digit groups first. The digits are still gone, which is what matters.
    #[test]
    fn card_digits_never_survive_redaction() {
        let result = redact_pii("Card number: 4532-1234-5678-9010");
        assert!(result.contains("[REDACTED-"));
        assert!(!result.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn redaction_is_idempotent() {
        let once = redact_pii("Reach user@example.com or 555-123-4567, card 4532-1234-5678-9010");
        let twice = redact_pii(&once);
        assert_eq!(once, twice);
        assert!(!contains_pii(&once));
    }
}
