//! URL helpers for building API endpoints without doubled slashes.

/// Join a base URL and an endpoint path, tolerating stray slashes on
/// either side.
///
/// ```
/// use moderato::utils::url::endpoint_url;
///
/// assert_eq!(
///     endpoint_url("https://api.openai.com/v1/", "chat/completions"),
///     "https://api.openai.com/v1/chat/completions"
/// );
/// ```
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_clean_base_and_endpoint() {
        assert_eq!(
            endpoint_url("https://api.openai.com/v1", "moderations"),
            "https://api.openai.com/v1/moderations"
        );
    }

    #[test]
    fn strips_redundant_slashes_on_both_sides() {
        assert_eq!(
            endpoint_url("https://api.openai.com/v1///", "//chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }
}
