// src/utils/html.rs

/// Sanitizes free-text listing content (college and course descriptions)
/// with ammonia's whitelist: formatting tags survive, scripts, iframes and
/// event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Optional variant used for nullable description fields. Blank input becomes `None`.
pub fn clean_optional(input: Option<String>) -> Option<String> {
    input
        .map(|s| clean_html(s.trim()))
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_removed() {
        let cleaned = clean_html("<p>Great <b>labs</b></p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>Great <b>labs</b></p>");
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(None), None);
        assert_eq!(clean_optional(Some("   ".to_string())), None);
        assert_eq!(clean_optional(Some(" plain ".to_string())), Some("plain".to_string()));
    }
}
