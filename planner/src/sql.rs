//! Small helpers shared by the expression generators.

/// Returns `true` if `name` can be used unquoted as a column alias.
///
/// Accepts ASCII letters, digits and underscores, not starting with a digit.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Renders `value` as a single-quoted string literal.
pub fn quote_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("page_location"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("ga_session_id2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("page-location"));
        assert!(!is_valid_identifier("page location"));
    }

    #[test]
    fn test_quote_literal_escapes_quotes_and_backslashes() {
        assert_eq!(quote_literal("page_title"), "'page_title'");
        assert_eq!(quote_literal("it's"), r"'it\'s'");
        assert_eq!(quote_literal(r"a\b"), r"'a\\b'");
    }
}
