//! Parameter placeholder tokens.
//!
//! A token is `PREFIX + name + SUFFIX`. The delimiters use `%`, which never
//! appears in a parameter name, so no token is a substring of another.
//! Tokens are assumed not to occur in genuine page content; this is not
//! verified.

use crate::route::is_valid_param_name;

/// Opening delimiter of a placeholder token.
pub const PLACEHOLDER_PREFIX: &str = "%%ISR_PARAM:";

/// Closing delimiter of a placeholder token.
pub const PLACEHOLDER_SUFFIX: &str = "%%";

/// Placeholder token for a parameter name.
pub fn placeholder(name: &str) -> String {
    format!("{}{}{}", PLACEHOLDER_PREFIX, name, PLACEHOLDER_SUFFIX)
}

/// A placeholder token located in a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSpan<'a> {
    /// Byte offset of the token start.
    pub start: usize,
    /// Byte offset one past the token end.
    pub end: usize,
    /// Parameter name inside the token.
    pub name: &'a str,
}

/// Find the next well-formed placeholder token at or after `from`.
pub fn find_placeholder(text: &str, from: usize) -> Option<PlaceholderSpan<'_>> {
    let mut cursor = from;
    while let Some(rel) = text.get(cursor..)?.find(PLACEHOLDER_PREFIX) {
        let start = cursor + rel;
        let name_start = start + PLACEHOLDER_PREFIX.len();
        let name_len = text[name_start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(text.len() - name_start);
        let name = &text[name_start..name_start + name_len];
        let after = name_start + name_len;

        if is_valid_param_name(name) && text[after..].starts_with(PLACEHOLDER_SUFFIX) {
            return Some(PlaceholderSpan {
                start,
                end: after + PLACEHOLDER_SUFFIX.len(),
                name,
            });
        }
        cursor = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_format() {
        assert_eq!(placeholder("id"), "%%ISR_PARAM:id%%");
    }

    #[test]
    fn test_no_token_contains_another() {
        let a = placeholder("a");
        let b = placeholder("a__");
        assert!(!b.contains(&a));
        assert!(!a.contains(&b));
    }

    #[test]
    fn test_find_placeholder() {
        let text = format!("x{}y{}", placeholder("id"), placeholder("lang"));
        let first = find_placeholder(&text, 0).unwrap();
        assert_eq!(first.name, "id");
        assert_eq!(&text[first.start..first.end], placeholder("id"));
        let second = find_placeholder(&text, first.end).unwrap();
        assert_eq!(second.name, "lang");
        assert!(find_placeholder(&text, second.end).is_none());
    }

    #[test]
    fn test_find_skips_malformed_tokens() {
        let text = format!("%%ISR_PARAM:bad name%% {}", placeholder("ok"));
        assert_eq!(find_placeholder(&text, 0).unwrap().name, "ok");
        assert!(find_placeholder("%%ISR_PARAM:unterminated", 0).is_none());
    }
}
