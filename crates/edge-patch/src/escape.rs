//! Per-context escaping.

/// Where a substituted value lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    /// HTML text or attribute value.
    Html,
    /// JSON string inside a raw payload row stream (segment files, `.txt`).
    Flight,
    /// JSON string inside a row stream that is itself a script string
    /// literal (inline payload chunks).
    Payload,
}

impl Escaping {
    /// Escape a value for this context.
    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Html => escape_html(value),
            Self::Flight => json_string_inner(value),
            Self::Payload => script_literal_inner(&json_string_inner(value)),
        }
    }
}

/// Escape text for HTML content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Body of a JSON string literal for `s`, without the surrounding quotes.
pub fn json_string_inner(s: &str) -> String {
    let quoted = serde_json::Value::String(s.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Body of an inline-script string literal for `s`: JSON escaping plus the
/// characters that must not appear raw inside `<script>`.
pub fn script_literal_inner(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in json_string_inner(s).chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
    }

    #[test]
    fn test_payload_escaping_is_double() {
        // flight row needs \" ; the script literal around it needs \\\"
        assert_eq!(Escaping::Flight.apply(r#"a"b"#), r#"a\"b"#);
        assert_eq!(Escaping::Payload.apply(r#"a"b"#), r#"a\\\"b"#);
        assert_eq!(Escaping::Payload.apply("</script>"), r"\u003c/script\u003e");
    }

    #[test]
    fn test_plain_values_pass_through() {
        for ctx in [Escaping::Html, Escaping::Flight, Escaping::Payload] {
            assert_eq!(ctx.apply("widget-42"), "widget-42");
        }
    }
}
