use std::borrow::Cow;

// ── Text clean-up for extracted listing fields ────────────────────────────────

/// Escape a title for HTML-mode messages: `&`, `<`, `>`, `"` and `'`.
pub fn escape_title(raw: &str) -> String {
    match html_escape::encode_quoted_attribute(raw) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

/// Parse a rating badge that holds only the number.
/// "4.6" → 4.6 | " 4.6 " → 4.6 | "4.6 stars" → None
pub fn parse_rating(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Parse a rating from the first token of a badge.
/// "4.8 (12,345 reviews)" → 4.8 | "New" → None
pub fn parse_leading_rating(s: &str) -> Option<f64> {
    s.split_whitespace().next().and_then(parse_rating)
}

/// `host[:port]`, lowercase: the platform label for pages without a dedicated extractor.
pub fn host_label(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_title() {
        assert_eq!(escape_title("Learn Python — 100% off"), "Learn Python — 100% off");
        let escaped = escape_title("C & <Rust>");
        assert!(escaped.contains("&amp;"));
        assert!(escaped.contains("&lt;Rust&gt;"));
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("4.6"), Some(4.6));
        assert_eq!(parse_rating(" 3.9 "), Some(3.9));
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_rating("4.6 stars"), None);
        assert_eq!(parse_leading_rating("4.8 (12,345 reviews)"), Some(4.8));
        assert_eq!(parse_leading_rating("New"), None);
        assert_eq!(parse_leading_rating(""), None);
    }

    #[test]
    fn test_host_label() {
        let u = url::Url::parse("https://Example.com/search?q=rust").unwrap();
        assert_eq!(host_label(&u), "example.com");
        let u = url::Url::parse("http://127.0.0.1:8080/x").unwrap();
        assert_eq!(host_label(&u), "127.0.0.1:8080");
    }
}
