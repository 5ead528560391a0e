//! Utility functions for Zero services.

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Counts characters, not bytes, so CJK field labels are never split.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// Collapse every run of whitespace (including newlines) into one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Single-line, length-bounded rendering of user text for log fields.
pub fn log_preview(s: &str, max_chars: usize) -> String {
    truncate_with_ellipsis(&collapse_whitespace(s), max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_with_ellipsis("RSI < 30", 20), "RSI < 30");
        assert_eq!(truncate_with_ellipsis("RSI < 30 AND MACD > 0", 8), "RSI < 30...");
    }

    #[test]
    fn test_truncate_cjk() {
        assert_eq!(truncate_with_ellipsis("市盈率PE < 30", 3), "市盈率...");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("市盈率PE < 30\nAND  净资产收益率ROE > 10"),
            "市盈率PE < 30 AND 净资产收益率ROE > 10"
        );
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_log_preview() {
        assert_eq!(log_preview("RSI < 30\nAND  MACD > 0", 12), "RSI < 30 AND...");
    }
}
