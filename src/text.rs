//! Text normalization utilities.
//!
//! Feed content arrives as HTML fragments of wildly varying quality.
//! Everything user-visible goes through here: tag stripping, entity
//! decoding, whitespace cleanup, and byte-budget truncation at a word
//! boundary.

/// Ellipsis appended to truncated text. Three bytes in UTF-8.
const ELLIPSIS: &str = "…";

/// Strip HTML tags from text and decode common entities.
///
/// Whitespace runs (including newlines introduced by block elements)
/// are collapsed to single spaces and the result is trimmed.
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '&' if !in_tag => {
                in_entity = true;
                entity.clear();
            }
            ';' if in_entity => {
                in_entity = false;
                match entity.as_str() {
                    "amp" => result.push('&'),
                    "lt" => result.push('<'),
                    "gt" => result.push('>'),
                    "quot" => result.push('"'),
                    "apos" => result.push('\''),
                    "nbsp" => result.push(' '),
                    _ if entity.starts_with('#') => {
                        if let Some(code) = parse_numeric_entity(&entity) {
                            if let Some(c) = char::from_u32(code) {
                                result.push(c);
                            }
                        }
                    }
                    _ => {
                        // Unknown entity, keep as-is
                        result.push('&');
                        result.push_str(&entity);
                        result.push(';');
                    }
                }
            }
            _ if in_entity => {
                entity.push(ch);
            }
            _ if !in_tag => {
                result.push(ch);
            }
            _ => {}
        }
    }

    let result: String = result.split_whitespace().collect::<Vec<&str>>().join(" ");

    result.trim().to_string()
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    if entity.starts_with("#x") || entity.starts_with("#X") {
        u32::from_str_radix(&entity[2..], 16).ok()
    } else if entity.starts_with('#') {
        entity[1..].parse().ok()
    } else {
        None
    }
}

/// Truncate text to a byte budget without splitting a UTF-8 character
/// or, when the text contains whitespace, a word.
///
/// The appended ellipsis counts against the budget, so the returned
/// string is always within `max_bytes`. Text already within budget is
/// returned unchanged, with no ellipsis.
pub fn truncate_at_word_boundary(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    if max_bytes < ELLIPSIS.len() {
        return String::new();
    }

    let budget = max_bytes - ELLIPSIS.len();
    let mut cut = budget;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &text[..cut];

    // Back up to the last whitespace so no word is cut mid-way. A
    // single unbroken token longer than the budget is hard-cut at the
    // character boundary instead.
    let truncated = match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => head[..pos].trim_end(),
        _ => head,
    };

    let mut result = String::with_capacity(truncated.len() + ELLIPSIS.len());
    result.push_str(truncated);
    result.push_str(ELLIPSIS);
    result
}

/// Strip HTML and truncate in one pass. Used by the feed item
/// extractor for descriptions.
pub fn normalize_summary(html: &str, max_bytes: usize) -> String {
    truncate_at_word_boundary(&strip_html(html), max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_basic() {
        assert_eq!(strip_html("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html("<b>Bold</b> text"), "Bold text");
        assert_eq!(strip_html("<div><p>Nested</p></div>"), "Nested");
    }

    #[test]
    fn test_strip_html_entities() {
        assert_eq!(strip_html("&amp;"), "&");
        assert_eq!(strip_html("&lt;tag&gt;"), "<tag>");
        assert_eq!(strip_html("&quot;quoted&quot;"), "\"quoted\"");
        assert_eq!(strip_html("it&apos;s"), "it's");
        assert_eq!(strip_html("A&nbsp;B"), "A B");
    }

    #[test]
    fn test_strip_html_numeric_entities() {
        assert_eq!(strip_html("&#65;"), "A");
        assert_eq!(strip_html("&#39;"), "'");
        assert_eq!(strip_html("&#x41;"), "A");
        assert_eq!(strip_html("&#x3042;"), "あ");
    }

    #[test]
    fn test_strip_html_unknown_entity_kept() {
        assert_eq!(strip_html("&copy;"), "&copy;");
    }

    #[test]
    fn test_strip_html_whitespace() {
        assert_eq!(
            strip_html("<p>  Multiple   spaces  </p>"),
            "Multiple spaces"
        );
        assert_eq!(
            strip_html("<p>\n\tNewlines\n\tand\ttabs\n</p>"),
            "Newlines and tabs"
        );
    }

    #[test]
    fn test_parse_numeric_entity() {
        assert_eq!(parse_numeric_entity("#65"), Some(65));
        assert_eq!(parse_numeric_entity("#x41"), Some(65));
        assert_eq!(parse_numeric_entity("#X41"), Some(65));
        assert_eq!(parse_numeric_entity("#x3042"), Some(12354));
        assert_eq!(parse_numeric_entity("invalid"), None);
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_at_word_boundary("Short text", 100), "Short text");
        let exact = "a".repeat(64);
        assert_eq!(truncate_at_word_boundary(&exact, 64), exact);
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        let text = "one two three four five";
        let result = truncate_at_word_boundary(text, 12);
        // 12 - 3 (ellipsis) = 9 bytes of text, cut back to "one two"
        assert_eq!(result, "one two…");
        assert!(result.len() <= 12);
    }

    #[test]
    fn test_truncate_never_splits_utf8() {
        let text = "日本語のテキストです".repeat(10);
        for budget in 4..40 {
            let result = truncate_at_word_boundary(&text, budget);
            assert!(result.len() <= budget, "budget {} exceeded", budget);
            // Would panic on a broken boundary
            let _ = result.chars().count();
        }
    }

    #[test]
    fn test_truncate_single_long_token_hard_cut() {
        let text = "a".repeat(100);
        let result = truncate_at_word_boundary(&text, 20);
        assert_eq!(result, format!("{}…", "a".repeat(17)));
        assert!(result.len() <= 20);
    }

    #[test]
    fn test_truncate_tiny_budget() {
        assert_eq!(truncate_at_word_boundary("hello world", 2), "");
        assert_eq!(truncate_at_word_boundary("hello world", 3), "…");
    }

    #[test]
    fn test_normalize_summary() {
        let html = "<p>The <b>quick</b> brown fox jumps over the lazy dog</p>";
        assert_eq!(
            normalize_summary(html, 1000),
            "The quick brown fox jumps over the lazy dog"
        );
        let short = normalize_summary(html, 20);
        assert!(short.len() <= 20);
        assert!(short.ends_with('…'));
    }
}
