//! Caption cleanup.
//!
//! Account captions usually wrap the headline in guillemets (`« … »`) or
//! typographic quotes, with a channel prefix in front. Meta descriptions look
//! like `Vidéo TikTok de X : "…"`. Only the quoted part is kept.

use once_cell::sync::Lazy;
use regex::Regex;

static GUILLEMETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)«\s*(.*?)\s*»").unwrap());
static CURLY_QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)“\s*(.*?)\s*”").unwrap());
static QUOTED_AFTER_COLON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s):\s*(?:"(.*?)"|'(.*?)')\s*$"#).unwrap());

/// Extract the quoted part of a caption.
///
/// Lookup order, first match wins:
/// 1. text between `«` and `»`
/// 2. text between `“` and `”`
/// 3. a straight-quoted segment closing the text after a colon (`…: "X"`)
/// 4. the whole text
///
/// HTML entities are decoded first and the result is always trimmed. Empty
/// input gives an empty string.
pub fn extract_quoted(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let decoded = html_escape::decode_html_entities(text);

    for pattern in [&*GUILLEMETS, &*CURLY_QUOTES] {
        if let Some(inner) = pattern.captures(&decoded).and_then(|c| c.get(1)) {
            return inner.as_str().trim().to_string();
        }
    }
    if let Some(caps) = QUOTED_AFTER_COLON.captures(&decoded) {
        if let Some(inner) = caps.get(1).or_else(|| caps.get(2)) {
            return inner.as_str().trim().to_string();
        }
    }
    decoded.trim().to_string()
}
