//! Quote trigger grammar: `[author hint] > content`.

use std::sync::LazyLock;

use regex::Regex;

/// Whole-body grammar. `.` does not cross line breaks, so only single-line
/// segments qualify.
static QUOTE_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(?P<author>.*?)\s*>\s*(?P<content>.+)\z").expect("quote grammar must compile")
});

/// A parsed quote trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotePattern {
    /// Narrows the search to one member. Trimmed, never empty.
    pub author_hint: Option<String>,
    /// Text the quoted message must contain. Always has a non-whitespace char.
    pub content_fragment: String,
}

impl QuotePattern {
    /// Parse a message body. `None` means the body is not a quote.
    pub fn parse(body: &str) -> Option<Self> {
        let caps = QUOTE_GRAMMAR.captures(body)?;

        let content = caps.name("content")?.as_str();
        if content.trim().is_empty() {
            return None;
        }

        let author_hint = caps
            .name("author")
            .map(|m| m.as_str().trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Some(Self {
            author_hint,
            content_fragment: content.to_string(),
        })
    }
}

/// Routing predicate used before any history is touched.
pub fn is_quote(body: &str) -> bool {
    QuotePattern::parse(body).is_some()
}
