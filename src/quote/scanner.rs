//! Backward history scan for the most recent message matching a quote.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::error::QuoteError;
use super::identity::HintMatcher;
use super::message::ChannelMessage;
use super::pattern::QuotePattern;
use super::platform::ChatPlatform;

/// Messages inspected per quote unless configured otherwise.
pub const DEFAULT_SCAN_WINDOW: usize = 100;

/// Largest history page the platform hands out per request.
const PAGE_LIMIT: usize = 100;

/// Outcome of a history scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Found(ChannelMessage),
    NotFound,
}

/// Compiled form of a [`QuotePattern`], built once per scan.
#[derive(Debug)]
pub struct QuoteMatcher {
    author: Option<HintMatcher>,
    content: Regex,
}

impl QuoteMatcher {
    pub fn new(pattern: &QuotePattern) -> Result<Self, regex::Error> {
        let author = pattern
            .author_hint
            .as_deref()
            .map(HintMatcher::new)
            .transpose()?;
        let content = RegexBuilder::new(&regex::escape(&pattern.content_fragment))
            .case_insensitive(true)
            .build()?;
        Ok(Self { author, content })
    }

    pub fn is_match(&self, candidate: &ChannelMessage) -> bool {
        if let Some(ref author) = self.author
            && !author.matches(&candidate.author)
        {
            return false;
        }
        self.content.is_match(&candidate.content)
    }
}

/// Walks channel history backwards from a trigger, bounded by a fixed window.
#[derive(Debug, Clone, Copy)]
pub struct HistoryScanner {
    window: usize,
}

impl Default for HistoryScanner {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_WINDOW)
    }
}

impl HistoryScanner {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Find the newest message older than `trigger` that satisfies `pattern`.
    ///
    /// At most `window` messages are inspected, fetched in pages. A match
    /// older than the window is reported as [`MatchResult::NotFound`].
    pub async fn find<P: ChatPlatform + ?Sized>(
        &self,
        platform: &P,
        trigger: &ChannelMessage,
        pattern: &QuotePattern,
    ) -> Result<MatchResult, QuoteError> {
        let matcher = QuoteMatcher::new(pattern)?;
        let mut remaining = self.window;
        let mut before = trigger.id;

        while remaining > 0 {
            let limit = remaining.min(PAGE_LIMIT);
            let page = platform
                .fetch_history(trigger.channel, before, limit as u8)
                .await
                .map_err(QuoteError::Fetch)?;
            let fetched = page.len();
            debug!(
                "Scanning {} message(s) before {} in channel {}",
                fetched, before, trigger.channel.id
            );

            let Some(oldest) = page.iter().take(limit).last().map(|m| m.id) else {
                break;
            };

            if let Some(found) = page.into_iter().take(limit).find(|m| matcher.is_match(m)) {
                return Ok(MatchResult::Found(found));
            }

            // A short page means the channel has no older messages
            if fetched < limit {
                break;
            }
            remaining -= limit;
            before = oldest;
        }

        Ok(MatchResult::NotFound)
    }
}
