//! Quote responder - resolves a trigger, posts the citation, removes the trigger.

use tracing::{debug, info};

use super::citation::Citation;
use super::error::QuoteError;
use super::message::ChannelMessage;
use super::pattern::QuotePattern;
use super::platform::{ChatPlatform, PlatformError};
use super::scanner::{HistoryScanner, MatchResult};

/// What happened to a trigger. Only used for logging by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteOutcome {
    NotAQuote,
    NoMatch,
    SendForbidden,
    Posted { trigger_deleted: bool },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteResponder {
    scanner: HistoryScanner,
}

impl QuoteResponder {
    pub fn new(scan_window: usize) -> Self {
        Self {
            scanner: HistoryScanner::new(scan_window),
        }
    }

    pub fn scan_window(&self) -> usize {
        self.scanner.window()
    }

    /// Handle a message that may be a quote trigger.
    pub async fn respond<P: ChatPlatform + ?Sized>(
        &self,
        platform: &P,
        trigger: &ChannelMessage,
    ) -> Result<QuoteOutcome, QuoteError> {
        match QuotePattern::parse(&trigger.content) {
            Some(pattern) => self.respond_to(platform, trigger, &pattern).await,
            None => Ok(QuoteOutcome::NotAQuote),
        }
    }

    /// Same as [`respond`](Self::respond) with the trigger already parsed.
    ///
    /// The citation is posted before the trigger is deleted. A failed
    /// deletion never undoes the post.
    pub async fn respond_to<P: ChatPlatform + ?Sized>(
        &self,
        platform: &P,
        trigger: &ChannelMessage,
        pattern: &QuotePattern,
    ) -> Result<QuoteOutcome, QuoteError> {
        let quoted = match self.scanner.find(platform, trigger, pattern).await? {
            MatchResult::Found(message) => message,
            MatchResult::NotFound => {
                debug!(
                    "No match for {:?} within {} message(s) in channel {}",
                    pattern.content_fragment,
                    self.scanner.window(),
                    trigger.channel.id
                );
                return Ok(QuoteOutcome::NoMatch);
            }
        };

        let may_send = platform
            .can_send(trigger.channel)
            .await
            .map_err(QuoteError::Permission)?;
        if !may_send {
            debug!("No send permission in channel {}", trigger.channel.id);
            return Ok(QuoteOutcome::SendForbidden);
        }

        let citation = Citation::build(&quoted, &trigger.author);
        platform
            .send_citation(trigger.channel, &citation)
            .await
            .map_err(QuoteError::Send)?;
        info!(
            "💬 {} quoted message {} by {} in channel {}",
            trigger.author.display_name, quoted.id, quoted.author.display_name, trigger.channel.id
        );

        let trigger_deleted = match platform.delete_message(trigger.channel, trigger.id).await {
            Ok(()) => true,
            Err(PlatformError::PermissionDenied(reason)) => {
                debug!("Keeping trigger {}: {}", trigger.id, reason);
                false
            }
            Err(e) => return Err(QuoteError::Delete(e)),
        };

        Ok(QuoteOutcome::Posted { trigger_deleted })
    }
}
