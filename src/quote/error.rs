use std::fmt;

use super::platform::PlatformError;

/// Unexpected failures while resolving a quote. Not retried.
#[derive(Debug)]
pub enum QuoteError {
    /// The search text could not be compiled into a matcher.
    Pattern(regex::Error),
    /// Reading channel history failed.
    Fetch(PlatformError),
    /// Looking up the bot's send permission failed.
    Permission(PlatformError),
    /// Posting the citation failed.
    Send(PlatformError),
    /// Deleting the trigger failed for a reason other than missing rights.
    Delete(PlatformError),
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(e) => write!(f, "failed to compile quote matcher: {}", e),
            Self::Fetch(e) => write!(f, "failed to fetch history: {}", e),
            Self::Permission(e) => write!(f, "failed to check send permission: {}", e),
            Self::Send(e) => write!(f, "failed to post citation: {}", e),
            Self::Delete(e) => write!(f, "failed to delete trigger: {}", e),
        }
    }
}

impl std::error::Error for QuoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern(e) => Some(e),
            Self::Fetch(e) | Self::Permission(e) | Self::Send(e) | Self::Delete(e) => Some(e),
        }
    }
}

impl From<regex::Error> for QuoteError {
    fn from(e: regex::Error) -> Self {
        Self::Pattern(e)
    }
}
