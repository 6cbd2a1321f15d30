//! Quote pipeline - recognizes quote triggers and reposts the quoted message.

pub mod citation;
pub mod error;
pub mod identity;
pub mod message;
pub mod pattern;
pub mod platform;
pub mod responder;
pub mod scanner;

#[cfg(test)]
mod tests;

pub use citation::Citation;
pub use error::QuoteError;
pub use identity::{HintMatcher, MemberIdentity};
pub use message::{ChannelMessage, ChannelRef};
pub use pattern::QuotePattern;
pub use platform::{ChatPlatform, PlatformError};
pub use responder::{QuoteOutcome, QuoteResponder};
pub use scanner::{HistoryScanner, MatchResult, DEFAULT_SCAN_WINDOW};
