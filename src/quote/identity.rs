//! Matching an author hint against a channel member.

use regex::{Regex, RegexBuilder};

/// Read-only view of a message author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberIdentity {
    pub id: u64,
    /// Base account name.
    pub name: String,
    /// Legacy four-digit tag. Accounts on the new username system have none.
    pub discriminator: Option<String>,
    /// Per-community nickname, falling back to the global name.
    pub display_name: String,
    pub avatar_url: String,
}

impl MemberIdentity {
    /// `name#discriminator`, or just `name` when there is no discriminator.
    pub fn full_name(&self) -> String {
        match &self.discriminator {
            Some(d) => format!("{}#{}", self.name, d),
            None => self.name.clone(),
        }
    }
}

/// A compiled author hint.
///
/// The hint is escaped before compilation, so it only ever matches literally.
#[derive(Debug, Clone)]
pub struct HintMatcher {
    hint: String,
    pattern: Regex,
}

impl HintMatcher {
    pub fn new(hint: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(&regex::escape(hint))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            hint: hint.to_string(),
            pattern,
        })
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    /// True if the hint is a prefix of the id, or occurs in the full name
    /// or display name (case-insensitive).
    pub fn matches(&self, identity: &MemberIdentity) -> bool {
        identity.id.to_string().starts_with(&self.hint)
            || self.pattern.is_match(&identity.full_name())
            || self.pattern.is_match(&identity.display_name)
    }
}

/// One-shot form of [`HintMatcher::matches`].
pub fn matches(identity: &MemberIdentity, hint: &str) -> bool {
    HintMatcher::new(hint)
        .map(|m| m.matches(identity))
        .unwrap_or(false)
}
