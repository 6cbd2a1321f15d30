//! Tests for the quote pipeline against an in-memory platform.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::*;

// =============================================================================
// IN-MEMORY PLATFORM
// =============================================================================

#[derive(Default)]
struct FakePlatform {
    history: Vec<ChannelMessage>,
    may_send: bool,
    fetch_error: Option<PlatformError>,
    send_error: Option<PlatformError>,
    delete_error: Option<PlatformError>,
    fetches: Mutex<Vec<(u64, u8)>>,
    sent: Mutex<Vec<Citation>>,
    deleted: Mutex<Vec<u64>>,
}

impl FakePlatform {
    fn with_history(history: Vec<ChannelMessage>) -> Self {
        Self {
            history,
            may_send: true,
            ..Default::default()
        }
    }

    fn fetches(&self) -> Vec<(u64, u8)> {
        self.fetches.lock().unwrap().clone()
    }

    fn sent(&self) -> Vec<Citation> {
        self.sent.lock().unwrap().clone()
    }

    fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn fetch_history(
        &self,
        _channel: ChannelRef,
        before: u64,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, PlatformError> {
        self.fetches.lock().unwrap().push((before, limit));
        if let Some(ref e) = self.fetch_error {
            return Err(e.clone());
        }
        let mut older: Vec<ChannelMessage> =
            self.history.iter().filter(|m| m.id < before).cloned().collect();
        older.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        older.truncate(limit as usize);
        Ok(older)
    }

    async fn can_send(&self, _channel: ChannelRef) -> Result<bool, PlatformError> {
        Ok(self.may_send)
    }

    async fn send_citation(&self, _channel: ChannelRef, citation: &Citation) -> Result<(), PlatformError> {
        if let Some(ref e) = self.send_error {
            return Err(e.clone());
        }
        self.sent.lock().unwrap().push(citation.clone());
        Ok(())
    }

    async fn delete_message(&self, _channel: ChannelRef, message_id: u64) -> Result<(), PlatformError> {
        if let Some(ref e) = self.delete_error {
            return Err(e.clone());
        }
        self.deleted.lock().unwrap().push(message_id);
        Ok(())
    }
}

const CHANNEL: ChannelRef = ChannelRef {
    id: 555,
    guild_id: Some(777),
};

fn member(id: u64, display_name: &str) -> MemberIdentity {
    MemberIdentity {
        id,
        name: display_name.to_lowercase(),
        discriminator: None,
        display_name: display_name.to_string(),
        avatar_url: format!("https://cdn.example/{id}.png"),
    }
}

fn sent_at(id: u64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(id as i64)
}

/// Message ids double as timestamps so ordering is easy to read.
fn msg(id: u64, author: &MemberIdentity, content: &str) -> ChannelMessage {
    ChannelMessage {
        id,
        channel: CHANNEL,
        author: author.clone(),
        content: content.to_string(),
        timestamp: sent_at(id),
        edited_timestamp: None,
    }
}

fn filler(range: std::ops::RangeInclusive<u64>) -> Vec<ChannelMessage> {
    let carol = member(3, "Carol");
    range.map(|id| msg(id, &carol, &format!("small talk {id}"))).collect()
}

fn pattern(body: &str) -> QuotePattern {
    QuotePattern::parse(body).expect("test body must be a quote")
}

// =============================================================================
// HISTORY SCANNER TESTS
// =============================================================================

mod scanner {
    use super::*;

    #[tokio::test]
    async fn test_most_recent_match_wins() {
        let alice = member(1, "Alice");
        let platform = FakePlatform::with_history(vec![
            msg(10, &alice, "lunch at noon"),
            msg(20, &alice, "LUNCH at one"),
            msg(30, &alice, "unrelated"),
        ]);
        let trigger = msg(40, &member(2, "Bob"), "> lunch");

        let result = HistoryScanner::default()
            .find(&platform, &trigger, &pattern("> lunch"))
            .await
            .unwrap();
        match result {
            MatchResult::Found(m) => assert_eq!(m.id, 20),
            MatchResult::NotFound => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn test_only_older_messages_considered() {
        let alice = member(1, "Alice");
        let platform = FakePlatform::with_history(vec![
            msg(10, &alice, "deploy friday"),
            msg(50, &alice, "deploy friday again"),
        ]);
        let trigger = msg(40, &alice, "> deploy");

        let result = HistoryScanner::default()
            .find(&platform, &trigger, &pattern("> deploy"))
            .await
            .unwrap();
        assert_eq!(result, MatchResult::Found(msg(10, &alice, "deploy friday")));
    }

    #[tokio::test]
    async fn test_author_filter_skips_newer_other_author() {
        let alice = member(1, "Alice");
        let bob = member(2, "Bob");
        let platform = FakePlatform::with_history(vec![
            msg(10, &alice, "going fishing"),
            msg(20, &bob, "going fishing too"),
        ]);
        let trigger = msg(30, &member(3, "Carol"), "alice > fishing");

        let result = HistoryScanner::default()
            .find(&platform, &trigger, &pattern("alice > fishing"))
            .await
            .unwrap();
        assert_eq!(result, MatchResult::Found(msg(10, &alice, "going fishing")));
    }

    #[tokio::test]
    async fn test_content_is_literal_substring() {
        let alice = member(1, "Alice");
        let platform = FakePlatform::with_history(vec![msg(10, &alice, "version axb released")]);
        let trigger = msg(20, &alice, "> a.b");

        let result = HistoryScanner::default()
            .find(&platform, &trigger, &pattern("> a.b"))
            .await
            .unwrap();
        assert_eq!(result, MatchResult::NotFound);
    }

    #[tokio::test]
    async fn test_substring_inside_word_matches() {
        let alice = member(1, "Alice");
        let platform = FakePlatform::with_history(vec![msg(10, &alice, "the cathedral")]);
        let trigger = msg(20, &alice, "> cat");

        let result = HistoryScanner::default()
            .find(&platform, &trigger, &pattern("> cat"))
            .await
            .unwrap();
        assert!(matches!(result, MatchResult::Found(m) if m.id == 10));
    }

    #[tokio::test]
    async fn test_window_cutoff() {
        let alice = member(1, "Alice");
        let mut history = filler(1..=10);
        // Position 4 counting back from the trigger
        history[6] = msg(7, &alice, "needle");
        let platform = FakePlatform::with_history(history);
        let trigger = msg(11, &alice, "> needle");

        let result = HistoryScanner::new(3)
            .find(&platform, &trigger, &pattern("> needle"))
            .await
            .unwrap();
        assert_eq!(result, MatchResult::NotFound);

        let result = HistoryScanner::new(4)
            .find(&platform, &trigger, &pattern("> needle"))
            .await
            .unwrap();
        assert!(matches!(result, MatchResult::Found(m) if m.id == 7));
    }

    #[tokio::test]
    async fn test_pages_past_first_hundred() {
        let alice = member(1, "Alice");
        let mut history = filler(1..=300);
        history[120] = msg(121, &alice, "needle");
        let platform = FakePlatform::with_history(history);
        let trigger = msg(301, &alice, "> needle");

        let result = HistoryScanner::new(250)
            .find(&platform, &trigger, &pattern("> needle"))
            .await
            .unwrap();
        assert!(matches!(result, MatchResult::Found(m) if m.id == 121));
        assert_eq!(platform.fetches(), vec![(301, 100), (201, 100)]);
    }

    #[tokio::test]
    async fn test_last_page_trimmed_to_window() {
        let alice = member(1, "Alice");
        let mut history = filler(1..=300);
        // Position 160 counting back, beyond a window of 150
        history[140] = msg(141, &alice, "needle");
        let platform = FakePlatform::with_history(history);
        let trigger = msg(301, &alice, "> needle");

        let result = HistoryScanner::new(150)
            .find(&platform, &trigger, &pattern("> needle"))
            .await
            .unwrap();
        assert_eq!(result, MatchResult::NotFound);
        assert_eq!(platform.fetches(), vec![(301, 100), (201, 50)]);
    }

    #[tokio::test]
    async fn test_short_page_ends_scan() {
        let alice = member(1, "Alice");
        let platform = FakePlatform::with_history(filler(1..=30));
        let trigger = msg(31, &alice, "> needle");

        let result = HistoryScanner::new(500)
            .find(&platform, &trigger, &pattern("> needle"))
            .await
            .unwrap();
        assert_eq!(result, MatchResult::NotFound);
        assert_eq!(platform.fetches().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_window_fetches_nothing() {
        let alice = member(1, "Alice");
        let platform = FakePlatform::with_history(vec![msg(1, &alice, "needle")]);
        let trigger = msg(2, &alice, "> needle");

        let result = HistoryScanner::new(0)
            .find(&platform, &trigger, &pattern("> needle"))
            .await
            .unwrap();
        assert_eq!(result, MatchResult::NotFound);
        assert!(platform.fetches().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let alice = member(1, "Alice");
        let platform = FakePlatform {
            fetch_error: Some(PlatformError::Other("gateway timeout".to_string())),
            ..FakePlatform::with_history(vec![])
        };
        let trigger = msg(2, &alice, "> needle");

        let err = HistoryScanner::default()
            .find(&platform, &trigger, &pattern("> needle"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::Fetch(_)));
    }
}

// =============================================================================
// RESPONDER SCENARIOS
// =============================================================================

mod responder {
    use super::*;

    #[tokio::test]
    async fn test_quote_posted_and_trigger_deleted() {
        let alice = member(1, "Alice");
        let bob = member(2, "Bob");
        let platform = FakePlatform::with_history(vec![
            msg(10, &alice, "going fishing this weekend"),
            msg(11, &bob, "nice"),
        ]);
        let trigger = msg(12, &bob, "Alice > going fishing");

        let outcome = QuoteResponder::default().respond(&platform, &trigger).await.unwrap();
        assert_eq!(outcome, QuoteOutcome::Posted { trigger_deleted: true });

        let sent = platform.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].author_name, "Alice");
        assert_eq!(sent[0].description, "going fishing this weekend");
        assert_eq!(sent[0].footer_text, "Quoted by Bob.");
        assert_eq!(sent[0].footer_icon_url, bob.avatar_url);
        assert_eq!(sent[0].timestamp, sent_at(10));
        assert_eq!(platform.deleted(), vec![12]);
    }

    #[tokio::test]
    async fn test_not_a_quote_does_nothing() {
        let alice = member(1, "Alice");
        let platform = FakePlatform::with_history(vec![msg(10, &alice, "going fishing")]);
        let trigger = msg(11, &alice, "going fishing");

        let outcome = QuoteResponder::default().respond(&platform, &trigger).await.unwrap();
        assert_eq!(outcome, QuoteOutcome::NotAQuote);
        assert!(platform.fetches().is_empty());
        assert!(platform.sent().is_empty());
        assert!(platform.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_no_match_does_nothing() {
        let alice = member(1, "Alice");
        let bob = member(2, "Bob");
        let platform = FakePlatform::with_history(vec![
            msg(10, &alice, "the secret plan"),
            msg(11, &bob, "no plans here"),
        ]);
        let trigger = msg(12, &alice, "Bob > secret plan");

        let outcome = QuoteResponder::default().respond(&platform, &trigger).await.unwrap();
        assert_eq!(outcome, QuoteOutcome::NoMatch);
        assert!(platform.sent().is_empty());
        assert!(platform.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_send_forbidden_does_nothing() {
        let alice = member(1, "Alice");
        let platform = FakePlatform {
            may_send: false,
            ..FakePlatform::with_history(vec![msg(10, &alice, "going fishing")])
        };
        let trigger = msg(11, &member(2, "Bob"), "> fishing");

        let outcome = QuoteResponder::default().respond(&platform, &trigger).await.unwrap();
        assert_eq!(outcome, QuoteOutcome::SendForbidden);
        assert!(platform.sent().is_empty());
        assert!(platform.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_delete_forbidden_keeps_citation() {
        let alice = member(1, "Alice");
        let platform = FakePlatform {
            delete_error: Some(PlatformError::PermissionDenied("Missing Permissions".to_string())),
            ..FakePlatform::with_history(vec![msg(10, &alice, "going fishing")])
        };
        let trigger = msg(11, &member(2, "Bob"), "> fishing");

        let outcome = QuoteResponder::default().respond(&platform, &trigger).await.unwrap();
        assert_eq!(outcome, QuoteOutcome::Posted { trigger_deleted: false });
        assert_eq!(platform.sent().len(), 1);
        assert!(platform.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_delete_error_surfaces_after_post() {
        let alice = member(1, "Alice");
        let platform = FakePlatform {
            delete_error: Some(PlatformError::Other("Unknown Message".to_string())),
            ..FakePlatform::with_history(vec![msg(10, &alice, "going fishing")])
        };
        let trigger = msg(11, &member(2, "Bob"), "> fishing");

        let err = QuoteResponder::default().respond(&platform, &trigger).await.unwrap_err();
        assert!(matches!(err, QuoteError::Delete(PlatformError::Other(_))));
        // The citation stays posted
        assert_eq!(platform.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_send_error_skips_delete() {
        let alice = member(1, "Alice");
        let platform = FakePlatform {
            send_error: Some(PlatformError::Other("rate limited".to_string())),
            ..FakePlatform::with_history(vec![msg(10, &alice, "going fishing")])
        };
        let trigger = msg(11, &member(2, "Bob"), "> fishing");

        let err = QuoteResponder::default().respond(&platform, &trigger).await.unwrap_err();
        assert!(matches!(err, QuoteError::Send(_)));
        assert!(platform.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_edited_quote_is_annotated() {
        let alice = member(1, "Alice");
        let mut edited = msg(10, &alice, "going fishing");
        edited.edited_timestamp = Some(sent_at(15));
        let platform = FakePlatform::with_history(vec![edited]);
        let trigger = msg(20, &member(2, "Bob"), "> fishing");

        QuoteResponder::default().respond(&platform, &trigger).await.unwrap();
        assert_eq!(platform.sent()[0].footer_text, "Quoted by Bob. Edited.");
    }

    #[tokio::test]
    async fn test_configured_window_is_used() {
        let alice = member(1, "Alice");
        let mut history = filler(1..=10);
        history[0] = msg(1, &alice, "needle");
        let platform = FakePlatform::with_history(history);
        let trigger = msg(11, &alice, "> needle");

        let responder = QuoteResponder::new(5);
        assert_eq!(responder.scan_window(), 5);
        let outcome = responder.respond(&platform, &trigger).await.unwrap();
        assert_eq!(outcome, QuoteOutcome::NoMatch);
        assert_eq!(platform.fetches(), vec![(11, 5)]);
    }
}
