//! tracing layer that mirrors this crate's log lines into a Discord channel.

use std::sync::Arc;
use std::time::Duration;

use serenity::all::{ChannelId, Http};
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Discord rejects messages longer than 2000 characters.
const MAX_LOG_CHARS: usize = 1900;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);
/// Pending INFO lines that force an early flush.
const MAX_PENDING_LINES: usize = 50;

enum LogLine {
    /// WARN/ERROR, posted on arrival.
    Urgent(String),
    /// INFO, held back and posted in packed messages.
    Info(String),
}

/// Forwards log events to a Discord channel.
pub struct DiscordLogLayer {
    tx: mpsc::UnboundedSender<LogLine>,
}

impl DiscordLogLayer {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(forward(http, channel_id, rx));
        Self { tx }
    }
}

async fn forward(http: Arc<Http>, channel_id: ChannelId, mut rx: mpsc::UnboundedReceiver<LogLine>) {
    let mut pending: Vec<String> = Vec::new();
    let mut interval = tokio::time::interval(FLUSH_INTERVAL);

    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(LogLine::Urgent(text)) => post(&http, channel_id, &clip(&text)).await,
                Some(LogLine::Info(text)) => {
                    pending.push(text);
                    if pending.len() >= MAX_PENDING_LINES {
                        flush(&http, channel_id, &mut pending).await;
                    }
                }
                None => {
                    flush(&http, channel_id, &mut pending).await;
                    break;
                }
            },
            _ = interval.tick() => flush(&http, channel_id, &mut pending).await,
        }
    }
}

async fn flush(http: &Arc<Http>, channel_id: ChannelId, pending: &mut Vec<String>) {
    for message in pack_lines(pending.drain(..)) {
        post(http, channel_id, &message).await;
    }
}

async fn post(http: &Arc<Http>, channel_id: ChannelId, text: &str) {
    // Never log from here: the event would loop back into this layer
    if let Err(e) = channel_id.say(http, text).await {
        eprintln!("Failed to send log to Discord: {e}");
    }
}

/// Cut a single line down to the message limit.
fn clip(text: &str) -> String {
    if text.chars().count() > MAX_LOG_CHARS {
        let clipped: String = text.chars().take(MAX_LOG_CHARS).collect();
        format!("{clipped}...")
    } else {
        text.to_string()
    }
}

/// Join lines into as few messages as fit the limit, keeping their order.
/// Only a line that alone exceeds the limit loses text.
fn pack_lines(lines: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in lines {
        let line = clip(&line);
        let line_chars = line.chars().count();
        if !current.is_empty() && current_chars + 1 + line_chars > MAX_LOG_CHARS {
            messages.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_chars += 1;
        }
        current.push_str(&line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else if self.message.is_empty() {
            self.message = format!("{} = {:?}", field.name(), value);
        } else {
            self.message
                .push_str(&format!(", {} = {:?}", field.name(), value));
        }
    }
}

impl<S: Subscriber> Layer<S> for DiscordLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = *metadata.level();
        if level > Level::INFO || !metadata.target().starts_with("parrot") {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let line = match level {
            Level::ERROR => LogLine::Urgent(format!("❌ {}", visitor.message)),
            Level::WARN => LogLine::Urgent(format!("⚠️ {}", visitor.message)),
            _ => LogLine::Info(visitor.message),
        };
        if self.tx.send(line).is_err() {
            eprintln!("Log channel closed, message dropped");
        }
    }
}
