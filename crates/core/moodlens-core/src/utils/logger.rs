//! Logging setup
//!
//! [`init_logging`] installs a stderr formatter and republishes every event
//! as a [`LogEvent`] on an in-process broadcast channel, so a host UI can
//! show pipeline activity for one session without parsing text output.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Environment variable consulted when `RUST_LOG` is not set
pub const LOG_LEVEL_ENV: &str = "MOODLENS_LOG_LEVEL";

/// Events buffered per subscriber before the oldest are dropped
const LOG_CHANNEL_CAPACITY: usize = 1024;

/// A tracing event republished for in-process subscribers
#[derive(Clone, Debug, Serialize)]
pub struct LogEvent {
    /// Level name
    pub level: String,
    /// Event target (module path)
    pub target: String,
    /// Rendered message
    pub message: String,
    /// Structured fields other than the message, rendered as text
    pub fields: BTreeMap<String, String>,
    /// RFC 3339 timestamp
    pub time: String,
}

impl LogEvent {
    /// Value of a structured field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Session the event belongs to, when it carries a `session` field
    pub fn session(&self) -> Option<&str> {
        self.field("session")
    }
}

static LOG_TX: OnceCell<broadcast::Sender<LogEvent>> = OnceCell::new();

/// Subscribe to republished log events, if logging was initialized
pub fn subscribe_logs() -> Option<broadcast::Receiver<LogEvent>> {
    LOG_TX.get().map(|tx| tx.subscribe())
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.insert(field.name().to_string(), rendered);
        }
    }
}

struct BroadcastLayer {
    tx: broadcast::Sender<LogEvent>,
}

impl<S> Layer<S> for BroadcastLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let meta = event.metadata();
        let _ = self.tx.send(LogEvent {
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message: collector.message,
            fields: collector.fields,
            time: chrono::Utc::now().to_rfc3339(),
        });
    }
}

/// Initialize the global logging system
///
/// The filter comes from `RUST_LOG`, else `MOODLENS_LOG_LEVEL`, else `info`.
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_logging() {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    let tx = LOG_TX
        .get_or_init(|| broadcast::channel(LOG_CHANNEL_CAPACITY).0)
        .clone();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(BroadcastLayer { tx })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
        assert!(subscribe_logs().is_some());
    }

    #[test]
    fn test_events_carry_structured_fields() {
        init_logging();
        let mut rx = subscribe_logs().unwrap();
        tracing::warn!(session = "a1b2", modality = "voice", "Slot cleared for test");

        let event = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|e| e.message == "Slot cleared for test")
            .unwrap();
        assert_eq!(event.level, "WARN");
        assert_eq!(event.session(), Some("a1b2"));
        assert_eq!(event.field("modality"), Some("voice"));
        assert_eq!(event.field("missing"), None);
    }
}
