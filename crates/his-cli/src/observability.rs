//! Tracing setup for the `his` binary.
//!
//! Events go to stderr through the fmt layer and are also kept in a small
//! in-memory ring ([`RecentLogs`]) that `--log-summary` prints at exit. The
//! console level only filters stderr; the ring always keeps `info` and up.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Number of events kept by [`RecentLogs`].
pub const MAX_RECENT_LOGS: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Ring of the most recent events, newest first.
#[derive(Clone, Default)]
pub struct RecentLogs {
    entries: Arc<Mutex<VecDeque<LogRecord>>>,
}

impl RecentLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: LogRecord) {
        let mut entries = self.entries.lock();
        entries.push_front(record);
        entries.truncate(MAX_RECENT_LOGS);
    }

    pub fn entries(&self) -> Vec<LogRecord> {
        self.entries.lock().iter().cloned().collect()
    }
}

impl<S> Layer<S> for RecentLogs
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = LogVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        self.push(LogRecord {
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message: visitor.finish(),
        });
    }
}

/// Collects the message and renders other fields as `key=value`.
#[derive(Default)]
struct LogVisitor {
    message: String,
    fields: String,
}

impl LogVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl tracing::field::Visit for LogVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) -> RecentLogs {
    let recent = RecentLogs::new();
    let _ = subscriber(console_filter(level), recent.clone()).try_init();
    recent
}

fn console_filter(level: &str) -> EnvFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

fn subscriber(console_filter: EnvFilter, recent: RecentLogs) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(recent.with_filter(LevelFilter::INFO))
}
