//! Scoped capture of `tracing` events for assertions.
//!
//! Capture is installed as the thread's default subscriber for the duration
//! of one closure, so parallel tests never see each other's events. Events
//! emitted on other threads (rayon workers included) are not captured.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;

/// A captured event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Events recorded by [`capture_logs`].
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CapturedLogs {
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    #[must_use]
    pub fn at_level(&self, level: Level) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<LogEntry> {
        self.at_level(Level::WARN)
    }

    #[must_use]
    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|entry| entry.level == level && entry.message.contains(message))
    }
}

impl fmt::Display for CapturedLogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        if entries.is_empty() {
            return writeln!(f, "(no events captured)");
        }
        for entry in entries.iter() {
            write!(f, "[{}] {}: {}", entry.level, entry.target, entry.message)?;
            for (key, value) in &entry.fields {
                write!(f, " {key}={value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

struct CaptureLayer {
    logs: CapturedLogs,
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl EventVisitor {
    fn record(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        self.logs.entries.lock().push(LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Run `f` with every event at `TRACE` and above recorded.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer { logs: logs.clone() });
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, logs)
}

/// Assert a captured event at `$level` whose message contains `$message`.
#[macro_export]
macro_rules! assert_logged {
    ($logs:expr, $level:expr, $message:expr) => {{
        let logs = &$logs;
        assert!(
            logs.contains($level, $message),
            "expected {} event containing '{}'\ncaptured:\n{}",
            $level,
            $message,
            logs
        );
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_message_and_fields() {
        let ((), logs) = capture_logs(|| {
            tracing::warn!(doc_id = "d7", count = 3, "feedback document not found");
            tracing::debug!("detail");
        });
        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "feedback document not found");
        assert_eq!(warnings[0].field("doc_id"), Some("d7"));
        assert_eq!(warnings[0].field("count"), Some("3"));
        assert_eq!(logs.entries().len(), 2);
        crate::assert_logged!(logs, Level::DEBUG, "detail");
    }

    #[test]
    fn capture_is_scoped_to_the_closure() {
        let ((), logs) = capture_logs(|| {});
        tracing::warn!("outside");
        assert!(logs.entries().is_empty());
        assert!(logs.to_string().contains("no events"));
    }
}
