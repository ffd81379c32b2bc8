//! Structured logging boundary contract.
//!
//! Use cases report state transitions as named events with typed fields.
//! Adapters decide whether events become JSON lines or `tracing` records.

use std::collections::BTreeMap;
use std::fmt;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

impl LogLevel {
    /// Lower-case level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Additional event fields.
pub type LogFields = BTreeMap<Box<str>, serde_json::Value>;

/// Build a field map from `(name, value)` pairs.
pub fn log_fields<I, K, V>(pairs: I) -> LogFields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Box<str>>,
    V: Into<serde_json::Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Stable event name, e.g. `resolve.detect.miss`.
    pub event: Box<str>,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message (safe, redacted).
    pub message: Box<str>,
    /// Structured fields; empty when none.
    pub fields: LogFields,
    /// Optional error payload.
    pub error: Option<serde_json::Value>,
}

impl LogEvent {
    /// Create an event without fields.
    pub fn new(level: LogLevel, event: impl Into<Box<str>>, message: impl Into<Box<str>>) -> Self {
        Self {
            event: event.into(),
            level,
            message: message.into(),
            fields: LogFields::new(),
            error: None,
        }
    }

    /// Attach one field.
    #[must_use]
    pub fn with_field(
        mut self,
        key: impl Into<Box<str>>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach many fields.
    #[must_use]
    pub fn with_fields(mut self, fields: LogFields) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Attach an error payload.
    #[must_use]
    pub fn with_error(mut self, error: serde_json::Value) -> Self {
        self.error = Some(error);
        self
    }
}

/// Boundary contract for structured logging.
pub trait LoggerPort: Send + Sync {
    /// Emit a structured event.
    fn log(&self, event: LogEvent);

    /// Create a child logger with base fields applied to every event.
    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort>;

    /// Convenience: debug event.
    fn debug(&self, event: &str, message: &str, fields: LogFields) {
        self.log(LogEvent::new(LogLevel::Debug, event, message).with_fields(fields));
    }

    /// Convenience: info event.
    fn info(&self, event: &str, message: &str, fields: LogFields) {
        self.log(LogEvent::new(LogLevel::Info, event, message).with_fields(fields));
    }

    /// Convenience: warn event.
    fn warn(&self, event: &str, message: &str, fields: LogFields) {
        self.log(LogEvent::new(LogLevel::Warn, event, message).with_fields(fields));
    }

    /// Convenience: error event.
    fn error(&self, event: &str, message: &str, fields: LogFields) {
        self.log(LogEvent::new(LogLevel::Error, event, message).with_fields(fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Vec<LogEvent>>>);

    impl LoggerPort for Recorder {
        fn log(&self, event: LogEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event);
            }
        }

        fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn convenience_methods_set_level_and_fields() {
        let recorder = Recorder::default();
        recorder.warn(
            "resolve.detect.miss",
            "no core matched",
            log_fields([("environment", "prod")]),
        );

        let events = recorder.0.lock().map(|events| events.clone()).unwrap_or_default();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, LogLevel::Warn);
        assert_eq!(&*events[0].event, "resolve.detect.miss");
        assert_eq!(
            events[0].fields.get("environment"),
            Some(&serde_json::Value::from("prod"))
        );
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Warn);
        assert_eq!(LogLevel::Error.to_string(), "error");
    }
}
