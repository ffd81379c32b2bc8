//! Logger adapter that forwards events to `tracing`.

use crate::logger::redact_fields;
use solr_multisub_ports::{LogEvent, LogFields, LogLevel, LoggerPort};

/// Forwards events to the installed `tracing` subscriber.
///
/// Fields are redacted and rendered as one JSON object in the `fields`
/// attribute; the subscriber decides formatting and filtering.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    base_fields: LogFields,
}

impl TracingLogger {
    /// Create a logger without base fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields);
        redact_fields(&mut fields);

        let rendered = if fields.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&fields).unwrap_or_default()
        };
        let error = event
            .error
            .map(|error| error.to_string())
            .unwrap_or_default();
        let name = &*event.event;
        let message = &*event.message;

        match event.level {
            LogLevel::Debug => {
                tracing::debug!(target: "multisub", event = name, fields = %rendered, error = %error, "{message}");
            },
            LogLevel::Info => {
                tracing::info!(target: "multisub", event = name, fields = %rendered, error = %error, "{message}");
            },
            LogLevel::Warn => {
                tracing::warn!(target: "multisub", event = name, fields = %rendered, error = %error, "{message}");
            },
            LogLevel::Error => {
                tracing::error!(target: "multisub", event = name, fields = %rendered, error = %error, "{message}");
            },
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            base_fields: merged,
        })
    }
}
