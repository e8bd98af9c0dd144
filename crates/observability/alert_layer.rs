use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use super::alert_sink::{AlertEvent, AlertSink};

const SENSITIVE_FIELD_MARKERS: &[&str] = &[
    "token",
    "secret",
    "api_key",
    "password",
    "authorization",
    "webhook",
];

/// Forwards events at or above `min_level` to the alert sink.
pub(crate) struct AlertLayer {
    sink: AlertSink,
    min_level: Level,
}

impl AlertLayer {
    pub(crate) fn new(sink: AlertSink, min_level: Level) -> Self {
        Self { sink, min_level }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields
                .insert(field.name().to_string(), redact(field.name(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, value.to_string());
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // `Level` orders by verbosity: ERROR is the smallest.
        if *metadata.level() > self.min_level {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let spans = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| s.metadata().name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        self.sink.enqueue(AlertEvent {
            level: *metadata.level(),
            timestamp: Utc::now(),
            target: metadata.target().to_string(),
            location: metadata
                .file()
                .zip(metadata.line())
                .map(|(file, line)| format!("{}:{}", file, line)),
            message: collector.message,
            fields: collector.fields,
            spans,
        });
    }
}

fn redact(field_name: &str, value: String) -> String {
    let name = field_name.to_ascii_lowercase();
    if SENSITIVE_FIELD_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
    {
        "[REDACTED]".to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_looking_fields_are_redacted() {
        assert_eq!(redact("mail_provider_api_key", "live_abc".to_string()), "[REDACTED]");
        assert_eq!(redact("Authorization", "Basic xyz".to_string()), "[REDACTED]");
        assert_eq!(redact("scheduler_token", "t".to_string()), "[REDACTED]");
        assert_eq!(redact("seed_id", "42".to_string()), "42");
    }
}
