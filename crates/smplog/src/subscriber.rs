//! `tracing` integration.
//!
//! [`SmplogLayer`] forwards `tracing` events into a [`Logger`]: the event's
//! `message` becomes the record message, other fields become payload with
//! their types preserved, and the names of enclosing spans are joined under
//! `span`.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use crate::error::Result;
use crate::level::Severity;
use crate::logger::Logger;
use crate::value::{Fields, Value};

/// A tracing layer that logs events through a [`Logger`].
#[derive(Debug, Clone)]
pub struct SmplogLayer {
    logger: Logger,
}

impl SmplogLayer {
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

fn severity(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warn,
        Level::INFO => Severity::Info,
        _ => Severity::Debug,
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Fields,
}

impl FieldCollector {
    fn record_value(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            if self.message.is_none() {
                self.message = Some(match value {
                    Value::String(s) => s,
                    other => crate::inspect::inspect(&other),
                });
            }
        } else {
            self.fields.insert(field.name(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::Int(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::Float(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, Value::Fault(crate::value::Fault::from_error(value)));
    }
}

impl<S> Layer<S> for SmplogLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = severity(metadata.level());
        if !self.logger.enabled(severity) && !self.logger.options().has_interceptor() {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        if let Some(scope) = ctx.event_scope(event) {
            let spans: Vec<String> = scope.from_root().map(|span| span.name().to_string()).collect();
            if !spans.is_empty() {
                collector.fields.insert("span", spans.join("::"));
            }
        }

        let message = collector
            .message
            .unwrap_or_else(|| metadata.name().to_string());

        // Nowhere to report a failed write from inside the subscriber.
        let _ = self
            .logger
            .event(severity)
            .message(message)
            .fields(collector.fields)
            .emit();
    }
}

/// Install a registry with a [`SmplogLayer`] for `logger` as the global
/// tracing subscriber.
pub fn init(logger: Logger) -> Result<()> {
    let subscriber = tracing_subscriber::registry().with(SmplogLayer::new(logger));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
