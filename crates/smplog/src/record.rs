//! The message record passed from a logger to its writer.

use chrono::{DateTime, Utc};

use crate::level::Severity;
use crate::value::{Fields, Value};

/// One log message, assembled per call and consumed once by the writer.
///
/// `timestamp` is only set when the caller supplied one (for replaying
/// historical events); otherwise the formatter stamps the line with the
/// time it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: Option<DateTime<Utc>>,
    pub severity: Severity,
    pub message: String,
    pub payload: Fields,
}

impl Record {
    /// Record with an empty payload and no explicit timestamp.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            severity,
            message: message.into(),
            payload: Fields::new(),
        }
    }

    /// Replace the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Fields) -> Self {
        self.payload = payload;
        self
    }

    /// Set an explicit timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Interpret a payload value as a point in time: integers are milliseconds
/// since the Unix epoch, strings are RFC 3339.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Int(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
        Value::UInt(ms) => i64::try_from(*ms).ok().and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::Float(ms) if ms.is_finite() => DateTime::<Utc>::from_timestamp_millis(*ms as i64),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}
