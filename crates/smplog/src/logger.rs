//! Logger instances.
//!
//! A [`Logger`] is a cheap handle: clones share the same default tags and
//! options. [`Logger::with_tags`] is the way to get an independent logger
//! with extra tags.
//!
//! # Example
//!
//! ```
//! use smplog::{Logger, fields};
//! use smplog::testing::CaptureOutput;
//!
//! let out = CaptureOutput::new();
//! let log = Logger::builder()
//!     .env(smplog::EnvConfig::default())
//!     .tags(fields! { "env" => "prod" })
//!     .color(false)
//!     .output(out.clone())
//!     .build();
//!
//! log.error(("boom", fields! { "code" => 500 })).unwrap();
//! assert_eq!(out.stderr(), vec![r#"[error] boom smplog::{"env":"prod","code":500}"#]);
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::args::Args;
use crate::config::{LoggerBuilder, Options};
use crate::console::ConsolePort;
use crate::error::Result;
use crate::formatter::Formatter;
use crate::level::{Severity, Threshold};
use crate::output::{Stream, should_emit};
use crate::record::{Record, timestamp_from_value};
use crate::value::{Fault, Fields, Value};

/// A configured logger.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    tags: RwLock<Fields>,
    options: Arc<Options>,
}

impl Logger {
    /// Logger with `tags` as defaults and resolved `options`.
    #[must_use]
    pub fn new(tags: Fields, options: Options) -> Self {
        Self::from_parts(tags, Arc::new(options))
    }

    fn from_parts(tags: Fields, options: Arc<Options>) -> Self {
        Self {
            inner: Arc::new(Inner {
                tags: RwLock::new(tags),
                options,
            }),
        }
    }

    /// Start configuring a logger.
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// The logger's options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Configured threshold.
    #[must_use]
    pub fn threshold(&self) -> Threshold {
        self.inner.options.threshold
    }

    /// Whether a message at `severity` would be written.
    #[must_use]
    pub fn enabled(&self, severity: Severity) -> bool {
        should_emit(severity, self.threshold())
    }

    /// Snapshot of the default tags.
    #[must_use]
    pub fn tags(&self) -> Fields {
        self.inner
            .tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merge `patch` into this logger's default tags and return the result.
    ///
    /// Every clone of this logger sees the change; loggers previously
    /// derived with [`with_tags`](Self::with_tags) do not.
    pub fn tag(&self, patch: Fields) -> Fields {
        let mut tags = self
            .inner
            .tags
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        tags.merge(patch);
        tags.clone()
    }

    /// New logger with the same options and these tags merged over a copy
    /// of the current ones.
    #[must_use]
    pub fn with_tags(&self, patch: Fields) -> Logger {
        Self::from_parts(self.tags().merged(patch), Arc::clone(&self.inner.options))
    }

    /// Whether two handles are the same logger.
    #[must_use]
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ─────────────────────────────────────────────────
    // Severity methods
    // ─────────────────────────────────────────────────

    /// Log at `severity`.
    pub fn emit(&self, severity: Severity, args: impl Into<Args>) -> Result<()> {
        let (message, payload) = args.into().normalize(severity);
        let timestamp = self.timestamp_from(&payload);
        self.dispatch(Record {
            timestamp,
            severity,
            message,
            payload,
        })
    }

    pub fn debug(&self, args: impl Into<Args>) -> Result<()> {
        self.emit(Severity::Debug, args)
    }

    pub fn info(&self, args: impl Into<Args>) -> Result<()> {
        self.emit(Severity::Info, args)
    }

    pub fn warn(&self, args: impl Into<Args>) -> Result<()> {
        self.emit(Severity::Warn, args)
    }

    pub fn error(&self, args: impl Into<Args>) -> Result<()> {
        self.emit(Severity::Error, args)
    }

    /// Alias for [`info`](Self::info).
    pub fn log(&self, args: impl Into<Args>) -> Result<()> {
        self.info(args)
    }

    /// Build a record field by field.
    #[must_use]
    pub fn event(&self, severity: Severity) -> EventBuilder<'_> {
        EventBuilder {
            logger: self,
            severity,
            message: String::new(),
            payload: Fields::new(),
            timestamp: None,
        }
    }

    /// Merge default tags into `record` and hand it to the interceptor or
    /// the writer.
    pub fn dispatch(&self, record: Record) -> Result<()> {
        let record = Record {
            payload: self.tags().merged(record.payload),
            ..record
        };
        let writer = Writer {
            options: Arc::clone(&self.inner.options),
        };
        match &self.inner.options.interceptor {
            Some(interceptor) => interceptor(record, writer),
            None => writer.write(record),
        }
    }

    fn timestamp_from(&self, payload: &Fields) -> Option<DateTime<Utc>> {
        let key = self.inner.options.timekey.as_deref()?;
        payload.get(key).and_then(timestamp_from_value)
    }

    // ─────────────────────────────────────────────────
    // Console installation
    // ─────────────────────────────────────────────────

    /// Route the global console through this logger.
    pub fn install(&self) -> &Self {
        self.install_on(ConsolePort::global())
    }

    /// Route `port` through this logger.
    pub fn install_on(&self, port: &ConsolePort) -> &Self {
        port.install(self);
        self
    }

    /// Pop the most recently installed logger from the global console.
    pub fn uninstall(&self) -> &Self {
        self.uninstall_from(ConsolePort::global())
    }

    /// Pop the most recently installed logger from `port`.
    pub fn uninstall_from(&self, port: &ConsolePort) -> &Self {
        port.uninstall();
        self
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("tags", &self.tags())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl fmt::Debug for Writer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("threshold", &self.options.threshold)
            .finish_non_exhaustive()
    }
}

/// Threshold check, rendering and output for one logger.
///
/// A writer is an owned handle on the logger's options, so an interceptor
/// may keep it and write later, from another thread if need be.
#[derive(Clone)]
pub struct Writer {
    options: Arc<Options>,
}

impl Writer {
    /// Write `record` if it passes the threshold.
    pub fn write(&self, record: Record) -> Result<()> {
        if !should_emit(record.severity, self.options.threshold) {
            return Ok(());
        }
        let line = Formatter::from_options(&self.options).format(&record);
        self.options
            .output
            .write_line(Stream::for_severity(record.severity), &line)?;
        Ok(())
    }
}

/// Structured alternative to argument lists.
///
/// ```
/// use smplog::{Logger, Severity};
///
/// let log = Logger::builder().threshold(smplog::Threshold::Off).build();
/// log.event(Severity::Warn)
///     .message("disk almost full")
///     .field("free_mb", 120)
///     .emit()
///     .unwrap();
/// ```
#[must_use = "an event does nothing until emitted"]
pub struct EventBuilder<'a> {
    logger: &'a Logger,
    severity: Severity,
    message: String,
    payload: Fields,
    timestamp: Option<DateTime<Utc>>,
}

impl EventBuilder<'_> {
    /// Message text, used as-is (no placeholder processing).
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add one payload field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key, value);
        self
    }

    /// Merge payload fields.
    pub fn fields(mut self, fields: Fields) -> Self {
        self.payload.merge(fields);
        self
    }

    /// Attach an error under `error` (`warning` for warnings) unless that
    /// key is already set.
    pub fn fault(mut self, fault: Fault) -> Self {
        let key = match self.severity {
            Severity::Warn => "warning",
            _ => "error",
        };
        self.payload.insert_if_absent(key, fault);
        self
    }

    /// Explicit timestamp. Takes precedence over the logger's timekey.
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Hand the record to the logger.
    pub fn emit(self) -> Result<()> {
        let timestamp = self
            .timestamp
            .or_else(|| self.logger.timestamp_from(&self.payload));
        self.logger.dispatch(Record {
            timestamp,
            severity: self.severity,
            message: self.message,
            payload: self.payload,
        })
    }
}
