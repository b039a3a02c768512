//! Line rendering.
//!
//! A rendered line reads
//!
//! ```text
//! [<timestamp> ][<severity>]<pad> <message>[ smplog::<json>]
//!   <continuation line>
//! ```
//!
//! The severity tag is padded to the longest severity name plus its
//! brackets so messages line up. Continuation lines of a multi-line message
//! are indented by two spaces and follow the payload, keeping them apart
//! from it.

use chrono::{DateTime, SecondsFormat, Utc};
use console::Style;

use crate::config::Options;
use crate::level::Severity;
use crate::record::Record;
use crate::stringify::stringify;

/// Prefix that namespaces the payload on a line.
pub const META_PREFIX: &str = "smplog::";

/// Renders records into lines. Pure; writing happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatter {
    color: bool,
    meta: bool,
    timestamps: bool,
}

impl Formatter {
    #[must_use]
    pub fn new(color: bool, meta: bool, timestamps: bool) -> Self {
        Self {
            color,
            meta,
            timestamps,
        }
    }

    /// Formatter for a logger's options.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        Self::new(options.color, options.meta, options.timestamps)
    }

    /// Render `record`, stamping it with the current time if it carries none.
    #[must_use]
    pub fn format(&self, record: &Record) -> String {
        self.format_at(record, Utc::now())
    }

    /// Render `record`, using `now` when it carries no timestamp.
    #[must_use]
    pub fn format_at(&self, record: &Record, now: DateTime<Utc>) -> String {
        let mut tokens: Vec<String> = Vec::with_capacity(4);

        if self.timestamps {
            let at = record.timestamp.unwrap_or(now);
            let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
            tokens.push(self.paint(&Style::new().dim(), &stamp));
        }

        let width = Severity::max_name_len() + 2;
        let tag = format!("{:<width$}", format!("[{}]", record.severity));
        tokens.push(self.paint(&severity_style(record.severity), &tag));

        let mut lines = record.message.split('\n');
        tokens.push(lines.next().unwrap_or_default().to_string());
        let continuation: Vec<String> = lines.map(|l| format!("  {l}")).collect();

        if self.meta && !record.payload.is_empty() {
            let meta = format!("{META_PREFIX}{}", stringify(&record.payload));
            tokens.push(self.paint(&Style::new().dim(), &meta));
        }

        let mut line = tokens.join(" ");
        if !continuation.is_empty() {
            line.push('\n');
            line.push_str(&continuation.join("\n"));
        }
        line
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if self.color {
            style.clone().force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Debug => Style::new().dim().bold(),
        Severity::Info => Style::new().blue().bold(),
        Severity::Warn => Style::new().yellow().bold(),
        Severity::Error => Style::new().red().bold(),
    }
}
