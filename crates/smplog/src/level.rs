//! Severity levels and the filtering threshold.
//!
//! Severities are totally ordered by verbosity: `debug < info < warn <
//! error`. A [`Threshold`] is either one of them or [`Threshold::Off`],
//! which sits one rank past the last severity so nothing passes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Log severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Expected informational output.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl Severity {
    /// Every severity in rank order.
    pub const ALL: [Severity; 4] = [Self::Debug, Self::Info, Self::Warn, Self::Error];

    /// Position in [`Severity::ALL`]. Lower is more verbose.
    #[must_use]
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Lowercase name as rendered in output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Length of the longest severity name.
    #[must_use]
    pub fn max_name_len() -> usize {
        Self::ALL.iter().map(|s| s.as_str().len()).max().unwrap_or(0)
    }

    fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Severity::from_str`] for names outside the level table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSeverityError {
    name: String,
}

impl fmt::Display for ParseSeverityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown severity `{}` (expected debug, info, warn or error)",
            self.name
        )
    }
}

impl std::error::Error for ParseSeverityError {}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| ParseSeverityError {
            name: s.to_string(),
        })
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug | log::Level::Trace => Self::Debug,
        }
    }
}

/// Minimum severity that passes the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Threshold {
    /// Emit this severity and everything above it.
    Level(Severity),
    /// Emit nothing. Parsed from the name `none`.
    Off,
}

impl Threshold {
    /// Rank on the same scale as [`Severity::rank`]; `Off` is one past the
    /// last severity.
    #[must_use]
    pub fn rank(self) -> usize {
        match self {
            Self::Level(severity) => severity.rank(),
            Self::Off => Severity::ALL.len(),
        }
    }

    /// Resolve an optional level name.
    ///
    /// `None` yields `fallback` and `"none"` yields [`Threshold::Off`].
    /// Names outside the level table resolve to the most verbose severity
    /// so a typo never hides output; a warning is emitted on the `smplog`
    /// log target.
    #[must_use]
    pub fn resolve(name: Option<&str>, fallback: Threshold) -> Threshold {
        let Some(name) = name else {
            return fallback;
        };
        if name.trim().eq_ignore_ascii_case("none") {
            return Self::Off;
        }
        match Severity::lookup(name) {
            Some(severity) => Self::Level(severity),
            None => {
                log::warn!(
                    target: "smplog",
                    "unknown log level {name:?}, falling back to {}",
                    Severity::Debug
                );
                Self::Level(Severity::Debug)
            }
        }
    }

    /// Whether a message at `severity` passes this threshold.
    #[must_use]
    pub fn allows(self, severity: Severity) -> bool {
        severity.rank() >= self.rank()
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::Level(Severity::Info)
    }
}

impl From<Severity> for Threshold {
    fn from(severity: Severity) -> Self {
        Self::Level(severity)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(severity) => f.write_str(severity.as_str()),
            Self::Off => f.write_str("none"),
        }
    }
}
