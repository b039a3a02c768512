//! Error types for smplog operations.

use std::fmt;
use std::io;

/// Errors surfaced by logging calls and global initialization.
///
/// Logging itself never fails on its inputs (unknown levels, cyclic
/// payloads and error arguments are all absorbed). The variants here cover
/// the cases a caller has to see: a stream that refused the write, or a
/// process-wide hook that was already taken.
#[derive(Debug)]
pub enum Error {
    /// The output stream rejected the line.
    Io(io::Error),
    /// A `log` facade logger was already registered.
    SetLogger(log::SetLoggerError),
    /// A global `tracing` subscriber was already registered.
    SetSubscriber(tracing::subscriber::SetGlobalDefaultError),
    /// A `key=value` assignment could not be parsed.
    InvalidField(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "write failed: {err}"),
            Self::SetLogger(err) => write!(f, "cannot install log bridge: {err}"),
            Self::SetSubscriber(err) => write!(f, "cannot install tracing layer: {err}"),
            Self::InvalidField(raw) => write!(f, "invalid field assignment `{raw}`, expected key=value"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::SetLogger(err) => Some(err),
            Self::SetSubscriber(err) => Some(err),
            Self::InvalidField(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Self::SetLogger(err)
    }
}

impl From<tracing::subscriber::SetGlobalDefaultError> for Error {
    fn from(err: tracing::subscriber::SetGlobalDefaultError) -> Self {
        Self::SetSubscriber(err)
    }
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
