//! Level filtering and stream dispatch.

use std::io::{self, Write};
use std::sync::Arc;

use crate::level::{Severity, Threshold};

/// Whether a message at `severity` passes `threshold`.
#[must_use]
pub fn should_emit(severity: Severity, threshold: Threshold) -> bool {
    threshold.allows(severity)
}

/// Destination stream for a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Primary output, reserved for informational lines.
    Stdout,
    /// Everything else.
    Stderr,
}

impl Stream {
    /// `info` goes to stdout, every other severity to stderr.
    #[must_use]
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Info => Self::Stdout,
            _ => Self::Stderr,
        }
    }
}

/// Sink for rendered lines.
///
/// Each call is one synchronous write of `line` followed by a newline.
/// Errors are returned to the logging call site.
pub trait Output: Send + Sync {
    fn write_line(&self, stream: Stream, line: &str) -> io::Result<()>;
}

impl<T: Output + ?Sized> Output for Arc<T> {
    fn write_line(&self, stream: Stream, line: &str) -> io::Result<()> {
        (**self).write_line(stream, line)
    }
}

/// The process's standard streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdOutput;

impl Output for StdOutput {
    fn write_line(&self, stream: Stream, line: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        match stream {
            Stream::Stdout => io::stdout().lock().write_all(buf.as_bytes()),
            Stream::Stderr => io::stderr().lock().write_all(buf.as_bytes()),
        }
    }
}
