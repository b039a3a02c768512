//! Output capture for tests.
//!
//! [`CaptureOutput`] is an [`Output`] that records every written line with
//! the stream it went to. Lines are kept both raw and with ANSI escapes
//! stripped, so colored output can be asserted on as plain text.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use strip_ansi_escapes::strip;

use crate::output::{Output, Stream};

/// One captured write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub stream: Stream,
    /// Line as written, escapes included.
    pub raw: String,
    /// Line with ANSI escapes stripped.
    pub text: String,
}

/// An output that captures lines for assertion instead of writing them.
///
/// Clones share the same buffer, so a clone can be handed to a logger while
/// the original is used to inspect what was written.
#[derive(Clone, Default)]
pub struct CaptureOutput {
    buffer: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<Captured>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every captured write, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<Captured> {
        self.buffer().clone()
    }

    /// Stripped text of every write, in order, across both streams.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.buffer().iter().map(|c| c.text.clone()).collect()
    }

    /// Stripped text written to stdout.
    #[must_use]
    pub fn stdout(&self) -> Vec<String> {
        self.stream(Stream::Stdout)
    }

    /// Stripped text written to stderr.
    #[must_use]
    pub fn stderr(&self) -> Vec<String> {
        self.stream(Stream::Stderr)
    }

    fn stream(&self, stream: Stream) -> Vec<String> {
        self.buffer()
            .iter()
            .filter(|c| c.stream == stream)
            .map(|c| c.text.clone())
            .collect()
    }

    /// Raw writes, escapes preserved.
    #[must_use]
    pub fn raw_output(&self) -> Vec<String> {
        self.buffer().iter().map(|c| c.raw.clone()).collect()
    }

    /// All stripped text joined by newlines.
    #[must_use]
    pub fn output_string(&self) -> String {
        self.lines().join("\n")
    }

    /// Check if output contains a string (case-insensitive)
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.output_string()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }

    /// Check if output matches a regex pattern. Invalid patterns never match.
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        match regex::Regex::new(pattern) {
            Ok(re) => re.is_match(&self.output_string()),
            Err(_) => false,
        }
    }

    /// # Panics
    ///
    /// Panics if the output does not contain `needle`.
    pub fn assert_contains(&self, needle: &str) {
        assert!(
            self.contains(needle),
            "Output did not contain '{}'. Actual output:\n{}",
            needle,
            self.output_string()
        );
    }

    /// # Panics
    ///
    /// Panics if the output contains `needle`.
    pub fn assert_not_contains(&self, needle: &str) {
        assert!(
            !self.contains(needle),
            "Output unexpectedly contained '{}'. Actual output:\n{}",
            needle,
            self.output_string()
        );
    }

    /// # Panics
    ///
    /// Panics unless exactly `expected` writes were captured.
    pub fn assert_line_count(&self, expected: usize) {
        let actual = self.buffer().len();
        assert_eq!(
            actual,
            expected,
            "Expected {} lines but got {}. Actual output:\n{}",
            expected,
            actual,
            self.output_string()
        );
    }

    pub fn clear(&self) {
        self.buffer().clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }
}

impl Output for CaptureOutput {
    fn write_line(&self, stream: Stream, line: &str) -> io::Result<()> {
        let text = String::from_utf8_lossy(&strip(line.as_bytes())).into_owned();
        self.buffer().push(Captured {
            stream,
            raw: line.to_string(),
            text,
        });
        Ok(())
    }
}

impl std::fmt::Debug for CaptureOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureOutput")
            .field("line_count", &self.buffer().len())
            .finish()
    }
}

/// An output whose every write fails with a broken pipe.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingOutput;

impl Output for FailingOutput {
    fn write_line(&self, _stream: Stream, _line: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"))
    }
}
