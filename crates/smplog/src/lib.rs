#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod args;
pub mod bridge;
pub mod config;
pub mod console;
pub mod formatter;
pub mod inspect;
pub mod level;
pub mod logger;
pub mod output;
pub mod printf;
pub mod record;
pub mod stringify;
pub mod subscriber;
pub mod testing;
pub mod value;

mod error;

pub use args::{Arg, Args};
pub use config::{EnvConfig, Interceptor, LoggerBuilder, Options};
pub use console::ConsolePort;
pub use error::{Error, Result};
pub use formatter::Formatter;
pub use level::{ParseSeverityError, Severity, Threshold};
pub use logger::{EventBuilder, Logger, Writer};
pub use output::{Output, StdOutput, Stream};
pub use record::Record;
pub use value::{Fault, Fields, Shared, Value};

/// Create a logger with `default_tags` and fully resolved `options`.
///
/// [`Logger::builder`] is the usual entry point; it also applies the
/// `SMPLOG_*` environment variables.
#[must_use]
pub fn create(default_tags: Fields, options: Options) -> Logger {
    Logger::new(default_tags, options)
}
