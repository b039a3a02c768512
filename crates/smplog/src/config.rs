//! Logger configuration.
//!
//! [`LoggerBuilder`] layers three sources, highest priority first:
//! explicit builder settings, the `SMPLOG_*` environment snapshot in
//! [`EnvConfig`], and built-in defaults. The result is an immutable
//! [`Options`] shared by a logger and everything derived from it.
//!
//! `SMPLOG_COLORS=false` and `SMPLOG_META=false` are kill switches: an
//! explicit `true` cannot turn colors or payloads back on. An empty level
//! from either source counts as unset.

use std::env;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::level::Threshold;
use crate::logger::{Logger, Writer};
use crate::output::{Output, StdOutput};
use crate::record::Record;
use crate::value::{Fields, Value};

/// Custom log interceptor.
///
/// Receives every record (before the threshold check) together with the
/// writer that would have handled it. The interceptor may transform,
/// duplicate, defer or drop the record by choosing how to call
/// [`Writer::write`].
pub type Interceptor = Arc<dyn Fn(Record, Writer) -> Result<()> + Send + Sync>;

/// Resolved, immutable logger options.
#[derive(Clone)]
pub struct Options {
    /// Minimum severity written.
    pub threshold: Threshold,
    /// Decorate lines with ANSI styles.
    pub color: bool,
    /// Append the payload as JSON.
    pub meta: bool,
    /// Prefix lines with an ISO-8601 timestamp.
    pub timestamps: bool,
    /// Payload key read as the record timestamp.
    pub timekey: Option<String>,
    pub(crate) interceptor: Option<Interceptor>,
    pub(crate) output: Arc<dyn Output>,
}

impl Options {
    /// Options resolved from the process environment alone.
    #[must_use]
    pub fn from_env() -> Self {
        LoggerBuilder::new().resolve()
    }

    /// Whether an interceptor is configured.
    #[must_use]
    pub fn has_interceptor(&self) -> bool {
        self.interceptor.is_some()
    }

    /// The configured output sink.
    #[must_use]
    pub fn output(&self) -> &Arc<dyn Output> {
        &self.output
    }
}

impl Default for Options {
    /// Built-in defaults, ignoring the environment.
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            color: true,
            meta: true,
            timestamps: false,
            timekey: None,
            interceptor: None,
            output: Arc::new(StdOutput),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("threshold", &self.threshold)
            .field("color", &self.color)
            .field("meta", &self.meta)
            .field("timestamps", &self.timestamps)
            .field("timekey", &self.timekey)
            .field("interceptor", &self.interceptor.is_some())
            .finish_non_exhaustive()
    }
}

/// Snapshot of the `SMPLOG_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// `SMPLOG_LEVEL`
    pub level: Option<String>,
    /// `SMPLOG_COLORS`
    pub colors: Option<String>,
    /// `SMPLOG_META`
    pub meta: Option<String>,
    /// `SMPLOG_TIMESTAMPS`
    pub timestamps: Option<String>,
}

impl EnvConfig {
    pub const LEVEL: &'static str = "SMPLOG_LEVEL";
    pub const COLORS: &'static str = "SMPLOG_COLORS";
    pub const META: &'static str = "SMPLOG_META";
    pub const TIMESTAMPS: &'static str = "SMPLOG_TIMESTAMPS";

    /// Read the process environment.
    ///
    /// | Variable | Values | Effect |
    /// |----------|--------|--------|
    /// | `SMPLOG_LEVEL` | debug/info/warn/error/none | default threshold |
    /// | `SMPLOG_COLORS` | false | disable colors |
    /// | `SMPLOG_META` | false | hide payloads |
    /// | `SMPLOG_TIMESTAMPS` | any but empty/0/false | enable timestamps |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            level: lookup(Self::LEVEL),
            colors: lookup(Self::COLORS),
            meta: lookup(Self::META),
            timestamps: lookup(Self::TIMESTAMPS),
        }
    }

    /// Colors stay on unless `SMPLOG_COLORS=false`.
    #[must_use]
    pub fn colors_enabled(&self) -> bool {
        !is_false(self.colors.as_deref())
    }

    /// Payloads stay on unless `SMPLOG_META=false`.
    #[must_use]
    pub fn meta_enabled(&self) -> bool {
        !is_false(self.meta.as_deref())
    }

    /// Timestamps are on for any value other than empty, `0` or `false`.
    #[must_use]
    pub fn timestamps_enabled(&self) -> bool {
        match self.timestamps.as_deref().map(str::trim) {
            None | Some("" | "0") => false,
            Some(v) => !v.eq_ignore_ascii_case("false"),
        }
    }
}

fn is_false(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("false"))
}

/// Builder for a [`Logger`].
///
/// # Example
///
/// ```
/// use smplog::{Logger, fields};
///
/// let log = Logger::builder()
///     .tags(fields! { "service" => "billing" })
///     .level("warn")
///     .color(false)
///     .build();
/// assert_eq!(log.threshold().to_string(), "warn");
/// ```
#[derive(Default)]
pub struct LoggerBuilder {
    tags: Fields,
    level: Option<String>,
    color: Option<bool>,
    meta: Option<bool>,
    timestamps: Option<bool>,
    timekey: Option<String>,
    interceptor: Option<Interceptor>,
    output: Option<Arc<dyn Output>>,
    env: Option<EnvConfig>,
}

impl LoggerBuilder {
    /// Builder with nothing set; unset options come from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default tags attached to every message.
    #[must_use]
    pub fn tags(mut self, tags: Fields) -> Self {
        self.tags.merge(tags);
        self
    }

    /// Add a single default tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Threshold by name (`debug`, `info`, `warn`, `error` or `none`).
    #[must_use]
    pub fn level(mut self, name: impl Into<String>) -> Self {
        self.level = Some(name.into());
        self
    }

    /// Threshold by value.
    #[must_use]
    pub fn threshold(self, threshold: impl Into<Threshold>) -> Self {
        self.level(threshold.into().to_string())
    }

    /// Enable or disable colors. `SMPLOG_COLORS=false` still wins over `true`.
    #[must_use]
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = Some(enabled);
        self
    }

    /// Enable or disable payload rendering. `SMPLOG_META=false` still wins
    /// over `true`.
    #[must_use]
    pub fn meta(mut self, enabled: bool) -> Self {
        self.meta = Some(enabled);
        self
    }

    /// Enable or disable timestamps.
    #[must_use]
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = Some(enabled);
        self
    }

    /// Payload key holding an explicit timestamp.
    #[must_use]
    pub fn timekey(mut self, key: impl Into<String>) -> Self {
        self.timekey = Some(key.into());
        self
    }

    /// Route every record through `interceptor`.
    #[must_use]
    pub fn interceptor<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(Record, Writer) -> Result<()> + Send + Sync + 'static,
    {
        self.interceptor = Some(Arc::new(interceptor));
        self
    }

    /// Write to `output` instead of the standard streams.
    #[must_use]
    pub fn output(mut self, output: impl Output + 'static) -> Self {
        self.output = Some(Arc::new(output));
        self
    }

    /// Use an explicit environment snapshot instead of reading the process
    /// environment.
    #[must_use]
    pub fn env(mut self, env: EnvConfig) -> Self {
        self.env = Some(env);
        self
    }

    fn resolve(self) -> Options {
        self.split().1
    }

    fn split(self) -> (Fields, Options) {
        let env = self.env.unwrap_or_else(EnvConfig::from_env);
        let explicit_level = self.level.as_deref().filter(|s| !s.trim().is_empty());
        let env_level = env.level.as_deref().filter(|s| !s.trim().is_empty());
        let threshold = Threshold::resolve(explicit_level.or(env_level), Threshold::default());
        let options = Options {
            threshold,
            color: self.color.unwrap_or(true) && env.colors_enabled(),
            meta: self.meta.unwrap_or(true) && env.meta_enabled(),
            timestamps: self.timestamps.unwrap_or_else(|| env.timestamps_enabled()),
            timekey: self.timekey,
            interceptor: self.interceptor,
            output: self.output.unwrap_or_else(|| Arc::new(StdOutput)),
        };
        (self.tags, options)
    }

    /// Resolve options and build the logger.
    #[must_use]
    pub fn build(self) -> Logger {
        let (tags, options) = self.split();
        Logger::new(tags, options)
    }
}
