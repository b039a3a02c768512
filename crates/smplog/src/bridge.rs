//! `log` facade integration.
//!
//! [`ConsoleBridge`] implements [`log::Log`] by calling the matching method
//! on a [`ConsolePort`]. With the bridge installed, `log::warn!` and friends
//! follow the console: they reach whichever [`Logger`](crate::Logger) is
//! installed, or the plain console when none is.
//!
//! ```ignore
//! smplog::bridge::init()?;
//! smplog::Logger::builder().tag("svc", "api").build().install();
//! log::info!("listening on {}", 8080);
//! ```

use log::{LevelFilter, Log, Metadata, Record};

use crate::args::{Arg, Args};
use crate::console::{ConsolePort, Method};
use crate::error::Result;
use crate::level::Severity;
use crate::value::{Fields, Value};

/// A `log` backend that writes through a console port.
#[derive(Debug)]
pub struct ConsoleBridge {
    port: &'static ConsolePort,
    with_target: bool,
}

impl ConsoleBridge {
    /// Bridge onto the global console.
    #[must_use]
    pub fn new() -> Self {
        Self::with_port(ConsolePort::global())
    }

    /// Bridge onto `port`.
    #[must_use]
    pub fn with_port(port: &'static ConsolePort) -> Self {
        Self {
            port,
            with_target: false,
        }
    }

    /// Attach the record's target to the payload under `target`.
    #[must_use]
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    // The rendered text is passed as a value rather than as text so that
    // `%` in it is never read as a conversion.
    fn args(&self, record: &Record<'_>) -> Args {
        let message = Arg::Value(Value::String(record.args().to_string()));
        let args = Args::from(message);
        if self.with_target {
            args.arg(Fields::new().with("target", record.target()))
        } else {
            args
        }
    }
}

impl Default for ConsoleBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for ConsoleBridge {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        // Filtering is the installed logger's job.
        true
    }

    fn log(&self, record: &Record<'_>) {
        let method = Method::from(Severity::from(record.level()));
        // Nowhere to report a failed write from inside the facade.
        let _ = self.port.call(method, self.args(record));
    }

    fn flush(&self) {}
}

/// Install a bridge onto the global console as the `log` backend.
///
/// Returns an error if a `log` backend has already been set.
pub fn init() -> Result<()> {
    init_with(ConsoleBridge::new())
}

/// Install `bridge` as the `log` backend.
pub fn init_with(bridge: ConsoleBridge) -> Result<()> {
    log::set_boxed_logger(Box::new(bridge))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

/// Like [`init`], ignoring a backend that is already set.
pub fn try_init() {
    let _ = init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use crate::console::Bindings;
    use crate::logger::Logger;
    use crate::testing::CaptureOutput;

    fn leaked_port() -> (&'static ConsolePort, CaptureOutput) {
        let plain = CaptureOutput::new();
        let port = Box::leak(Box::new(ConsolePort::new(Bindings::plain(plain.clone()))));
        (port, plain)
    }

    fn record<'a>(level: log::Level, args: std::fmt::Arguments<'a>) -> Record<'a> {
        Record::builder().level(level).target("app::db").args(args).build()
    }

    #[test]
    fn forwards_to_plain_console() {
        let (port, plain) = leaked_port();
        let bridge = ConsoleBridge::with_port(port);
        bridge.log(&record(log::Level::Info, format_args!("ready in {}ms", 12)));
        bridge.log(&record(log::Level::Error, format_args!("failed")));
        assert_eq!(plain.stdout(), vec!["ready in 12ms"]);
        assert_eq!(plain.stderr(), vec!["failed"]);
    }

    #[test]
    fn forwards_to_installed_logger() {
        let (port, plain) = leaked_port();
        let out = CaptureOutput::new();
        let log = Logger::builder()
            .env(EnvConfig::default())
            .color(false)
            .level("debug")
            .output(out.clone())
            .build();
        log.install_on(port);

        let bridge = ConsoleBridge::with_port(port).with_target(true);
        bridge.log(&record(log::Level::Trace, format_args!("100% done %s")));
        bridge.log(&record(log::Level::Warn, format_args!("slow")));

        assert!(plain.is_empty());
        assert_eq!(
            out.stderr(),
            vec![
                r#"[debug] 100% done %s smplog::{"target":"app::db"}"#,
                r#"[warn]  slow smplog::{"target":"app::db"}"#,
            ]
        );
    }

    #[test]
    fn percent_signs_survive_plain_console() {
        let (port, plain) = leaked_port();
        let bridge = ConsoleBridge::with_port(port);
        bridge.log(&record(log::Level::Info, format_args!("50%% off %d")));
        assert_eq!(plain.stdout(), vec!["50%% off %d"]);
    }

    #[test]
    fn always_enabled() {
        let (port, _plain) = leaked_port();
        let bridge = ConsoleBridge::with_port(port);
        let metadata = Metadata::builder().level(log::Level::Trace).target("x").build();
        assert!(bridge.enabled(&metadata));
    }
}
