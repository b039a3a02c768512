//! Process console and global installation.
//!
//! A [`ConsolePort`] is a table of console methods (`debug`, `info`,
//! `warn`, `error`, `log`), each bound to a handler. Installing a
//! [`Logger`] rebinds every method to that logger; installations stack, so
//! uninstalling returns control to the previously installed logger, and
//! uninstalling the last one restores the bindings that were in place
//! before the first install.
//!
//! [`ConsolePort::global`] is the process-wide port behind the free
//! functions [`debug`], [`info`], [`warn`], [`error`] and [`log`]. Separate
//! ports can be created for embedding and tests.
//!
//! # Example
//!
//! ```
//! use smplog::console::{Bindings, ConsolePort};
//! use smplog::testing::CaptureOutput;
//! use smplog::Logger;
//!
//! let plain = CaptureOutput::new();
//! let port = ConsolePort::new(Bindings::plain(plain.clone()));
//!
//! let captured = CaptureOutput::new();
//! let log = Logger::builder()
//!     .env(smplog::EnvConfig::default())
//!     .color(false)
//!     .output(captured.clone())
//!     .build();
//!
//! log.install_on(&port);
//! port.warn("through the logger").unwrap();
//! log.uninstall_from(&port);
//! port.warn("plain again").unwrap();
//!
//! assert_eq!(captured.stderr(), vec!["[warn]  through the logger"]);
//! assert_eq!(plain.stderr(), vec!["plain again"]);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::args::Args;
use crate::error::Result;
use crate::level::Severity;
use crate::logger::Logger;
use crate::output::{Output, StdOutput, Stream};
use crate::printf;

/// Console methods that installation rebinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Debug,
    Info,
    Warn,
    Error,
    Log,
}

impl Method {
    /// Every installable method.
    pub const ALL: [Method; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Log,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Log => "log",
        }
    }

    /// Severity a logger uses for this method; `log` is `info`.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::Debug => Severity::Debug,
            Self::Info | Self::Log => Severity::Info,
            Self::Warn => Severity::Warn,
            Self::Error => Severity::Error,
        }
    }

    /// Stream the plain console writes this method to.
    #[must_use]
    pub fn plain_stream(self) -> Stream {
        match self {
            Self::Debug | Self::Info | Self::Log => Stream::Stdout,
            Self::Warn | Self::Error => Stream::Stderr,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl From<Severity> for Method {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Debug => Self::Debug,
            Severity::Info => Self::Info,
            Severity::Warn => Self::Warn,
            Severity::Error => Self::Error,
        }
    }
}

/// A console method implementation.
pub type Handler = Arc<dyn Fn(Args) -> Result<()> + Send + Sync>;

/// One handler per [`Method`].
#[derive(Clone)]
pub struct Bindings {
    handlers: [Handler; 5],
}

impl Bindings {
    /// Plain console on the process streams.
    #[must_use]
    pub fn pristine() -> Self {
        Self::plain(StdOutput)
    }

    /// Plain console: arguments are printf-formatted without payload
    /// handling; `debug`, `info` and `log` write to stdout, `warn` and
    /// `error` to stderr.
    #[must_use]
    pub fn plain(output: impl Output + 'static) -> Self {
        let output: Arc<dyn Output> = Arc::new(output);
        Self {
            handlers: Method::ALL.map(|method| {
                let output = Arc::clone(&output);
                let handler: Handler = Arc::new(move |args: Args| {
                    let line = printf::format(&args.into_values());
                    output.write_line(method.plain_stream(), &line)?;
                    Ok(())
                });
                handler
            }),
        }
    }

    /// Every method delegating to `logger`.
    #[must_use]
    pub fn for_logger(logger: &Logger) -> Self {
        Self {
            handlers: Method::ALL.map(|method| {
                let logger = logger.clone();
                let handler: Handler =
                    Arc::new(move |args: Args| logger.emit(method.severity(), args));
                handler
            }),
        }
    }

    /// Handler bound to `method`.
    #[must_use]
    pub fn get(&self, method: Method) -> &Handler {
        &self.handlers[method.index()]
    }

    /// Rebind `method`.
    pub fn set(&mut self, method: Method, handler: Handler) {
        self.handlers[method.index()] = handler;
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(Method::ALL.iter().map(|m| m.as_str()))
            .finish()
    }
}

struct State {
    current: Bindings,
    // Taken at the first install, restored when the stack empties.
    originals: Option<Bindings>,
    installed: Vec<Logger>,
}

/// A console method table with an installation stack.
pub struct ConsolePort {
    state: Mutex<State>,
}

static GLOBAL: OnceLock<ConsolePort> = OnceLock::new();

impl ConsolePort {
    /// Port starting out with `bindings`.
    #[must_use]
    pub fn new(bindings: Bindings) -> Self {
        Self {
            state: Mutex::new(State {
                current: bindings,
                originals: None,
                installed: Vec::new(),
            }),
        }
    }

    /// The process-wide port, created on first use with
    /// [`Bindings::pristine`].
    pub fn global() -> &'static ConsolePort {
        GLOBAL.get_or_init(|| ConsolePort::new(Bindings::pristine()))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────

    /// Invoke the handler currently bound to `method`.
    ///
    /// The port is unlocked while the handler runs, so handlers may log
    /// through the port or install loggers themselves.
    pub fn call(&self, method: Method, args: impl Into<Args>) -> Result<()> {
        let handler = Arc::clone(self.lock().current.get(method));
        handler(args.into())
    }

    pub fn debug(&self, args: impl Into<Args>) -> Result<()> {
        self.call(Method::Debug, args)
    }

    pub fn info(&self, args: impl Into<Args>) -> Result<()> {
        self.call(Method::Info, args)
    }

    pub fn warn(&self, args: impl Into<Args>) -> Result<()> {
        self.call(Method::Warn, args)
    }

    pub fn error(&self, args: impl Into<Args>) -> Result<()> {
        self.call(Method::Error, args)
    }

    pub fn log(&self, args: impl Into<Args>) -> Result<()> {
        self.call(Method::Log, args)
    }

    // ─────────────────────────────────────────────────
    // Binding and installation
    // ─────────────────────────────────────────────────

    /// Replace the handler for one method, as a host would patch a single
    /// console function. An installed logger replaces it again.
    pub fn bind<F>(&self, method: Method, handler: F)
    where
        F: Fn(Args) -> Result<()> + Send + Sync + 'static,
    {
        self.lock().current.set(method, Arc::new(handler));
    }

    /// Push `logger` and bind every method to it.
    pub fn install(&self, logger: &Logger) {
        let mut state = self.lock();
        if state.originals.is_none() {
            state.originals = Some(state.current.clone());
        }
        state.installed.push(logger.clone());
        state.current = Bindings::for_logger(logger);
    }

    /// Pop the most recently installed logger and rebind to the one below
    /// it, or to the original bindings when none is left. Returns the
    /// popped logger; popping an empty stack changes nothing.
    pub fn uninstall(&self) -> Option<Logger> {
        let mut state = self.lock();
        let popped = state.installed.pop()?;
        match state.installed.last() {
            Some(top) => state.current = Bindings::for_logger(top),
            None => {
                if let Some(originals) = state.originals.clone() {
                    state.current = originals;
                }
            }
        }
        Some(popped)
    }

    /// Number of installed loggers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.lock().installed.len()
    }

    /// The logger the methods currently delegate to.
    #[must_use]
    pub fn active(&self) -> Option<Logger> {
        self.lock().installed.last().cloned()
    }

    /// Whether no logger is installed.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.lock().installed.is_empty()
    }
}

impl fmt::Debug for ConsolePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsolePort")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

/// `debug` on the global console.
pub fn debug(args: impl Into<Args>) -> Result<()> {
    ConsolePort::global().debug(args)
}

/// `info` on the global console.
pub fn info(args: impl Into<Args>) -> Result<()> {
    ConsolePort::global().info(args)
}

/// `warn` on the global console.
pub fn warn(args: impl Into<Args>) -> Result<()> {
    ConsolePort::global().warn(args)
}

/// `error` on the global console.
pub fn error(args: impl Into<Args>) -> Result<()> {
    ConsolePort::global().error(args)
}

/// `log` on the global console.
pub fn log(args: impl Into<Args>) -> Result<()> {
    ConsolePort::global().log(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use crate::fields;
    use crate::testing::CaptureOutput;
    use std::sync::Mutex;

    fn capture_logger(out: &CaptureOutput, name: &str) -> Logger {
        Logger::builder()
            .env(EnvConfig::default())
            .color(false)
            .level("debug")
            .tag("logger", name)
            .output(out.clone())
            .build()
    }

    fn port() -> (ConsolePort, CaptureOutput) {
        let plain = CaptureOutput::new();
        (ConsolePort::new(Bindings::plain(plain.clone())), plain)
    }

    #[test]
    fn plain_bindings_route_by_method() {
        let (port, plain) = port();
        port.debug("d").unwrap();
        port.info("i").unwrap();
        port.log("l").unwrap();
        port.warn("w").unwrap();
        port.error(("e", fields! { "k" => 1 })).unwrap();
        assert_eq!(plain.stdout(), vec!["d", "i", "l"]);
        assert_eq!(plain.stderr(), vec!["w", "e { k: 1 }"]);
    }

    #[test]
    fn install_routes_every_method() {
        let (port, plain) = port();
        let out = CaptureOutput::new();
        let log = capture_logger(&out, "a");
        log.install_on(&port);

        port.debug("d").unwrap();
        port.info("i").unwrap();
        port.log("l").unwrap();
        port.warn("w").unwrap();
        port.error("e").unwrap();

        assert!(plain.is_empty());
        assert_eq!(
            out.stdout(),
            vec![
                r#"[info]  i smplog::{"logger":"a"}"#,
                r#"[info]  l smplog::{"logger":"a"}"#,
            ]
        );
        assert_eq!(out.stderr().len(), 3);
        assert_eq!(port.depth(), 1);
        assert!(port.active().unwrap().ptr_eq(&log));
    }

    #[test]
    fn nested_installs_restore_in_stack_order() {
        let (port, plain) = port();
        let out = CaptureOutput::new();
        let a = capture_logger(&out, "a");
        let b = capture_logger(&out, "b");

        a.install_on(&port);
        b.install_on(&port);
        port.info("to b").unwrap();

        b.uninstall_from(&port);
        port.info("to a").unwrap();

        a.uninstall_from(&port);
        port.info("to plain").unwrap();

        assert_eq!(
            out.stdout(),
            vec![
                r#"[info]  to b smplog::{"logger":"b"}"#,
                r#"[info]  to a smplog::{"logger":"a"}"#,
            ]
        );
        assert_eq!(plain.stdout(), vec!["to plain"]);
        assert!(port.is_pristine());
    }

    #[test]
    fn uninstall_pops_top_regardless_of_caller() {
        let (port, _plain) = port();
        let out = CaptureOutput::new();
        let a = capture_logger(&out, "a");
        let b = capture_logger(&out, "b");
        a.install_on(&port);
        b.install_on(&port);

        // `a` asks, but `b` is on top
        a.uninstall_from(&port);
        assert!(port.active().unwrap().ptr_eq(&a));
    }

    #[test]
    fn uninstall_on_empty_stack_is_noop() {
        let (port, plain) = port();
        assert!(port.uninstall().is_none());
        port.info("still plain").unwrap();
        assert_eq!(plain.stdout(), vec!["still plain"]);
    }

    #[test]
    fn originals_are_captured_at_first_install() {
        let (port, _plain) = port();
        let patched = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&patched);
        port.bind(Method::Info, move |args: Args| {
            sink.lock().unwrap().push(printf::format(&args.into_values()));
            Ok(())
        });

        let out = CaptureOutput::new();
        let log = capture_logger(&out, "a");
        log.install_on(&port);
        port.info("logged").unwrap();
        log.uninstall_from(&port);
        port.info("patched").unwrap();

        assert_eq!(*patched.lock().unwrap(), vec!["patched".to_string()]);
    }

    #[test]
    fn same_logger_installed_twice() {
        let (port, plain) = port();
        let out = CaptureOutput::new();
        let log = capture_logger(&out, "a");
        log.install_on(&port);
        log.install_on(&port);
        log.uninstall_from(&port);
        port.warn("still logger").unwrap();
        log.uninstall_from(&port);
        port.warn("plain").unwrap();
        assert_eq!(out.stderr().len(), 1);
        assert_eq!(plain.stderr(), vec!["plain"]);
    }

    #[test]
    fn handlers_may_reenter_the_port() {
        let (port, plain) = port();
        let port = Arc::new(port);
        let inner = Arc::clone(&port);
        port.bind(Method::Debug, move |args: Args| inner.info(args));
        port.debug("forwarded").unwrap();
        assert_eq!(plain.stdout(), vec!["forwarded"]);
    }

    #[test]
    fn method_severity_mapping() {
        assert_eq!(Method::Log.severity(), Severity::Info);
        assert_eq!(Method::from(Severity::Warn), Method::Warn);
        assert_eq!(Method::ALL.len(), 5);
    }
}
