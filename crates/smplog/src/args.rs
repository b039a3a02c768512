//! Call arguments for severity methods.
//!
//! A severity call takes an ordered list of [`Arg`]s: text, plain values,
//! payload mappings and faults. [`Args::normalize`] splits them into the
//! formatted message and the payload:
//!
//! 1. A leading text argument is a template; it consumes itself plus one
//!    argument per printf conversion.
//! 2. If arguments remain beyond those and the last one is a [`Fields`],
//!    it becomes the payload. A [`Shared`](crate::value::Shared) node
//!    holding an object counts too; its current fields are copied.
//! 3. A lone [`Fault`] is also stored in the payload, under `error`
//!    (`warning` for [`Severity::Warn`]), unless that key is taken.
//! 4. Everything still in the list is formatted into the message.

use crate::level::Severity;
use crate::printf;
use crate::value::{Fault, Fields, Value};

/// One call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Text; a template when first.
    Text(String),
    /// Any other value, formatted into the message.
    Value(Value),
    /// Payload candidate.
    Fields(Fields),
    /// Error value.
    Fault(Fault),
}

impl Arg {
    /// Capture an error as a fault argument.
    pub fn fault<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Self::Fault(Fault::from_error(err))
    }

    /// Whether this argument can be taken as the payload.
    fn is_mapping(&self) -> bool {
        match self {
            Self::Fields(_) => true,
            Self::Value(Value::Shared(node)) => matches!(&*node.read(), Value::Object(_)),
            _ => false,
        }
    }

    /// The argument as a plain value, for message formatting.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Text(s) => Value::String(s),
            Self::Value(v) => v,
            Self::Fields(f) => Value::Object(f),
            Self::Fault(f) => Value::Fault(f),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<Fields> for Arg {
    fn from(f: Fields) -> Self {
        Self::Fields(f)
    }
}

impl From<Fault> for Arg {
    fn from(f: Fault) -> Self {
        Self::Fault(f)
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Self::Text(s),
            Value::Object(f) => Self::Fields(f),
            Value::Fault(f) => Self::Fault(f),
            other => Self::Value(other),
        }
    }
}

macro_rules! arg_from_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Arg {
            fn from(v: $ty) -> Self {
                Self::Value(Value::from(v))
            }
        })*
    };
}

arg_from_value!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// Ordered call arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Arg>);

impl Args {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.0.push(arg.into());
        self
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Arguments as plain values, in order.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0.into_iter().map(Arg::into_value).collect()
    }

    /// Split into `(message, payload)` for a call at `severity`.
    #[must_use]
    pub fn normalize(self, severity: Severity) -> (String, Fields) {
        let mut args = self.0;

        let consumed = match args.first() {
            Some(Arg::Text(template)) => 1 + printf::placeholder_count(template),
            _ => 0,
        };

        let takes_payload = args.len() > consumed && args.last().is_some_and(Arg::is_mapping);
        let mut payload = match takes_payload.then(|| args.pop()).flatten() {
            Some(Arg::Fields(fields)) => fields,
            Some(Arg::Value(Value::Shared(node))) => {
                let inner = node.read();
                match &*inner {
                    Value::Object(fields) => fields.clone(),
                    _ => Fields::new(),
                }
            }
            _ => Fields::new(),
        };

        if let [Arg::Fault(fault)] = args.as_slice() {
            let key = match severity {
                Severity::Warn => "warning",
                _ => "error",
            };
            payload.insert_if_absent(key, fault.clone());
        }

        let values: Vec<Value> = args.into_iter().map(Arg::into_value).collect();
        (printf::format(&values), payload)
    }
}

impl From<Vec<Arg>> for Args {
    fn from(args: Vec<Arg>) -> Self {
        Self(args)
    }
}

impl From<Arg> for Args {
    fn from(arg: Arg) -> Self {
        Self(vec![arg])
    }
}

impl From<&str> for Args {
    fn from(s: &str) -> Self {
        Self::from(Arg::from(s))
    }
}

impl From<String> for Args {
    fn from(s: String) -> Self {
        Self::from(Arg::from(s))
    }
}

impl From<Fields> for Args {
    fn from(f: Fields) -> Self {
        Self::from(Arg::from(f))
    }
}

impl From<Fault> for Args {
    fn from(f: Fault) -> Self {
        Self::from(Arg::from(f))
    }
}

/// Message and payload, the explicit form of the most common call.
impl<T: Into<String>> From<(T, Fields)> for Args {
    fn from((message, fields): (T, Fields)) -> Self {
        Self(vec![Arg::Text(message.into()), Arg::Fields(fields)])
    }
}

/// Build [`Args`] from heterogeneous arguments.
///
/// ```
/// use smplog::{args, fields};
///
/// let args = args!["%s logged in", "ann", fields! { "attempt" => 2 }];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::Args::from(vec![$($crate::Arg::from($arg)),+])
    };
}
