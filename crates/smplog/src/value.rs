//! Dynamic payload values.
//!
//! Payloads are insertion-ordered [`Fields`] of [`Value`]s. Values are plain
//! data except for two variants:
//!
//! - [`Shared`] is a reference-counted node with interior mutability. It is
//!   the only way to build an object graph with reference cycles, and the
//!   renderers detect cycles by node identity.
//! - [`Fault`] is the structured form of an error value.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer too large for `Int`.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    String(String),
    /// Ordered list.
    Array(Vec<Value>),
    /// Nested mapping.
    Object(Fields),
    /// Shared node; may participate in cycles.
    Shared(Shared),
    /// Error value.
    Fault(Fault),
}

impl Value {
    /// Text content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is an object-like container (object, shared node or fault).
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Shared(_) | Self::Fault(_))
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Value::UInt(v), Value::Int)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::from(v as u64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl From<Fields> for Value {
    fn from(v: Fields) -> Self {
        Value::Object(v)
    }
}

impl From<Shared> for Value {
    fn from(v: Shared) -> Self {
        Value::Shared(v)
    }
}

impl From<Fault> for Value {
    fn from(v: Fault) -> Self {
        Value::Fault(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::String(v.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(Fields::from(map)),
        }
    }
}

/// Insertion-ordered mapping of payload keys to values.
///
/// Inserting an existing key replaces its value without moving it; new keys
/// are appended. This is the merge order used for tags and payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    /// Empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert only when `key` is absent. Returns whether the value was stored.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge `other` into `self`: existing keys take `other`'s value in
    /// place, new keys are appended in `other`'s order.
    pub fn merge(&mut self, other: Fields) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Copy of `self` with `other` merged over it.
    #[must_use]
    pub fn merged(&self, other: Fields) -> Fields {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Parse a `key=value` assignment.
    ///
    /// The right-hand side is read as a JSON scalar or document when it
    /// parses as one (`n=2`, `ok=true`, `ids=[1,2]`), and as plain text
    /// otherwise.
    pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| Error::InvalidField(raw.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidField(raw.to_string()));
        }
        let value = serde_json::from_str::<serde_json::Value>(value)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        Ok((key.to_string(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        fields.extend(iter);
        fields
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Fields {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

/// Build [`Fields`] from `key => value` pairs.
///
/// ```
/// let fields = smplog::fields! { "user" => "ann", "attempt" => 2 };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(fields.insert($key, $crate::Value::from($value));)+
        fields
    }};
}

/// Reference-counted payload node.
///
/// Clones point at the same node, so a node can be stored inside itself:
///
/// ```
/// use smplog::{Fields, Shared};
///
/// let node = Shared::new(Fields::new());
/// node.insert("me", node.clone());
/// ```
///
/// Nodes that form a cycle keep each other alive and are never freed.
#[derive(Clone)]
pub struct Shared(Arc<RwLock<Value>>);

impl Shared {
    /// Wrap a value in a new node.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Arc::new(RwLock::new(value.into())))
    }

    /// Read access to the node's value.
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the node's value.
    pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert into the node when it holds an object. Returns `false` for
    /// any other kind of value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match &mut *self.write() {
            Value::Object(fields) => {
                fields.insert(key, value);
                true
            }
            _ => false,
        }
    }

    /// Push onto the node when it holds an array.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        match &mut *self.write() {
            Value::Array(items) => {
                items.push(value.into());
                true
            }
            _ => false,
        }
    }

    /// Node identity, used for cycle detection.
    #[must_use]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Shared {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Shared {
    // Never descends: the node may contain itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared({:#x})", self.id())
    }
}

/// Structured error value: `{ name, message, ...fields }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    name: String,
    message: String,
    fields: Fields,
}

impl Fault {
    /// Fault with an explicit name and message.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            fields: Fields::new(),
        }
    }

    /// Capture an error. The name is the error's type name; the immediate
    /// `source()`, if any, is recorded under `cause`.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut fault = Self::new(short_type_name::<E>(), err.to_string());
        if let Some(source) = err.source() {
            fault.fields.insert("cause", source.to_string());
        }
        fault
    }

    /// Add a structured field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key, value);
        self
    }

    /// Error name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Extra structured fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn insert_replaces_in_place() {
        let mut fields = fields! { "a" => 1, "b" => 2 };
        let old = fields.insert("a", 10);
        assert_eq!(old, Some(Value::Int(1)));
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(fields.get("a"), Some(&Value::Int(10)));
    }

    #[test]
    fn merge_appends_new_keys_after_existing() {
        let defaults = fields! { "env" => "prod", "region" => "eu" };
        let merged = defaults.merged(fields! { "code" => 500, "env" => "stage" });
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["env", "region", "code"]);
        assert_eq!(merged.get("env"), Some(&Value::from("stage")));
    }

    #[test]
    fn insert_if_absent_keeps_existing() {
        let mut fields = fields! { "error" => "explicit" };
        assert!(!fields.insert_if_absent("error", 1));
        assert!(fields.insert_if_absent("other", 1));
        assert_eq!(fields.get("error"), Some(&Value::from("explicit")));
    }

    #[test]
    fn remove_key() {
        let mut fields = fields! { "a" => 1, "b" => 2 };
        assert_eq!(fields.remove("a"), Some(Value::Int(1)));
        assert_eq!(fields.remove("a"), None);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn large_unsigned_stays_unsigned() {
        assert_eq!(Value::from(7_u64), Value::Int(7));
        assert_eq!(Value::from(u64::MAX), Value::UInt(u64::MAX));
    }

    #[test]
    fn json_object_keeps_order() {
        let json: serde_json::Value = serde_json::from_str(r#"{"z":1,"a":[true,null]}"#).unwrap();
        let Value::Object(fields) = Value::from(json) else {
            panic!("expected object");
        };
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(
            fields.get("a"),
            Some(&Value::Array(vec![Value::Bool(true), Value::Null]))
        );
    }

    #[test]
    fn parse_assignment_reads_json_scalars() {
        assert_eq!(
            Fields::parse_assignment("v=2").unwrap(),
            ("v".to_string(), Value::Int(2))
        );
        assert_eq!(
            Fields::parse_assignment("name=ann").unwrap(),
            ("name".to_string(), Value::from("ann"))
        );
        assert_eq!(
            Fields::parse_assignment("eq=a=b").unwrap(),
            ("eq".to_string(), Value::from("a=b"))
        );
    }

    #[test]
    fn parse_assignment_rejects_missing_key() {
        assert!(matches!(
            Fields::parse_assignment("novalue"),
            Err(Error::InvalidField(_))
        ));
        assert!(matches!(
            Fields::parse_assignment("=1"),
            Err(Error::InvalidField(_))
        ));
    }

    #[test]
    fn shared_node_can_contain_itself() {
        let node = Shared::new(Fields::new());
        assert!(node.insert("me", node.clone()));
        let guard = node.read();
        let Value::Object(fields) = &*guard else {
            panic!("expected object");
        };
        assert_eq!(fields.get("me"), Some(&Value::Shared(node.clone())));
    }

    #[test]
    fn shared_insert_on_scalar_is_rejected() {
        let node = Shared::new(1);
        assert!(!node.insert("k", 1));
        assert!(!node.push(1));
    }

    #[test]
    fn shared_debug_does_not_recurse() {
        let node = Shared::new(Fields::new());
        node.insert("me", node.clone());
        assert!(format!("{node:?}").starts_with("Shared(0x"));
    }

    #[test]
    fn fault_from_io_error() {
        let err = io::Error::new(io::ErrorKind::NotFound, "missing file");
        let fault = Fault::from_error(&err);
        assert_eq!(fault.name(), "Error");
        assert_eq!(fault.message(), "missing file");
        assert_eq!(fault.to_string(), "Error: missing file");
    }

    #[test]
    fn fault_from_parse_error_uses_type_name() {
        let err = "x".parse::<i32>().unwrap_err();
        let fault = Fault::from_error(&err);
        assert_eq!(fault.name(), "ParseIntError");
    }

    #[test]
    fn fault_with_fields() {
        let fault = Fault::new("TimeoutError", "took too long").with_field("after_ms", 500);
        assert_eq!(fault.fields().get("after_ms"), Some(&Value::Int(500)));
    }
}
