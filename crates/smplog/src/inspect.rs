//! Human-readable rendering of non-text values.
//!
//! Used for message arguments that are not strings and for `%o`/`%O`
//! substitutions. Strings are quoted, objects render as `{ key: value }`,
//! nesting deeper than [`MAX_DEPTH`] collapses to `[Object]`/`[Array]`, and a
//! shared node that contains itself renders as `[Circular]`.

use crate::value::{Fields, Value};

/// Nesting depth rendered before collapsing containers.
pub const MAX_DEPTH: usize = 2;

/// Render a value for display.
#[must_use]
pub fn inspect(value: &Value) -> String {
    let mut out = String::new();
    Inspector::default().write(&mut out, value, 0);
    out
}

/// Render a number the way it reads in a log line: integral floats drop
/// the fraction, non-finite values are spelled out.
#[must_use]
pub fn number(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else {
        f.to_string()
    }
}

#[derive(Default)]
struct Inspector {
    ancestors: Vec<usize>,
}

impl Inspector {
    fn write(&mut self, out: &mut String, value: &Value, depth: usize) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::UInt(u) => out.push_str(&u.to_string()),
            Value::Float(f) => out.push_str(&number(*f)),
            Value::String(s) => quote(out, s),
            Value::Array(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                } else if depth > MAX_DEPTH {
                    out.push_str("[Array]");
                } else {
                    out.push_str("[ ");
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write(out, item, depth + 1);
                    }
                    out.push_str(" ]");
                }
            }
            Value::Object(fields) => self.object(out, fields, depth),
            Value::Shared(node) => {
                let id = node.id();
                if self.ancestors.contains(&id) {
                    out.push_str("[Circular]");
                    return;
                }
                self.ancestors.push(id);
                {
                    let inner = node.read();
                    self.write(out, &inner, depth);
                }
                self.ancestors.pop();
            }
            Value::Fault(fault) => {
                out.push_str(&fault.to_string());
                if !fault.fields().is_empty() {
                    out.push(' ');
                    self.object(out, fault.fields(), depth);
                }
            }
        }
    }

    fn object(&mut self, out: &mut String, fields: &Fields, depth: usize) {
        if fields.is_empty() {
            out.push_str("{}");
            return;
        }
        if depth > MAX_DEPTH {
            out.push_str("[Object]");
            return;
        }
        out.push_str("{ ");
        for (i, (key, value)) in fields.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if is_identifier(key) {
                out.push_str(key);
            } else {
                quote(out, key);
            }
            out.push_str(": ");
            self.write(out, value, depth + 1);
        }
        out.push_str(" }");
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn quote(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
}
