//! printf-style message formatting.
//!
//! The first argument, when it is a string, is a template. Conversions:
//!
//! | Conversion | Output |
//! |------|--------|
//! | `%s` | strings as-is, other values inspected |
//! | `%d` | numeric value |
//! | `%i` | integer part |
//! | `%f` | floating point value |
//! | `%j` | JSON |
//! | `%o`, `%O` | inspected value |
//! | `%c` | consumes an argument, prints nothing |
//! | `%%` | a literal `%` |
//!
//! Conversions without a matching argument stay in the output verbatim.
//! Arguments left over after the template are appended, separated by
//! spaces. A lone template is returned untouched, `%%` included.

use crate::inspect::{inspect, number};
use crate::stringify::to_json;
use crate::value::Value;

/// Format a message from its arguments.
#[must_use]
pub fn format(args: &[Value]) -> String {
    let Some((first, rest)) = args.split_first() else {
        return String::new();
    };
    let Value::String(template) = first else {
        return args.iter().map(display).collect::<Vec<_>>().join(" ");
    };
    if rest.is_empty() {
        return template.clone();
    }

    let mut out = String::with_capacity(template.len());
    let mut pending = rest.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(&spec) = chars.peek() else {
            out.push('%');
            break;
        };
        if spec == '%' {
            chars.next();
            out.push('%');
            continue;
        }
        if !is_conversion(spec) {
            out.push('%');
            continue;
        }
        match pending.next() {
            Some(arg) => {
                chars.next();
                out.push_str(&convert(spec, arg));
            }
            None => out.push('%'),
        }
    }

    for arg in pending {
        out.push(' ');
        out.push_str(&display(arg));
    }
    out
}

/// Number of conversions in `template` that consume an argument. `%%` is
/// an escape and does not count.
#[must_use]
pub fn placeholder_count(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(spec) = chars.next() {
                if is_conversion(spec) {
                    count += 1;
                }
            }
        }
    }
    count
}

fn is_conversion(c: char) -> bool {
    matches!(c, 's' | 'd' | 'i' | 'f' | 'j' | 'o' | 'O' | 'c')
}

/// Strings as-is, everything else inspected.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => inspect(other),
    }
}

fn convert(spec: char, arg: &Value) -> String {
    match spec {
        's' => match arg {
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => number(*f),
            other => display(other),
        },
        'd' => match arg {
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            other => number(to_number(other)),
        },
        'i' => match arg {
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => number(f.trunc()),
            Value::String(s) => number(leading_number(s, false)),
            _ => number(f64::NAN),
        },
        'f' => match arg {
            Value::String(s) => number(leading_number(s, true)),
            Value::Int(_) | Value::UInt(_) | Value::Float(_) => number(to_number(arg)),
            _ => number(f64::NAN),
        },
        'j' => to_json(arg).to_string(),
        'o' | 'O' => inspect(arg),
        // 'c' consumes its argument silently
        _ => String::new(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Int(i) => *i as f64,
        Value::UInt(u) => *u as f64,
        Value::Float(f) => *f,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>()
                    .ok()
                    .filter(|_| s.bytes().any(|b| b.is_ascii_digit()))
                    .unwrap_or(f64::NAN)
            }
        }
        _ => f64::NAN,
    }
}

/// Longest numeric prefix of `s`, `NaN` when there is none.
fn leading_number(s: &str, fraction: bool) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_run = |mut at: usize| {
        while at < bytes.len() && bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if fraction && s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_end = digits_run(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if fraction {
        if bytes.get(end) == Some(&b'.') {
            let frac_end = digits_run(end + 1);
            if frac_end > end + 1 || has_digits {
                has_digits |= frac_end > end + 1;
                end = frac_end;
            }
        }
        if has_digits && matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_end = digits_run(exp);
            if exp_end > exp {
                end = exp_end;
            }
        }
    }

    if !has_digits {
        return f64::NAN;
    }
    s[..end].trim_end_matches('.').parse::<f64>().unwrap_or(f64::NAN)
}
