//! Cycle-safe JSON rendering of payloads.
//!
//! A [`Shared`] node met again while it is still being rendered (that is,
//! it is one of its own ancestors) is replaced by a placeholder naming the
//! path to that ancestor: `"[Circular ~]"` for the root and
//! `"[Circular ~.a.b]"` otherwise. The same node reached through two
//! different branches is not a cycle and renders in full both times.

use serde_json::{Map, Number, Value as Json};

use crate::value::{Fields, Shared, Value};

/// Render a payload as single-line JSON.
#[must_use]
pub fn stringify(fields: &Fields) -> String {
    Walker::default().fields(fields).to_string()
}

/// Convert any value into an acyclic JSON document.
#[must_use]
pub fn to_json(value: &Value) -> Json {
    Walker::default().value(value)
}

#[derive(Default)]
struct Walker {
    path: Vec<String>,
    // (node id, path length when the node was entered)
    ancestors: Vec<(usize, usize)>,
}

impl Walker {
    fn value(&mut self, value: &Value) -> Json {
        match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::Number((*i).into()),
            Value::UInt(u) => Json::Number((*u).into()),
            Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    self.path.push(i.to_string());
                    out.push(self.value(item));
                    self.path.pop();
                }
                Json::Array(out)
            }
            Value::Object(fields) => self.fields(fields),
            Value::Shared(node) => self.shared(node),
            Value::Fault(fault) => {
                let mut map = Map::new();
                map.insert("name".to_string(), Json::String(fault.name().to_string()));
                map.insert(
                    "message".to_string(),
                    Json::String(fault.message().to_string()),
                );
                self.entries(&mut map, fault.fields());
                Json::Object(map)
            }
        }
    }

    fn fields(&mut self, fields: &Fields) -> Json {
        let mut map = Map::new();
        self.entries(&mut map, fields);
        Json::Object(map)
    }

    fn entries(&mut self, map: &mut Map<String, Json>, fields: &Fields) {
        for (key, value) in fields.iter() {
            self.path.push(key.to_string());
            let rendered = self.value(value);
            self.path.pop();
            map.insert(key.to_string(), rendered);
        }
    }

    fn shared(&mut self, node: &Shared) -> Json {
        let id = node.id();
        if let Some(&(_, depth)) = self.ancestors.iter().find(|(ancestor, _)| *ancestor == id) {
            return Json::String(circular(&self.path[..depth]));
        }
        self.ancestors.push((id, self.path.len()));
        let rendered = {
            let inner = node.read();
            self.value(&inner)
        };
        self.ancestors.pop();
        rendered
    }
}

fn circular(path: &[String]) -> String {
    if path.is_empty() {
        "[Circular ~]".to_string()
    } else {
        format!("[Circular ~.{}]", path.join("."))
    }
}
