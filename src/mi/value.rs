//! The MI value tree: a small recursive type with GDB/MI's own
//! serialization rules (distinct from JSON — every scalar is quoted, object
//! keys are unquoted, root objects are unbraced).

use crate::util::escape_c_string;

/// A value in GDB/MI's result/async record bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum MIValue {
    Null,
    String(String),
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Array(Vec<MIValue>),
    /// Insertion-ordered key/value pairs; iteration order is the order
    /// keys were first assigned.
    Object(Vec<(String, MIValue)>),
}

impl MIValue {
    /// A fresh, empty object.
    pub fn object() -> Self {
        MIValue::Object(Vec::new())
    }

    /// Assign `key` to `value`. A `Null` receiver is promoted to an empty
    /// object first; assigning onto any other non-object value panics
    /// (type mismatches in this tree fail loudly, never silently).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MIValue>) -> &mut Self {
        if matches!(self, MIValue::Null) {
            *self = MIValue::Object(Vec::new());
        }
        let key = key.into();
        let value = value.into();
        match self {
            MIValue::Object(entries) => {
                if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
                    existing.1 = value;
                } else {
                    entries.push((key, value));
                }
            }
            _ => panic!("MIValue::set called on a non-object value"),
        }
        self
    }

    /// Whether this value serializes to nothing (an empty object), i.e.
    /// there are no details to append to a result record.
    pub fn is_empty(&self) -> bool {
        matches!(self, MIValue::Object(entries) if entries.is_empty())
    }

    /// Root-level serialization: an object is a bare comma-separated list
    /// of `key=value`; anything else serializes as a normal scalar/
    /// array/nested object would.
    pub fn serialize(&self) -> String {
        match self {
            MIValue::Object(entries) => entries
                .iter()
                .map(|(k, v)| format!("{}={}", k, v.serialize_nested()))
                .collect::<Vec<_>>()
                .join(","),
            other => other.serialize_nested(),
        }
    }

    fn serialize_nested(&self) -> String {
        match self {
            MIValue::Null => "\"\"".to_string(),
            MIValue::String(s) => format!("\"{}\"", escape_c_string(s)),
            MIValue::Bool(b) => format!("\"{}\"", b),
            MIValue::Integer(i) => format!("\"{}\"", i),
            MIValue::Unsigned(u) => format!("\"{}\"", u),
            MIValue::Float(f) => format!("\"{}\"", f),
            MIValue::Array(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(MIValue::serialize_nested)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            MIValue::Object(entries) => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v.serialize_nested()))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }

    /// `prefix + "," + serialize() + "\n"`, omitting the comma and body
    /// entirely when there are no details to report.
    pub fn to_message(&self, prefix: &str) -> String {
        let body = self.serialize();
        if body.is_empty() {
            format!("{}\n", prefix)
        } else {
            format!("{},{}\n", prefix, body)
        }
    }
}

impl From<&str> for MIValue {
    fn from(s: &str) -> Self {
        MIValue::String(s.to_string())
    }
}

impl From<String> for MIValue {
    fn from(s: String) -> Self {
        MIValue::String(s)
    }
}

impl From<bool> for MIValue {
    fn from(b: bool) -> Self {
        MIValue::Bool(b)
    }
}

impl From<i64> for MIValue {
    fn from(i: i64) -> Self {
        MIValue::Integer(i)
    }
}

impl From<u64> for MIValue {
    fn from(u: u64) -> Self {
        MIValue::Unsigned(u)
    }
}

impl From<Vec<MIValue>> for MIValue {
    fn from(items: Vec<MIValue>) -> Self {
        MIValue::Array(items)
    }
}
