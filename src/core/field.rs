//! Structured key-value fields attached to records
//!
//! This module provides:
//! - `FieldValue`: a single scalar or structured value
//! - `Fields`: an ordered, key-unique list of fields
//! - pairing of variadic `key, value, key, value` call-site sequences

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Marker key carrying a dangling key from an odd-length key-value sequence
pub const IGNORED_KEY: &str = "ignored";

/// Marker key carrying pairs whose key was not a string
pub const INVALID_KEY: &str = "invalid";

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Duration(Duration),
    /// Arbitrary structure, already converted to JSON
    Json(serde_json::Value),
    Null,
}

impl FieldValue {
    /// Capture any serializable value as a structured field.
    ///
    /// Serialization failures are recorded in place of the value rather than
    /// failing the log call.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => FieldValue::Json(json),
            Err(e) => FieldValue::String(format!("<unserializable: {}>", e)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::UInt(u) => serde_json::Value::Number((*u).into()),
            FieldValue::Float(f) => float_to_json(*f),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Duration(d) => float_to_json(duration_millis(*d)),
            FieldValue::Json(v) => v.clone(),
            FieldValue::Null => serde_json::Value::Null,
        }
    }
}

/// Durations are rendered in milliseconds, keeping sub-millisecond precision
pub fn duration_millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

fn float_to_json(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        // NaN and infinities have no JSON number form
        .unwrap_or_else(|| serde_json::Value::String(f.to_string()))
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::UInt(u) => write!(f, "{}", u),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Duration(d) => write!(f, "{:?}", d),
            FieldValue::Json(v) => write!(f, "{}", v),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(i: $t) -> Self {
                FieldValue::Int(i as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(u: $t) -> Self {
                FieldValue::UInt(u as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<f32> for FieldValue {
    fn from(f: f32) -> Self {
        FieldValue::Float(f64::from(f))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Duration> for FieldValue {
    fn from(d: Duration) -> Self {
        FieldValue::Duration(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::String(s) => FieldValue::String(s),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::UInt(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            other => FieldValue::Json(other),
        }
    }
}

/// Ordered key-value fields; keys are unique and a later insert replaces the
/// earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Add a field (builder version)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.add_field(key, value);
        self
    }

    /// Add a field, replacing any existing value for the same key
    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Pair a variadic `key, value, key, value, ...` sequence.
    ///
    /// Keys must be strings. Pairs with a non-string key are collected under
    /// [`INVALID_KEY`]; a trailing key without a value is kept under
    /// [`IGNORED_KEY`]. Nothing is dropped silently.
    pub fn from_key_values(key_values: &[FieldValue]) -> Self {
        let mut fields = Fields::with_capacity(key_values.len() / 2 + 1);
        let mut invalid = Vec::new();

        let mut pairs = key_values.chunks_exact(2);
        for pair in &mut pairs {
            match &pair[0] {
                FieldValue::String(key) => fields.add_field(key.as_str(), pair[1].clone()),
                other => invalid.push(format!("{}={}", other, pair[1])),
            }
        }

        if !invalid.is_empty() {
            fields.add_field(INVALID_KEY, invalid.join(", "));
        }
        if let [dangling] = pairs.remainder() {
            fields.add_field(IGNORED_KEY, dangling.clone());
        }

        fields
    }

    /// Extend with `other`; its values win on duplicate keys
    pub fn merge(&mut self, other: &Fields) {
        for (key, value) in &other.entries {
            self.add_field(key.as_str(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.add_field(key, value);
        }
        fields
    }
}
