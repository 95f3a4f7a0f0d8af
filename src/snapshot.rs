use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::PayloadError;
use crate::signals::Signal;

/// Last known value of one signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalValue {
    Number(f64),
    Bool(bool),
}

impl SignalValue {
    fn from_json(v: &Value) -> Option<Self> {
        match v {
            Value::Bool(b) => Some(SignalValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(SignalValue::Number),
            _ => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Number(n) => write!(f, "{n}"),
            SignalValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse one inbound frame. Only a top-level JSON object is accepted.
pub fn parse_payload(text: &str) -> Result<Map<String, Value>, PayloadError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(PayloadError::NotObject(json_type_name(&other))),
    }
}

/// Most recently known value per signal key. A missing key was never observed
/// or was last sent as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: BTreeMap<String, SignalValue>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge: every key in `payload` overwrites, all other keys are
    /// kept. A non-scalar value (null, string, array, object) clears the key,
    /// so it reads as absent. Returns how many keys now hold a value.
    pub fn merge(&mut self, payload: &Map<String, Value>) -> usize {
        let mut written = 0;
        for (key, raw) in payload {
            match SignalValue::from_json(raw) {
                Some(v) => {
                    self.values.insert(key.clone(), v);
                    written += 1;
                }
                None => {
                    debug!(key = %key, kind = json_type_name(raw), "clearing signal with non-scalar value");
                    self.values.remove(key);
                }
            }
        }
        written
    }

    /// Keys outside the signal dictionary, in key order.
    pub fn extras(&self) -> impl Iterator<Item = (&str, SignalValue)> {
        self.iter().filter(|(k, _)| Signal::from_key(k).is_none())
    }

    pub fn set(&mut self, signal: Signal, value: SignalValue) {
        self.values.insert(signal.key().to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<SignalValue> {
        self.values.get(key).copied()
    }

    pub fn number(&self, signal: Signal) -> Option<f64> {
        match self.get(signal.key())? {
            SignalValue::Number(n) => Some(n),
            SignalValue::Bool(_) => None,
        }
    }

    pub fn flag(&self, signal: Signal) -> Option<bool> {
        match self.get(signal.key())? {
            SignalValue::Bool(b) => Some(b),
            SignalValue::Number(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SignalValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
