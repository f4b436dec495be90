//! Dotted-path assertions over JSON response bodies (`ok_json`).
//!
//! An assertion is a single-entry mapping `{"result.value": true}`. The key
//! is split on `.` and walked through objects (by key) and arrays (by
//! decimal index). The value found at the end is compared with the expected
//! value:
//!
//! - strings match when the expected string is a *substring* of the found
//!   string;
//! - everything else matches only when both values have the same JSON type
//!   (integers and floats are distinct) and are equal.
//!
//! A path that cannot be followed is simply a non-match.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{RestError, Result};

/// A single `{path: expected}` assertion.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct JsonAssertion {
    pub path: String,
    pub expected: Value,
}

impl JsonAssertion {
    pub fn new(path: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
        }
    }

    /// Evaluate the assertion against a parsed document.
    pub fn matches(&self, document: &Value, trace: bool) -> bool {
        if trace {
            debug!(path = %self.path, expected = %self.expected, "Looking up JSON path");
        }

        let Some(found) = lookup(document, &self.path, trace) else {
            return false;
        };

        let result = value_matches(found, &self.expected);
        if trace {
            debug!(found = %found, expected = %self.expected, result, "Compared JSON value");
        }
        result
    }
}

impl TryFrom<Value> for JsonAssertion {
    type Error = RestError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => JsonAssertion::try_from(map),
            other => Err(RestError::InvalidAssertion(format!(
                "expected a mapping of path to value, got {other}"
            ))),
        }
    }
}

impl TryFrom<Map<String, Value>> for JsonAssertion {
    type Error = RestError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        if map.len() != 1 {
            return Err(RestError::InvalidAssertion(format!(
                "expected exactly one path, got {}",
                map.len()
            )));
        }
        let mut entries = map.into_iter();
        match entries.next() {
            Some((path, expected)) => Ok(JsonAssertion { path, expected }),
            None => Err(RestError::InvalidAssertion("empty mapping".to_string())),
        }
    }
}

impl From<JsonAssertion> for Value {
    fn from(assertion: JsonAssertion) -> Self {
        let mut map = Map::new();
        map.insert(assertion.path, assertion.expected);
        Value::Object(map)
    }
}

/// The `ok_json` property: one assertion, or a list where any match wins.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum BodyAssertion {
    One(JsonAssertion),
    Any(Vec<JsonAssertion>),
}

impl BodyAssertion {
    pub fn matches(&self, document: &Value, trace: bool) -> bool {
        match self {
            BodyAssertion::One(assertion) => assertion.matches(document, trace),
            BodyAssertion::Any(assertions) => assertions.iter().any(|a| a.matches(document, trace)),
        }
    }
}

impl TryFrom<Value> for BodyAssertion {
    type Error = RestError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(JsonAssertion::try_from)
                .collect::<Result<Vec<_>>>()
                .map(BodyAssertion::Any),
            single => JsonAssertion::try_from(single).map(BodyAssertion::One),
        }
    }
}

impl From<BodyAssertion> for Value {
    fn from(assertion: BodyAssertion) -> Self {
        match assertion {
            BodyAssertion::One(a) => a.into(),
            BodyAssertion::Any(all) => Value::Array(all.into_iter().map(Value::from).collect()),
        }
    }
}

impl From<JsonAssertion> for BodyAssertion {
    fn from(assertion: JsonAssertion) -> Self {
        BodyAssertion::One(assertion)
    }
}

/// Walk a dotted path through nested objects and arrays.
///
/// Returns `None` when a key is missing, an array segment is not a valid
/// index or points at a missing/null element, or the walk hits a scalar
/// before the path is consumed.
pub fn lookup<'a>(document: &'a Value, path: &str, trace: bool) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(document);
    }

    let mut cursor = document;
    for segment in path.split('.') {
        cursor = match cursor {
            Value::Object(map) => match map.get(segment) {
                Some(next) => next,
                None => {
                    if trace {
                        debug!(segment, "Key not present in object");
                    }
                    return None;
                }
            },
            Value::Array(items) => {
                let Some(index) = array_index(segment) else {
                    if trace {
                        debug!(segment, "Array segment is not an index");
                    }
                    return None;
                };
                match items.get(index) {
                    Some(Value::Null) | None => {
                        if trace {
                            debug!(index, len = items.len(), "No element at index");
                        }
                        return None;
                    }
                    Some(next) => next,
                }
            }
            _ => {
                if trace {
                    debug!(segment, "Cannot descend into a scalar");
                }
                return None;
            }
        };
    }

    Some(cursor)
}

/// A plain decimal index: ASCII digits only, no sign.
fn array_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[derive(Debug, PartialEq, Eq)]
enum Kind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

fn kind(value: &Value) -> Kind {
    match value {
        Value::Null => Kind::Null,
        Value::Bool(_) => Kind::Bool,
        Value::Number(n) if n.is_f64() => Kind::Float,
        Value::Number(_) => Kind::Integer,
        Value::String(_) => Kind::String,
        Value::Array(_) => Kind::Array,
        Value::Object(_) => Kind::Object,
    }
}

/// Compare a found value with the expected one.
///
/// Substring match for strings, typed equality for everything else.
pub fn value_matches(found: &Value, expected: &Value) -> bool {
    match (found, expected) {
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        (Value::String(_), _) => false,
        _ => kind(found) == kind(expected) && found == expected,
    }
}
