//! HTTP status-code rules (`ok_codes`).
//!
//! A rule is either a literal integer compared numerically, or a string
//! interpreted as an unanchored regular expression over the status-code
//! text. Rules are OR-combined and evaluated in order.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{RestError, Result};

/// Default rule set: matches 200, 201 and 202.
pub const DEFAULT_OK_CODES: &str = "20[012]";

/// A single `ok_codes` rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum OkCode {
    /// Literal status code: `404`
    Code(i64),
    /// Regex over the status-code text: `"20[012]"`
    Pattern(String),
}

impl OkCode {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        OkCode::Pattern(pattern.into())
    }

    /// Check a status-code field against this rule.
    ///
    /// Patterns are compiled on use, so a broken pattern only raises once an
    /// evaluation actually reaches it.
    pub fn matches(&self, code: &str) -> Result<bool> {
        match self {
            OkCode::Code(expected) => Ok(code.trim().parse::<i64>().ok() == Some(*expected)),
            OkCode::Pattern(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| RestError::InvalidRule {
                    rule: format!("{pattern:?}"),
                    reason: e.to_string(),
                })?;
                Ok(regex.is_match(code))
            }
        }
    }
}

impl TryFrom<Value> for OkCode {
    type Error = RestError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(pattern) => Ok(OkCode::Pattern(pattern)),
            Value::Number(ref n) => n.as_i64().map(OkCode::Code).ok_or_else(|| {
                RestError::InvalidRule {
                    rule: value.to_string(),
                    reason: "status codes must be integers".to_string(),
                }
            }),
            other => Err(RestError::InvalidRule {
                rule: other.to_string(),
                reason: "expected an integer or a regular expression string".to_string(),
            }),
        }
    }
}

impl From<OkCode> for Value {
    fn from(code: OkCode) -> Self {
        match code {
            OkCode::Code(n) => Value::from(n),
            OkCode::Pattern(p) => Value::String(p),
        }
    }
}

impl From<i64> for OkCode {
    fn from(code: i64) -> Self {
        OkCode::Code(code)
    }
}

impl From<&str> for OkCode {
    fn from(pattern: &str) -> Self {
        OkCode::Pattern(pattern.to_string())
    }
}

/// The `ok_codes` property: a single rule or a list of rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum OkCodes {
    One(OkCode),
    Many(Vec<OkCode>),
}

impl Default for OkCodes {
    fn default() -> Self {
        OkCodes::One(OkCode::pattern(DEFAULT_OK_CODES))
    }
}

impl OkCodes {
    /// Normalize into a non-empty rule list.
    pub fn to_rules(&self) -> Result<Vec<OkCode>> {
        match self {
            OkCodes::One(code) => Ok(vec![code.clone()]),
            OkCodes::Many(codes) if codes.is_empty() => Err(RestError::InvalidRule {
                rule: "[]".to_string(),
                reason: "at least one rule is required (use \".*\" to accept anything)"
                    .to_string(),
            }),
            OkCodes::Many(codes) => Ok(codes.clone()),
        }
    }
}

impl TryFrom<Value> for OkCodes {
    type Error = RestError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(OkCode::try_from)
                .collect::<Result<Vec<_>>>()
                .map(OkCodes::Many),
            single => OkCode::try_from(single).map(OkCodes::One),
        }
    }
}

impl From<OkCodes> for Value {
    fn from(codes: OkCodes) -> Self {
        match codes {
            OkCodes::One(code) => code.into(),
            OkCodes::Many(codes) => Value::Array(codes.into_iter().map(Value::from).collect()),
        }
    }
}

impl From<OkCode> for OkCodes {
    fn from(code: OkCode) -> Self {
        OkCodes::One(code)
    }
}

impl From<Vec<OkCode>> for OkCodes {
    fn from(codes: Vec<OkCode>) -> Self {
        OkCodes::Many(codes)
    }
}

/// Extract the status-code field (second whitespace-separated field) from
/// a status line such as `HTTP/1.1 404 Not Found`.
pub fn status_code(status_line: &str) -> &str {
    status_line.split_whitespace().nth(1).unwrap_or("")
}

/// Check whether a status line satisfies any of the rules.
///
/// Returns on the first matching rule. An invalid pattern raises
/// `InvalidRule` as soon as it is reached.
pub fn status_matches(status_line: &str, rules: &[OkCode], trace: bool) -> Result<bool> {
    let code = status_code(status_line);

    for rule in rules {
        if trace {
            debug!(code, ?rule, "Comparing status code");
        }
        if rule.matches(code)? {
            if trace {
                debug!(code, ?rule, "Status code is ok");
            }
            return Ok(true);
        }
    }

    if trace {
        debug!(code, "Status code did not match any ok_codes rule");
    }
    Ok(false)
}
