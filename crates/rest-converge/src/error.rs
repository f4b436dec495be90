//! Error taxonomy for REST queries.
//!
//! Request-shape and configuration errors are raised before any I/O happens.
//! A subset of the errors raised after a response arrived is *suppressible*:
//! a query in no-raise mode (guard mode) turns those into a `false` verdict
//! instead of propagating them. See [`RestError::is_suppressible`].

use crate::request::Method;

pub type Result<T> = std::result::Result<T, RestError>;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("Method for {0} is not supported (expected GET, PUT, POST, PATCH or DELETE)")]
    InvalidMethod(String),

    #[error("No document given for {method} {url}")]
    MissingBody { method: Method, url: String },

    #[error("Document should not be given for {method} {url}")]
    UnexpectedBody { method: Method, url: String },

    #[error("curl of {url} ({method}) failed: {stderr}, exit status {}", exit_status(.status))]
    TransportFailure {
        method: Method,
        url: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Cannot decode document from {method} {url} as {charset}")]
    Encoding {
        method: Method,
        url: String,
        charset: String,
    },

    #[error("JSON error in response document from {method} {url}")]
    InvalidJson {
        method: Method,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("REST query ({method} {url}) failed with {status_line}")]
    Acceptability {
        method: Method,
        url: String,
        status_line: String,
    },

    #[error("Returned document from {method} {url} is not json so ok_json cannot be checked")]
    NotJson { method: Method, url: String },

    #[error("REST query ({method} {url}) was not accepted: {status_line}")]
    NotAccepted {
        method: Method,
        url: String,
        status_line: String,
    },

    #[error("ok_codes contains {rule} which cannot be used: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Invalid ok_json assertion: {0}")]
    InvalidAssertion(String),

    #[error("Parameter error in {guard}: {reason}")]
    GuardConfig { guard: &'static str, reason: String },
}

fn exit_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "unknown".to_string(),
    }
}

impl RestError {
    /// Whether no-raise mode converts this error into a `false` verdict.
    ///
    /// Configuration errors, transport failures and undecodable JSON are
    /// never suppressed: a guard hitting them cannot produce a meaningful
    /// boolean.
    pub fn is_suppressible(&self) -> bool {
        matches!(
            self,
            RestError::Acceptability { .. } | RestError::NotJson { .. } | RestError::Encoding { .. }
        )
    }

    /// Whether the error was raised before any request left the process.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RestError::InvalidMethod(_)
                | RestError::MissingBody { .. }
                | RestError::UnexpectedBody { .. }
                | RestError::InvalidRule { .. }
                | RestError::InvalidAssertion(_)
                | RestError::GuardConfig { .. }
        )
    }
}
