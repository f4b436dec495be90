//! Acceptability verdict for one query.
//!
//! Combines the status-code rules with the optional `ok_json` assertion.
//! `fail_json`, `ok_string` and `fail_string` are not consulted.

use tracing::debug;

use crate::error::{RestError, Result};
use crate::request::Query;
use crate::response::Response;

use super::status::status_matches;

/// Judge a response, always raising on failure.
///
/// - status not accepted: `Acceptability`
/// - `ok_json` configured but body not JSON: `NotJson`
/// - otherwise the `ok_json` result, or `true` when none is configured
pub fn check(query: &Query, response: &Response) -> Result<bool> {
    if !status_matches(&response.status_line, &query.ok_codes, query.debug)? {
        return Err(RestError::Acceptability {
            method: query.method(),
            url: query.url().to_string(),
            status_line: response.status_line.clone(),
        });
    }

    let Some(assertion) = &query.ok_json else {
        return Ok(true);
    };

    let Some(document) = response.json() else {
        return Err(RestError::NotJson {
            method: query.method(),
            url: query.url().to_string(),
        });
    };

    let matched = assertion.matches(document, query.debug);
    if query.debug {
        debug!(query = %query, matched, "Evaluated ok_json");
    }
    Ok(matched)
}

/// Judge a response, honouring the query's no-raise mode.
pub fn evaluate(query: &Query, response: &Response) -> Result<bool> {
    suppress(query, check(query, response))
}

/// In no-raise mode, turn suppressible errors into `false`.
pub fn suppress(query: &Query, result: Result<bool>) -> Result<bool> {
    match result {
        Err(e) if query.no_raise && e.is_suppressible() => {
            if query.debug {
                debug!(query = %query, error = %e, "Suppressed failure in no-raise mode");
            }
            Ok(false)
        }
        other => other,
    }
}
