//! One query, end to end: execute, parse, evaluate.

use tracing::debug;

use crate::error::Result;
use crate::predicate::{check, suppress};
use crate::request::Query;
use crate::response::parse_response;
use crate::transport::Transport;

/// Outcome of running one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    /// Status line of the response, when one was received and parsed.
    pub status_line: Option<String>,
}

impl Verdict {
    fn rejected() -> Self {
        Self {
            accepted: false,
            status_line: None,
        }
    }
}

/// Run `query` through `transport` and judge the response.
///
/// In no-raise mode every suppressible failure, including an undecodable
/// body, turns into a rejected verdict. Transport failures, broken JSON and
/// configuration errors always propagate.
pub fn run_query<T: Transport + ?Sized>(transport: &T, query: &Query) -> Result<Verdict> {
    if query.debug {
        debug!(query = %query, "Running REST query");
    }

    let raw = transport.execute(&query.request)?;
    let response = match parse_response(raw, query.method(), query.url(), query.debug) {
        Ok(response) => response,
        Err(e) => {
            return suppress(query, Err(e)).map(|_| Verdict::rejected());
        }
    };

    let accepted = suppress(query, check(query, &response))?;
    Ok(Verdict {
        accepted,
        status_line: Some(response.status_line),
    })
}
