//! `only_if_REST` / `not_if_REST` evaluation.
//!
//! Guards run in no-raise mode: a rejected response is just `false`. The
//! `only_if` guard runs first; when it rejects, `not_if` is never sent.

use std::fmt;

use tracing::info;

use crate::config::{GuardKind, GuardParams, ResourceConfig};
use crate::error::Result;
use crate::query::run_query;
use crate::request::Query;
use crate::transport::Transport;

/// Why a resource is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `only_if_REST` query was not accepted.
    OnlyIfFailed { url: String },
    /// `not_if_REST` query was accepted.
    NotIfPassed { url: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OnlyIfFailed { url } => write!(f, "only_if_REST query on {url} failed"),
            SkipReason::NotIfPassed { url } => write!(f, "not_if_REST query on {url} succeeded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Converge,
    Skip(SkipReason),
}

impl Decision {
    pub fn should_converge(&self) -> bool {
        matches!(self, Decision::Converge)
    }
}

/// Build the no-raise query for one guard, if the resource declares it.
pub fn guard_query(
    kind: GuardKind,
    config: &ResourceConfig,
    default_url: &str,
) -> Result<Option<Query>> {
    let Some(raw) = config.guard(kind) else {
        return Ok(None);
    };
    let params = GuardParams::from_value(kind, raw)?.into_query_params(config, default_url);
    Query::build(params).map(Some)
}

/// Decide whether the resource should converge.
///
/// Both guard queries are built before anything is sent, so a malformed
/// `not_if_REST` fails even when `only_if_REST` would have short-circuited.
pub fn evaluate_guards<T: Transport + ?Sized>(
    config: &ResourceConfig,
    default_url: &str,
    transport: &T,
) -> Result<Decision> {
    let only_if = guard_query(GuardKind::OnlyIf, config, default_url)?;
    let not_if = guard_query(GuardKind::NotIf, config, default_url)?;

    if let Some(query) = only_if {
        let verdict = run_query(transport, &query)?;
        if !verdict.accepted {
            let reason = SkipReason::OnlyIfFailed {
                url: query.url().to_string(),
            };
            info!(guard = %GuardKind::OnlyIf, %reason, "Guard prevents convergence");
            return Ok(Decision::Skip(reason));
        }
    }

    if let Some(query) = not_if {
        let verdict = run_query(transport, &query)?;
        if verdict.accepted {
            let reason = SkipReason::NotIfPassed {
                url: query.url().to_string(),
            };
            info!(guard = %GuardKind::NotIf, %reason, "Guard prevents convergence");
            return Ok(Decision::Skip(reason));
        }
    }

    Ok(Decision::Converge)
}
