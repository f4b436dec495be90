//! Convergence of one declared REST action.

use std::fmt;

use tracing::{debug, info};

use crate::config::ResourceConfig;
use crate::error::{RestError, Result};
use crate::guard::{evaluate_guards, Decision, SkipReason};
use crate::query::run_query;
use crate::request::{Method, Query};
use crate::transport::{CurlTransport, Transport};

/// A declared resource: a name, the action to perform and its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResource {
    pub name: String,
    pub action: Method,
    pub config: ResourceConfig,
}

impl RestResource {
    pub fn new(name: impl Into<String>, action: Method, config: ResourceConfig) -> Self {
        Self {
            name: name.into(),
            action,
            config,
        }
    }

    /// Target URL; the resource name when no `url` is declared.
    pub fn url(&self) -> &str {
        if self.config.url.is_empty() {
            &self.name
        } else {
            &self.config.url
        }
    }

    /// The primary query, in raising mode.
    pub fn primary_query(&self) -> Result<Query> {
        Query::build(self.config.query_params(self.action, self.url()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A guard vetoed the action; nothing was sent.
    UpToDate { reason: SkipReason },
    /// Dry run: guards allowed the action but it was not sent.
    WouldConverge { method: Method, url: String },
    Converged {
        method: Method,
        url: String,
        status_line: String,
    },
}

impl Outcome {
    /// Whether the action was (or in a dry run, would have been) performed.
    pub fn changed(&self) -> bool {
        !matches!(self, Outcome::UpToDate { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::UpToDate { reason } => write!(f, "up to date ({reason})"),
            Outcome::WouldConverge { method, url } => write!(f, "would {method} {url}"),
            Outcome::Converged {
                method,
                url,
                status_line,
            } => write!(f, "{method} {url}: {status_line}"),
        }
    }
}

/// Drives guards and the primary query through a [`Transport`].
#[derive(Debug, Clone)]
pub struct Converger<T = CurlTransport> {
    transport: T,
    dry_run: bool,
}

impl Converger<CurlTransport> {
    pub fn new() -> Self {
        Self::with_transport(CurlTransport::new())
    }
}

impl Default for Converger<CurlTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Converger<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            dry_run: false,
        }
    }

    /// Evaluate guards only; never send the primary request.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Bring `resource` to its declared state.
    ///
    /// The primary query is only built once the guards allow it; a vetoed
    /// resource is up to date even when its own request is malformed.
    pub fn converge(&self, resource: &RestResource) -> Result<Outcome> {
        if let Decision::Skip(reason) =
            evaluate_guards(&resource.config, resource.url(), &self.transport)?
        {
            info!(resource = %resource.name, %reason, "Resource is up to date");
            return Ok(Outcome::UpToDate { reason });
        }

        let query = resource.primary_query()?;

        if self.dry_run {
            info!(resource = %resource.name, query = %query, "Would send REST query");
            return Ok(Outcome::WouldConverge {
                method: query.method(),
                url: query.url().to_string(),
            });
        }

        debug!(resource = %resource.name, query = %query, "Sending REST query");
        let verdict = run_query(&self.transport, &query)?;
        let status_line = verdict.status_line.unwrap_or_default();
        if !verdict.accepted {
            return Err(RestError::NotAccepted {
                method: query.method(),
                url: query.url().to_string(),
                status_line,
            });
        }

        info!(resource = %resource.name, query = %query, %status_line, "Converged");
        Ok(Outcome::Converged {
            method: query.method(),
            url: query.url().to_string(),
            status_line,
        })
    }
}
