//! Convergence engine for idempotent REST actions.
//!
//! A [`RestResource`] declares an HTTP action against an endpoint, the rules
//! that make a response acceptable, and optional `only_if_REST` /
//! `not_if_REST` guard queries. [`Converger::converge`] evaluates the guards
//! and sends the primary request only when they allow it.
//!
//! ```no_run
//! use rest_converge::{Converger, Method, ResourceConfig, RestResource};
//!
//! let config = ResourceConfig::from_yaml_str(
//!     r#"
//! url: http://localhost:8080/user
//! document: '{"name": "santa"}'
//! not_if_REST:
//!   url: http://localhost:8080/user/santa
//! "#,
//! )?;
//! let resource = RestResource::new("create santa", Method::Post, config);
//! let outcome = Converger::new().converge(&resource)?;
//! println!("{outcome}");
//! # Ok::<(), anyhow::Error>(())
//! ```

// ===== Resource model =====
pub mod config;
pub mod converge;
pub mod error;

// ===== Query pipeline =====
pub mod guard;
pub mod predicate;
pub mod query;
pub mod request;
pub mod response;
pub mod transport;

pub use config::{GuardKind, GuardParams, ResourceConfig};
pub use converge::{Converger, Outcome, RestResource};
pub use error::{RestError, Result};
pub use guard::{evaluate_guards, Decision, SkipReason};
pub use query::{run_query, Verdict};
pub use request::{Method, Query, QueryParams, RequestSpec};
pub use response::{parse_response, Response};
pub use transport::{CurlTransport, RawResponse, Transport};
