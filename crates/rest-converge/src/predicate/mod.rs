//! Response acceptability rules.
//!
//! # Module Structure
//!
//! - `status` - `ok_codes` rules (literal codes and regex patterns)
//! - `json_path` - dotted-path `ok_json` assertions over JSON bodies
//! - `acceptability` - combined verdict with no-raise handling

pub mod acceptability;
mod json_path;
mod status;

pub use acceptability::{check, evaluate, suppress};
pub use json_path::{lookup, value_matches, BodyAssertion, JsonAssertion};
pub use status::{status_code, status_matches, OkCode, OkCodes, DEFAULT_OK_CODES};
