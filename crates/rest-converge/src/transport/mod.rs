//! Request execution.
//!
//! The [`Transport`] trait is the seam between the decision logic and the
//! outside world. [`CurlTransport`] runs the real `curl` binary; tests plug
//! in scripted or in-memory transports.

mod curl;

pub use curl::CurlTransport;

use crate::error::Result;
use crate::request::RequestSpec;

/// Raw output of one HTTP round trip, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// First line of the response head, e.g. `HTTP/1.1 200 OK`.
    pub status_line: String,
    /// Remaining header lines, line terminators stripped.
    pub headers: Vec<String>,
    /// Everything after the empty line that ends the head.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Split captured head lines into status line and headers.
    pub fn from_head(mut lines: Vec<String>, body: Vec<u8>) -> Self {
        let status_line = if lines.is_empty() {
            String::new()
        } else {
            lines.remove(0)
        };
        Self {
            status_line,
            headers: lines,
            body,
        }
    }
}

/// Executes a request and returns the raw response.
///
/// Implementations report a failed round trip (as opposed to an HTTP error
/// status, which is a successful round trip) as `TransportFailure`.
pub trait Transport {
    fn execute(&self, request: &RequestSpec) -> Result<RawResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &RequestSpec) -> Result<RawResponse> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &RequestSpec) -> Result<RawResponse> {
        (**self).execute(request)
    }
}
