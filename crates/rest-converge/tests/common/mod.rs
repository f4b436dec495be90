//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use rest_converge::{Method, RawResponse, RequestSpec, Result, Transport};

pub const BASE: &str = "http://localhost:8080";

/// In-memory stand-in for the fixture web server.
///
/// Serves a fixed set of documents by URL and answers everything else with
/// 404. Every request is recorded so tests can assert on call counts.
pub struct FakeServer {
    routes: HashMap<String, (u16, &'static str, String)>,
    requests: RefCell<Vec<RequestSpec>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// The documents served by the fixture site.
    pub fn fixtures() -> Self {
        Self::new()
            .route("/", 200, "text/html", "")
            .route("/200", 200, "text/html", "")
            .route("/403", 403, "text/html", "")
            .route("/true.json", 200, "application/json", r#"{ "result": true }"#)
            .route(
                "/true-value.json",
                200,
                "application/json",
                r#"{ "result": { "value": true } }"#,
            )
            .route(
                "/true-array.json",
                200,
                "application/json",
                r#"{ "result": [true, false, false, true ] }"#,
            )
            .route("/false.json", 200, "application/json", r#"{ "result": false }"#)
            .route(
                "/false-value.json",
                200,
                "application/json",
                r#"{ "result": { "value": false } }"#,
            )
            .route("/string.json", 200, "application/json", r#"{ "result": "ok-string" }"#)
            .route("/42.json", 200, "application/json", r#"{ "result": 42 }"#)
            .route("/ERROR.txt", 200, "text/plain", "There is a ERROR here")
            .route("/foo;bar.txt", 200, "text/plain", "Does ; trip you up?")
            .route("/user", 201, "application/json", r#"{ "created": true }"#)
    }

    pub fn route(mut self, path: &str, status: u16, content_type: &'static str, body: &str) -> Self {
        self.routes
            .insert(format!("{BASE}{path}"), (status, content_type, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RequestSpec> {
        self.requests.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Method and URL of each request, in order.
    pub fn log(&self) -> Vec<(Method, String)> {
        self.requests
            .borrow()
            .iter()
            .map(|r| (r.method, r.url.clone()))
            .collect()
    }
}

impl Transport for FakeServer {
    fn execute(&self, request: &RequestSpec) -> Result<RawResponse> {
        self.requests.borrow_mut().push(request.clone());

        let (status, content_type, body) = self
            .routes
            .get(&request.url)
            .cloned()
            .unwrap_or((404, "text/html", "<h1>404 Not Found</h1>".to_string()));
        let reason = match status {
            200 => "OK",
            201 => "Created",
            403 => "Forbidden",
            404 => "Not Found",
            _ => "Whatever",
        };

        Ok(RawResponse {
            status_line: format!("HTTP/1.1 {status} {reason}"),
            headers: vec![
                "Server: nginx".to_string(),
                format!("Content-Type: {content_type}"),
            ],
            body: body.into_bytes(),
        })
    }
}

pub fn url(path: &str) -> String {
    format!("{BASE}{path}")
}
