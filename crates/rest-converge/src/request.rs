//! Request building.
//!
//! Turns logical query parameters (already merged over resource defaults)
//! into an immutable [`Query`]: the executable [`RequestSpec`] plus the
//! rules its response will be judged by. Building is pure; all request-shape
//! errors are raised here, before any process is spawned.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RestError, Result};
use crate::predicate::{BodyAssertion, OkCode, OkCodes};

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    #[default]
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Patch,
        Method::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// PUT, POST and PATCH send a document; GET and DELETE must not.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Put | Method::Post | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RestError::InvalidMethod(s.to_string()))
    }
}

impl TryFrom<String> for Method {
    type Error = RestError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

/// URL scheme of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn of(url: &str) -> Self {
        let is_https = url
            .get(..8)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"));
        if is_https {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }
}

/// Certificate verification policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Verify against the system trust store.
    Verify,
    /// Skip certificate verification.
    Insecure,
    /// Verify against a custom CA bundle.
    CustomCa(String),
}

impl TlsMode {
    /// `insecure` wins when both are set.
    pub fn from_options(insecure: bool, ca: &str) -> Self {
        if insecure {
            TlsMode::Insecure
        } else if !ca.is_empty() {
            TlsMode::CustomCa(ca.to_string())
        } else {
            TlsMode::Verify
        }
    }
}

/// Everything the transport needs to perform one HTTP round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub scheme: Scheme,
    /// `user:password` for basic auth.
    pub credentials: Option<String>,
    pub tls: TlsMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestSpec {
    /// Arguments for `curl`. The body, if any, is read from stdin (`@-`).
    pub fn curl_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-i".into(),
            "--silent".into(),
            "--tr-encoding".into(),
            "-X".into(),
            self.method.as_str().into(),
        ];

        if let Some(credentials) = &self.credentials {
            args.extend(["-u".into(), credentials.clone(), "--basic".into()]);
        }

        match &self.tls {
            TlsMode::Verify => {}
            TlsMode::Insecure => args.push("-k".into()),
            TlsMode::CustomCa(ca) => args.extend(["--cacert".into(), ca.clone()]),
        }

        for (name, value) in &self.headers {
            args.extend(["-H".into(), format!("{name}: {value}")]);
        }

        if self.body.is_some() {
            args.extend(["--data-binary".into(), "@-".into()]);
        }

        args.push(self.url.clone());
        args
    }
}

/// Logical parameters of one query, after defaults were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub method: String,
    pub url: String,
    pub basicauth: String,
    pub content_type: String,
    pub document: Option<String>,
    pub ca: String,
    pub insecure: bool,
    pub ok_codes: OkCodes,
    pub ok_json: Option<BodyAssertion>,
    pub fail_json: Option<Value>,
    pub ok_string: Option<Value>,
    pub fail_string: Option<Value>,
    pub no_raise: bool,
    pub debug: bool,
}

impl QueryParams {
    /// A GET with resource defaults and no body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get.to_string(),
            url: url.into(),
            basicauth: String::new(),
            content_type: crate::config::DEFAULT_CONTENT_TYPE.to_string(),
            document: None,
            ca: String::new(),
            insecure: false,
            ok_codes: OkCodes::default(),
            ok_json: None,
            fail_json: None,
            ok_string: None,
            fail_string: None,
            no_raise: false,
            debug: false,
        }
    }
}

/// An immutable, fully validated query.
///
/// `fail_json`, `ok_string` and `fail_string` are carried for completeness
/// but do not take part in the acceptability verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub request: RequestSpec,
    pub ok_codes: Vec<OkCode>,
    pub ok_json: Option<BodyAssertion>,
    pub fail_json: Option<Value>,
    pub ok_string: Option<Value>,
    pub fail_string: Option<Value>,
    pub no_raise: bool,
    pub debug: bool,
}

impl Query {
    /// Validate the parameters and build the query.
    pub fn build(params: QueryParams) -> Result<Self> {
        let method: Method = params.method.parse()?;
        let url = params.url;

        let document = params.document.filter(|d| !d.is_empty());
        let (headers, body) = match (method.carries_body(), document) {
            (true, Some(document)) => (
                vec![("Content-Type".to_string(), params.content_type)],
                Some(document.into_bytes()),
            ),
            (true, None) => return Err(RestError::MissingBody { method, url }),
            (false, Some(_)) => return Err(RestError::UnexpectedBody { method, url }),
            (false, None) => (Vec::new(), None),
        };

        let credentials = Some(params.basicauth).filter(|c| !c.is_empty());
        let ok_codes = params.ok_codes.to_rules()?;

        Ok(Query {
            request: RequestSpec {
                method,
                scheme: Scheme::of(&url),
                url,
                credentials,
                tls: TlsMode::from_options(params.insecure, &params.ca),
                headers,
                body,
            },
            ok_codes,
            ok_json: params.ok_json,
            fail_json: params.fail_json,
            ok_string: params.ok_string,
            fail_string: params.fail_string,
            no_raise: params.no_raise,
            debug: params.debug,
        })
    }

    pub fn method(&self) -> Method {
        self.request.method
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.request.method, self.request.url)
    }
}
