//! Response parsing.
//!
//! Interprets a [`RawResponse`]: corrects the body's character encoding from
//! the declared `charset`, and decodes JSON bodies when the content type
//! says so.

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{RestError, Result};
use crate::predicate::status_code;
use crate::request::Method;
use crate::transport::RawResponse;

static CONTENT_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^content-type:.*[;\s]\s*charset=([^\s;]*)")
        .expect("charset pattern is valid")
});

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
}

/// A parsed HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status_line: String,
    pub headers: Vec<String>,
    pub body: Body,
}

impl Response {
    /// Whether the body was decoded as JSON.
    pub fn is_json(&self) -> bool {
        matches!(self.body, Body::Json(_))
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            Body::Json(_) => None,
        }
    }

    pub fn status_code(&self) -> &str {
        status_code(&self.status_line)
    }
}

/// The charset declared by the last `Content-Type` header carrying one.
pub fn declared_charset(headers: &[String]) -> Option<&str> {
    headers
        .iter()
        .filter_map(|header| CONTENT_CHARSET.captures(header))
        .filter_map(|captures| captures.get(1))
        .map(|label| label.as_str().trim_matches(|c: char| c == '"' || c == '\'' || c == ';'))
        .last()
}

/// Whether any `Content-Type` header announces JSON.
pub fn declares_json(headers: &[String]) -> bool {
    headers.iter().any(|header| {
        header.split_once(':').is_some_and(|(name, value)| {
            name.trim().eq_ignore_ascii_case("content-type")
                && value.to_ascii_lowercase().contains("application/json")
        })
    })
}

/// Decode the body into UTF-8 text.
///
/// Without a declared charset, or with UTF-8 declared, the bytes are taken as
/// UTF-8 with invalid sequences replaced. Any other charset is transcoded
/// strictly.
pub fn decode_body(
    body: &[u8],
    charset: Option<&str>,
    method: Method,
    url: &str,
) -> Result<String> {
    let Some(label) = charset else {
        return Ok(String::from_utf8_lossy(body).into_owned());
    };

    let encoding_error = || RestError::Encoding {
        method,
        url: url.to_string(),
        charset: label.to_string(),
    };

    let encoding = Encoding::for_label(label.as_bytes()).ok_or_else(encoding_error)?;
    if encoding == UTF_8 {
        return Ok(String::from_utf8_lossy(body).into_owned());
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(encoding_error)
}

/// Parse a raw response.
///
/// `InvalidJson` is raised whenever a body announced as JSON does not parse;
/// a guard must not silently judge an undecoded body.
pub fn parse_response(
    raw: RawResponse,
    method: Method,
    url: &str,
    trace: bool,
) -> Result<Response> {
    let RawResponse {
        status_line,
        headers,
        body,
    } = raw;

    let text = decode_body(&body, declared_charset(&headers), method, url)?;
    if trace {
        debug!(url, status_line = %status_line, document = %text, "Got document");
    }

    let body = if declares_json(&headers) {
        if trace {
            debug!(url, "Returned document is JSON, decoding");
        }
        let value = serde_json::from_str(&text).map_err(|source| RestError::InvalidJson {
            method,
            url: url.to_string(),
            source,
        })?;
        Body::Json(value)
    } else {
        Body::Text(text)
    };

    Ok(Response {
        status_line,
        headers,
        body,
    })
}
