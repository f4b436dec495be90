//! `only_if_REST` / `not_if_REST` parameter sets.
//!
//! A guard declares only the properties it overrides; everything else is
//! inherited from the resource. The method defaults to GET.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use super::ResourceConfig;
use crate::error::{RestError, Result};
use crate::predicate::{BodyAssertion, OkCodes};
use crate::request::{Method, QueryParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    OnlyIf,
    NotIf,
}

impl GuardKind {
    /// Property name as declared on the resource.
    pub fn property(&self) -> &'static str {
        match self {
            GuardKind::OnlyIf => "only_if_REST",
            GuardKind::NotIf => "not_if_REST",
        }
    }
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.property())
    }
}

/// Overrides declared by one guard.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardParams {
    #[serde(default, alias = "action")]
    pub method: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub basicauth: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub ca: Option<String>,
    #[serde(default)]
    pub insecure: Option<bool>,
    #[serde(default)]
    pub ok_codes: Option<OkCodes>,
    #[serde(default)]
    pub ok_json: Option<BodyAssertion>,
    #[serde(default)]
    pub fail_json: Option<Value>,
    #[serde(default)]
    pub ok_string: Option<Value>,
    #[serde(default)]
    pub fail_string: Option<Value>,
    #[serde(default)]
    pub debug: Option<bool>,
}

impl GuardParams {
    /// Decode a raw parameter set. Unknown keys and mistyped values are
    /// `GuardConfig` errors.
    pub fn from_value(kind: GuardKind, raw: &Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(RestError::GuardConfig {
                guard: kind.property(),
                reason: format!("expected a mapping of query properties, got {raw}"),
            });
        }
        GuardParams::deserialize(raw).map_err(|e| RestError::GuardConfig {
            guard: kind.property(),
            reason: e.to_string(),
        })
    }

    /// Merge over the resource's properties. The result always runs in
    /// no-raise mode.
    ///
    /// `default_url` is the resource's effective URL. The resource's
    /// document is only inherited when the guard's own method sends one, so
    /// a GET guard on a POST resource does not trip over the POST body.
    pub fn into_query_params(self, resource: &ResourceConfig, default_url: &str) -> QueryParams {
        let method = self.method.unwrap_or_else(|| Method::Get.to_string());
        let inherits_document = method
            .parse::<Method>()
            .map(|m| m.carries_body())
            .unwrap_or(false);
        let document = match self.document {
            Some(document) => Some(document),
            None if inherits_document => Some(resource.document.clone()),
            None => None,
        };

        QueryParams {
            method,
            url: self.url.unwrap_or_else(|| default_url.to_string()),
            basicauth: self.basicauth.unwrap_or_else(|| resource.basicauth.clone()),
            content_type: self
                .content_type
                .unwrap_or_else(|| resource.content_type.clone()),
            document,
            ca: self.ca.unwrap_or_else(|| resource.ca.clone()),
            insecure: self.insecure.unwrap_or(resource.insecure),
            ok_codes: self.ok_codes.unwrap_or_else(|| resource.ok_codes.clone()),
            ok_json: self.ok_json.or_else(|| resource.ok_json.clone()),
            fail_json: self.fail_json.or_else(|| resource.fail_json.clone()),
            ok_string: self.ok_string.or_else(|| resource.ok_string.clone()),
            fail_string: self.fail_string.or_else(|| resource.fail_string.clone()),
            no_raise: true,
            debug: self.debug.unwrap_or(false),
        }
    }
}
