//! Declared resource properties.
//!
//! [`ResourceConfig`] is the immutable snapshot of everything a `rest`
//! resource declares. Unset properties take the documented defaults, so a
//! config file only needs the properties it changes:
//!
//! ```yaml
//! url: http://localhost:8080/
//! ok_codes: [200, "30[12]"]
//! only_if_REST:
//!   url: http://localhost:8080/user/santaclaus
//!   ok_codes: 404
//! ```

mod guard;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::predicate::{BodyAssertion, OkCodes};
use crate::request::{Method, QueryParams};

pub use guard::{GuardKind, GuardParams};

/// Content type sent with PUT/POST/PATCH documents unless overridden.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    /// Endpoint to call. Empty means "use the resource name".
    #[serde(default)]
    pub url: String,

    /// `username:password` for basic auth. Empty means none.
    #[serde(default)]
    pub basicauth: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Document sent with PUT/POST/PATCH.
    #[serde(default)]
    pub document: String,

    /// Custom CA bundle for HTTPS verification.
    #[serde(default)]
    pub ca: String,

    /// Skip HTTPS certificate verification. Wins over `ca`.
    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub ok_codes: OkCodes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok_json: Option<BodyAssertion>,

    // Accepted for compatibility; not consulted when judging responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok_string: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_string: Option<Value>,

    /// Guard parameter set; decoded into [`GuardParams`] when evaluated.
    #[serde(
        default,
        rename = "only_if_REST",
        alias = "only_if_rest",
        skip_serializing_if = "Option::is_none"
    )]
    pub only_if_rest: Option<Value>,

    #[serde(
        default,
        rename = "not_if_REST",
        alias = "not_if_rest",
        skip_serializing_if = "Option::is_none"
    )]
    pub not_if_rest: Option<Value>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            basicauth: String::new(),
            content_type: default_content_type(),
            document: String::new(),
            ca: String::new(),
            insecure: false,
            ok_codes: OkCodes::default(),
            ok_json: None,
            fail_json: None,
            ok_string: None,
            fail_string: None,
            only_if_rest: None,
            not_if_rest: None,
        }
    }
}

impl ResourceConfig {
    /// Load from a YAML or JSON file (by extension; YAML otherwise).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
        .with_context(|| format!("invalid resource config in {}", path.display()))?;

        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, anyhow::Error> {
        let config: ResourceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, anyhow::Error> {
        let config: ResourceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can never produce a verdict.
    ///
    /// Regex patterns are deliberately not compiled here: a broken pattern
    /// only fails when an evaluation reaches it.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.ok_codes.to_rules()?;

        if !self.insecure && !self.ca.is_empty() && !Path::new(&self.ca).exists() {
            tracing::warn!(ca = %self.ca, "Custom CA bundle does not exist");
        }

        for kind in [GuardKind::OnlyIf, GuardKind::NotIf] {
            if let Some(raw) = self.guard(kind) {
                GuardParams::from_value(kind, raw)?;
            }
        }

        Ok(())
    }

    /// The raw parameter set of a guard, if declared.
    pub fn guard(&self, kind: GuardKind) -> Option<&Value> {
        match kind {
            GuardKind::OnlyIf => self.only_if_rest.as_ref(),
            GuardKind::NotIf => self.not_if_rest.as_ref(),
        }
        .filter(|value| !value.is_null())
    }

    /// Query parameters for `method` against `url`, defaulted from this
    /// config.
    pub fn query_params(&self, method: Method, url: &str) -> QueryParams {
        QueryParams {
            method: method.to_string(),
            url: url.to_string(),
            basicauth: self.basicauth.clone(),
            content_type: self.content_type.clone(),
            document: Some(self.document.clone()),
            ca: self.ca.clone(),
            insecure: self.insecure,
            ok_codes: self.ok_codes.clone(),
            ok_json: self.ok_json.clone(),
            fail_json: self.fail_json.clone(),
            ok_string: self.ok_string.clone(),
            fail_string: self.fail_string.clone(),
            no_raise: false,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{JsonAssertion, OkCode};
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResourceConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, ResourceConfig::default());
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.ok_codes, OkCodes::One(OkCode::pattern("20[012]")));
        assert!(config.guard(GuardKind::OnlyIf).is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
url: http://localhost:8080/
basicauth: "admin:secret"
ok_codes: [404, "20[012"]
ok_json:
  result.value: true
only_if_REST:
  url: http://localhost:8080/404
  ok_codes: 404
not_if_REST:
  url: http://localhost:8080/true.json
  ok_json: { "result": true }
"#;
        let config = ResourceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.url, "http://localhost:8080/");
        assert_eq!(config.basicauth, "admin:secret");
        assert_eq!(
            config.ok_codes,
            OkCodes::Many(vec![OkCode::Code(404), OkCode::pattern("20[012")])
        );
        assert_eq!(
            config.ok_json,
            Some(JsonAssertion::new("result.value", true).into())
        );
        assert_eq!(
            config.guard(GuardKind::OnlyIf),
            Some(&json!({"url": "http://localhost:8080/404", "ok_codes": 404}))
        );
        assert!(config.guard(GuardKind::NotIf).is_some());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "url": "https://api.example.com/users",
            "document": "{\"name\": \"santa\"}",
            "insecure": true,
            "only_if_rest": { "url": "https://api.example.com/users/santa", "ok_codes": 404 }
        }"#;
        let config = ResourceConfig::from_json_str(json).unwrap();
        assert!(config.insecure);
        assert_eq!(config.document, r#"{"name": "santa"}"#);
        assert!(config.guard(GuardKind::OnlyIf).is_some());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(ResourceConfig::from_yaml_str("ok_codes: []").is_err());
        assert!(ResourceConfig::from_yaml_str("ok_codes: [true]").is_err());
        assert!(ResourceConfig::from_yaml_str("ok_json: { a: 1, b: 2 }").is_err());
        assert!(ResourceConfig::from_yaml_str("unknown_property: 1").is_err());

        let err = ResourceConfig::from_yaml_str("only_if_REST: { uri: http://typo/ }").unwrap_err();
        assert!(err.to_string().contains("only_if_REST"));
    }

    #[test]
    fn test_malformed_pattern_passes_validation() {
        let config = ResourceConfig::from_yaml_str(r#"ok_codes: "20[012""#).unwrap();
        assert_eq!(config.ok_codes, OkCodes::One(OkCode::pattern("20[012")));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "url: http://localhost:8080/\nok_codes: 204").unwrap();
        let config = ResourceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.ok_codes, OkCodes::One(OkCode::Code(204)));

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"url": "http://localhost:8080/", "ok_codes": [200, 201]}}"#).unwrap();
        let config = ResourceConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.ok_codes,
            OkCodes::Many(vec![OkCode::Code(200), OkCode::Code(201)])
        );

        assert!(ResourceConfig::from_file("/nonexistent/resource.yaml").is_err());
    }

    #[test]
    fn test_query_params_inherit_defaults() {
        let config = ResourceConfig {
            basicauth: "u:p".to_string(),
            insecure: true,
            ..Default::default()
        };
        let params = config.query_params(Method::Delete, "http://localhost/item/1");
        assert_eq!(params.method, "DELETE");
        assert_eq!(params.url, "http://localhost/item/1");
        assert_eq!(params.basicauth, "u:p");
        assert!(params.insecure);
        assert!(!params.no_raise);
    }
}
