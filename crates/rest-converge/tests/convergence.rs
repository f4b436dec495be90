//! Guard and convergence behaviour against the fixture site.

mod common;

use common::{url, FakeServer};
use rest_converge::{
    Converger, Method, Outcome, ResourceConfig, RestError, RestResource, SkipReason,
};
use serde_json::json;

fn resource(name: &str, yaml: &str) -> RestResource {
    let config = ResourceConfig::from_yaml_str(yaml).unwrap();
    RestResource::new(name, Method::Get, config)
}

fn converge(resource: &RestResource) -> (rest_converge::Result<Outcome>, FakeServer) {
    let server = FakeServer::fixtures();
    let outcome = Converger::with_transport(&server).converge(resource);
    (outcome, server)
}

#[test]
fn test_bare_resource_uses_name_as_url() {
    let resource = RestResource::new(url("/"), Method::Get, ResourceConfig::default());
    let (outcome, server) = converge(&resource);
    assert!(matches!(outcome.unwrap(), Outcome::Converged { .. }));
    assert_eq!(server.log(), vec![(Method::Get, url("/"))]);
}

#[test]
fn test_no_guards_always_converges() {
    let (outcome, server) = converge(&resource("just-do-it", "url: http://localhost:8080/"));
    assert_eq!(
        outcome.unwrap(),
        Outcome::Converged {
            method: Method::Get,
            url: url("/"),
            status_line: "HTTP/1.1 200 OK".to_string(),
        }
    );
    assert_eq!(server.calls(), 1);
}

#[test]
fn test_only_if_404_is_up_to_date() {
    let (outcome, server) = converge(&resource(
        "only-if-1-should-be-up-to-date",
        r#"
url: http://localhost:8080/
only_if_REST: { url: "http://localhost:8080/404" }
"#,
    ));
    assert_eq!(
        outcome.unwrap(),
        Outcome::UpToDate {
            reason: SkipReason::OnlyIfFailed { url: url("/404") }
        }
    );
    // The primary request was never sent.
    assert_eq!(server.log(), vec![(Method::Get, url("/404"))]);
}

#[test]
fn test_only_if_with_literal_404_converges() {
    // 404 matches before the malformed pattern is ever compiled.
    let (outcome, server) = converge(&resource(
        "only-if-2-should-converge",
        r#"
url: http://localhost:8080/
only_if_REST: { url: "http://localhost:8080/404", ok_codes: [404, "20[012"] }
"#,
    ));
    assert!(outcome.unwrap().changed());
    assert_eq!(
        server.log(),
        vec![(Method::Get, url("/404")), (Method::Get, url("/"))]
    );
}

#[test]
fn test_not_if_404_converges() {
    let (outcome, server) = converge(&resource(
        "not-if-1-should-converge",
        r#"
url: http://localhost:8080/
not_if_REST: { url: "http://localhost:8080/404" }
"#,
    ));
    assert!(matches!(outcome.unwrap(), Outcome::Converged { .. }));
    assert_eq!(server.calls(), 2);
}

#[test]
fn test_not_if_with_literal_404_is_up_to_date() {
    let (outcome, server) = converge(&resource(
        "not-if-2-should-be-up-to-date",
        r#"
url: http://localhost:8080/
not_if_REST: { url: "http://localhost:8080/404", ok_codes: [404, "20[012"] }
"#,
    ));
    assert_eq!(
        outcome.unwrap(),
        Outcome::UpToDate {
            reason: SkipReason::NotIfPassed { url: url("/404") }
        }
    );
    assert_eq!(server.calls(), 1);
}

#[test]
fn test_malformed_pattern_raises_when_reached() {
    let (outcome, _) = converge(&resource(
        "broken-pattern",
        r#"
url: http://localhost:8080/
only_if_REST: { url: "http://localhost:8080/", ok_codes: [404, "20[012"] }
"#,
    ));
    assert!(matches!(outcome.unwrap_err(), RestError::InvalidRule { .. }));
}

#[test]
fn test_url_with_semicolon() {
    let (outcome, server) = converge(&resource(
        "url-with-semicolon-any-error?",
        "url: http://localhost:8080/foo;bar.txt",
    ));
    assert!(outcome.unwrap().changed());
    assert_eq!(server.log(), vec![(Method::Get, url("/foo;bar.txt"))]);
}

#[test]
fn test_ok_json_on_primary_query() {
    for (path, assertion) in [
        ("/true.json", json!({"result": true})),
        ("/true-value.json", json!({"result.value": true})),
        ("/false.json", json!({"result": false})),
        ("/false-value.json", json!({"result.value": false})),
        ("/true-array.json", json!({"result.3": true})),
        ("/string.json", json!({"result": "ok"})),
        ("/42.json", json!({"result": 42})),
    ] {
        let config: ResourceConfig =
            serde_json::from_value(json!({"url": url(path), "ok_json": assertion})).unwrap();
        let (outcome, _) = converge(&RestResource::new(path, Method::Get, config));
        assert!(outcome.unwrap().changed(), "{path}");
    }
}

#[test]
fn test_ok_json_mismatch_on_primary_query_is_not_accepted() {
    let config: ResourceConfig = serde_json::from_value(json!({
        "url": url("/42.json"),
        "ok_json": {"result": 42.0}
    }))
    .unwrap();
    let (outcome, _) = converge(&RestResource::new("float", Method::Get, config));
    match outcome.unwrap_err() {
        RestError::NotAccepted {
            method,
            url: target,
            status_line,
        } => {
            assert_eq!(method, Method::Get);
            assert_eq!(target, url("/42.json"));
            assert_eq!(status_line, "HTTP/1.1 200 OK");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_ok_json_guards() {
    let cases = [
        ("/true.json", json!({"result": true}), true),
        ("/true-value.json", json!({"result.value": true}), true),
        ("/false.json", json!({"result": true}), false),
        ("/false-value.json", json!({"result.value": true}), false),
        // Not JSON at all: a guard sees `false` instead of an error.
        ("/ERROR.txt", json!({"result": true}), false),
        ("/true-array.json", json!({"result.4": true}), false),
    ];

    for (path, assertion, converges) in cases {
        let config: ResourceConfig = serde_json::from_value(json!({
            "url": url("/"),
            "only_if_REST": {"url": url(path), "ok_json": assertion}
        }))
        .unwrap();
        let (outcome, server) = converge(&RestResource::new(path, Method::Get, config));
        assert_eq!(outcome.unwrap().changed(), converges, "{path}");
        assert_eq!(server.calls(), if converges { 2 } else { 1 }, "{path}");
    }
}

#[test]
fn test_not_json_raises_on_primary_query() {
    let config: ResourceConfig = serde_json::from_value(json!({
        "url": url("/ERROR.txt"),
        "ok_json": {"result": true}
    }))
    .unwrap();
    let (outcome, _) = converge(&RestResource::new("text", Method::Get, config));
    let err = outcome.unwrap_err();
    assert!(matches!(err, RestError::NotJson { .. }));
    assert!(err
        .to_string()
        .contains("GET http://localhost:8080/ERROR.txt"));
}

#[test]
fn test_rejected_status_on_primary_query_carries_context() {
    let config = ResourceConfig {
        url: url("/403"),
        ..Default::default()
    };
    let (outcome, _) = converge(&RestResource::new("forbidden", Method::Get, config));
    let err = outcome.unwrap_err();
    assert!(matches!(err, RestError::Acceptability { .. }));
    let message = err.to_string();
    assert!(message.contains("GET"));
    assert!(message.contains("http://localhost:8080/403"));
    assert!(message.contains("403 Forbidden"));
}

#[test]
fn test_create_if_missing() {
    let config = ResourceConfig::from_yaml_str(
        r#"
url: http://localhost:8080/user
document: '{"name": "santa"}'
ok_codes: 201
only_if_REST:
  url: http://localhost:8080/user/santa
  ok_codes: 404
"#,
    )
    .unwrap();
    let resource = RestResource::new("create santa", Method::Post, config);
    let (outcome, server) = converge(&resource);

    assert_eq!(
        outcome.unwrap(),
        Outcome::Converged {
            method: Method::Post,
            url: url("/user"),
            status_line: "HTTP/1.1 201 Created".to_string(),
        }
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    // The GET guard does not inherit the POST document.
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].body, None);
    assert_eq!(requests[1].body.as_deref(), Some(br#"{"name": "santa"}"#.as_slice()));
    assert!(requests[1]
        .headers
        .contains(&("Content-Type".to_string(), "application/json".to_string())));
}

#[test]
fn test_post_without_document_fails_before_any_request() {
    let config = ResourceConfig {
        url: url("/user"),
        ..Default::default()
    };
    let (outcome, server) = converge(&RestResource::new("empty", Method::Post, config));
    assert!(matches!(outcome.unwrap_err(), RestError::MissingBody { .. }));
    assert_eq!(server.calls(), 0);
}

#[test]
fn test_vetoed_resource_is_up_to_date_without_document() {
    let config = ResourceConfig {
        url: url("/user"),
        only_if_rest: Some(json!({"url": url("/404")})),
        ..Default::default()
    };
    let (outcome, server) = converge(&RestResource::new("empty", Method::Post, config));
    assert_eq!(
        outcome.unwrap(),
        Outcome::UpToDate {
            reason: SkipReason::OnlyIfFailed { url: url("/404") }
        }
    );
    assert_eq!(server.log(), vec![(Method::Get, url("/404"))]);
}

#[test]
fn test_missing_document_raises_once_guards_allow() {
    let config = ResourceConfig {
        url: url("/user"),
        only_if_rest: Some(json!({"url": url("/404"), "ok_codes": 404})),
        ..Default::default()
    };
    let (outcome, server) = converge(&RestResource::new("empty", Method::Post, config));
    assert!(matches!(outcome.unwrap_err(), RestError::MissingBody { .. }));
    // Only the guard went out.
    assert_eq!(server.log(), vec![(Method::Get, url("/404"))]);
}

#[test]
fn test_malformed_guard_fails_before_any_request() {
    let config = ResourceConfig {
        url: url("/"),
        only_if_rest: Some(json!({"url": url("/404")})),
        not_if_rest: Some(json!({"method": "HEAD"})),
        ..Default::default()
    };
    let (outcome, server) = converge(&RestResource::new("bad guard", Method::Get, config));
    assert!(matches!(outcome.unwrap_err(), RestError::InvalidMethod(_)));
    assert_eq!(server.calls(), 0);
}

#[test]
fn test_dry_run_sends_guards_only() {
    let config = ResourceConfig::from_yaml_str(
        r#"
url: http://localhost:8080/item/1
not_if_REST: { url: "http://localhost:8080/404" }
"#,
    )
    .unwrap();
    let resource = RestResource::new("delete item", Method::Delete, config);

    let server = FakeServer::fixtures();
    let outcome = Converger::with_transport(&server)
        .dry_run(true)
        .converge(&resource)
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::WouldConverge {
            method: Method::Delete,
            url: url("/item/1"),
        }
    );
    assert!(outcome.changed());
    assert_eq!(server.log(), vec![(Method::Get, url("/404"))]);
}
