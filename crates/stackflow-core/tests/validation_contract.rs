//! Contract Test: Validation
//!
//! Constraints verified:
//! - Checks run in a fixed order and stop at the first violation
//! - Every failure names the offending document path
//! - Overlays never mutate the document they are applied to
//!
//! If this test fails, clients relying on stable error paths will break.

mod common;

use common::*;
use stackflow_core::document::{self, Document};
use stackflow_core::{Error, apply_overlay, validate};

fn path_of(err: &Error) -> &str {
    &err.as_validation().expect("validation error").path
}

#[test]
fn web_stack_validates() {
    let doc = document::parse(WEB_STACK.as_bytes()).unwrap();
    let report = validate(&doc).unwrap();

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({
            "ok": true,
            "stack": "web",
            "domain": "example.com",
            "dns_provider": "cloudflare",
            "cloud": "gcp",
            "targetCount": 1
        })
    );
}

#[test]
fn wrong_kind_names_kind() {
    for kind in ["Stackflow", "Deployment", "''", "42"] {
        let yaml = WEB_STACK.replace("kind: StackFlow", &format!("kind: {kind}"));
        let err = validate(&document::parse(yaml.as_bytes()).unwrap()).unwrap_err();
        assert_eq!(path_of(&err), "kind", "kind: {kind}");
        assert!(err.to_string().starts_with("kind:"));
    }
}

#[test]
fn missing_domain_fails_before_targets() {
    // targets are also broken; the domain error must win
    let yaml = "kind: StackFlow\nmetadata: {name: web}\nglobal: {dns_provider: cf, cloud: gcp}\ntargets: not-a-list\n";
    let err = validate(&document::parse(yaml.as_bytes()).unwrap()).unwrap_err();
    assert_eq!(path_of(&err), "global.domain");
}

#[test]
fn out_of_zone_domain_identifies_index() {
    let yaml = r#"
kind: StackFlow
metadata: {name: web}
global: {domain: example.com, dns_provider: cf, cloud: gcp}
targets:
  - id: ok
    type: service
    domains: [example.com]
  - id: bad
    type: service
    domains: [www.example.com, example.com.attacker.net]
"#;
    let err = validate(&document::parse(yaml.as_bytes()).unwrap()).unwrap_err();
    assert_eq!(path_of(&err), "targets[1].domains[1]");
    assert!(err.to_string().contains("targets[1].domains[1]"));
}

#[test]
fn record_errors_carry_full_path() {
    let yaml = WEB_STACK.replace("value: 1.2.3.4", "comment: no value here");
    let err = validate(&document::parse(yaml.as_bytes()).unwrap()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "targets[0].dns.records[0]: entries require either value or valueFrom"
    );
}

#[test]
fn unknown_overlay_is_identity() {
    let doc = document::parse(WEB_STACK.as_bytes()).unwrap();
    assert_eq!(apply_overlay(&doc, "staging"), doc);
}

#[test]
fn overlay_changes_validation_inputs_only_in_copy() {
    let doc = document::parse(WEB_STACK.as_bytes()).unwrap();
    let prod = apply_overlay(&doc, "prod");

    assert_eq!(validate(&prod).unwrap().cloud, "aws");
    assert_eq!(validate(&doc).unwrap().cloud, "gcp");
    assert_eq!(
        doc.lookup("global.cloud").and_then(Document::as_str),
        Some("gcp")
    );
}
