//! Contract Test: DNS Plan Compilation
//!
//! Constraints verified:
//! - Records come out in declaration order, stamped with their target
//! - Normalized records contain only recognized keys
//! - Unknown environments are rejected by the compiler even though the
//!   overlay itself ignores them
//!
//! If this test fails, downstream DNS appliers will receive a different plan.

mod common;

use common::*;
use serde_json::json;
use stackflow_core::document;
use stackflow_core::{Error, apply_overlay, compile, normalize};

#[test]
fn web_stack_plan() {
    let doc = document::parse(WEB_STACK.as_bytes()).unwrap();
    let plan = compile(&doc, "").unwrap();

    assert_eq!(
        serde_json::to_value(&plan).unwrap(),
        json!({
            "stack": "web",
            "env": "",
            "global": {"domain": "example.com", "dns_provider": "cloudflare"},
            "records": [
                {"name": "api", "type": "A", "value": "1.2.3.4", "ttl": 300, "target": "api"}
            ]
        })
    );
}

#[test]
fn value_from_record_normalizes_without_optional_keys() {
    let raw = document::parse(b"name: www\ntype: cname\nvalueFrom: origin-ref\n").unwrap();
    let record = normalize(&raw).unwrap();
    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({"name": "www", "type": "CNAME", "valueFrom": "origin-ref"})
    );
}

#[test]
fn both_value_kinds_keep_value_from() {
    let raw = document::parse(b"name: www\ntype: CNAME\nvalue: a.example.com\nvalueFrom: lb-ref\n").unwrap();
    let json = serde_json::to_value(normalize(&raw).unwrap()).unwrap();
    assert_eq!(json["valueFrom"], "lb-ref");
    assert!(json.get("value").is_none());
}

#[test]
fn unknown_env_lenient_overlay_strict_compile() {
    let doc = document::parse(WEB_STACK.as_bytes()).unwrap();

    assert_eq!(apply_overlay(&doc, "qa"), doc);

    let err = compile(&doc, "qa").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");

    let no_envs = document::parse(WEB_STACK_NO_ENVS.as_bytes()).unwrap();
    assert!(matches!(compile(&no_envs, "prod"), Err(Error::NotFound(_))));
}

#[test]
fn known_env_is_overlaid_and_echoed_trimmed() {
    let doc = document::parse(WEB_STACK.as_bytes()).unwrap();
    let plan = compile(&doc, "prod").unwrap();
    assert_eq!(plan.env, "prod");
    assert_eq!(plan.global.dns_provider, "route53");
}

#[test]
fn multi_target_order_without_sorting_or_dedup() {
    let yaml = r#"
kind: StackFlow
metadata: {name: shop}
global: {domain: shop.io, dns_provider: cloudflare, cloud: gcp}
targets:
  - id: zeta
    type: service
    domains: [z.shop.io]
    dns:
      records:
        - {name: z, type: a, value: 10.0.0.2}
        - {name: z, type: a, value: 10.0.0.2}
  - id: alpha
    type: service
    domains: [shop.io]
  - id: beta
    type: bucket
    domains: [b.shop.io]
    dns:
      records:
        - {name: b, type: cname, valueFrom: bucket-endpoint}
"#;
    let plan = compile(&document::parse(yaml.as_bytes()).unwrap(), "").unwrap();
    let targets: Vec<_> = plan.records.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["zeta", "zeta", "beta"]);
    assert_eq!(plan.records[0], plan.records[1]);
}

#[test]
fn validation_errors_abort_compilation() {
    let yaml = WEB_STACK.replace("ttl: 300", "ttl: -1");
    let err = compile(&document::parse(yaml.as_bytes()).unwrap(), "").unwrap_err();
    assert_eq!(
        err.as_validation().unwrap().path,
        "targets[0].dns.records[0].ttl"
    );
}
