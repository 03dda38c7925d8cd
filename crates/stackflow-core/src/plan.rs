//! DNS plan compilation
//!
//! ```text
//! Document ──(strict env check)──► overlay ──► validate ──► records
//! ```
//!
//! Records come out in declaration order: targets first, then records
//! within each target. Nothing is sorted or deduplicated.

use serde::Serialize;
use tracing::info;

use crate::document::{self, Document};
use crate::error::{Error, Result};
use crate::overlay::apply_overlay;
use crate::record::{self, DnsRecord};
use crate::validate::{required_str, validate};

/// Global settings echoed into the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanGlobal {
    pub domain: String,
    pub dns_provider: String,
}

/// A normalized record stamped with the target that declared it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRecord {
    #[serde(flatten)]
    pub record: DnsRecord,
    /// `id` of the owning target
    pub target: String,
}

/// Ordered DNS record plan for one stack and environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsPlan {
    pub stack: String,
    pub env: String,
    pub global: PlanGlobal,
    pub records: Vec<PlannedRecord>,
}

/// Compile a DNS plan for `env` (blank for no environment)
///
/// Unlike [`apply_overlay`], a non-blank `env` must exist under
/// `global.environments` of `doc`.
///
/// # Errors
///
/// - [`Error::NotFound`] for an unknown environment
/// - any error from [`validate`], unchanged
pub fn compile(doc: &Document, env: &str) -> Result<DnsPlan> {
    let doc = if env.trim().is_empty() {
        doc.clone()
    } else {
        let known = doc
            .lookup("global.environments")
            .and_then(Document::as_mapping)
            .is_some_and(|envs| envs.contains_key(env));
        if !known {
            return Err(Error::not_found(format!(
                "env not found in global.environments: {env}"
            )));
        }
        apply_overlay(doc, env)
    };

    validate(&doc)?;

    let stack = document::stack_name(&doc)?;
    let global = doc
        .get("global")
        .ok_or_else(|| Error::internal("global vanished after validation"))?
        .expect_mapping("global")?;
    let domain = required_str(global, "domain", "global.domain")?;
    let dns_provider = required_str(global, "dns_provider", "global.dns_provider")?;

    let targets = doc
        .get("targets")
        .ok_or_else(|| Error::internal("targets vanished after validation"))?
        .expect_sequence("targets")?;

    let mut records = Vec::new();
    for target in targets {
        let target_id = target
            .get("id")
            .ok_or_else(|| Error::internal("target id vanished after validation"))?
            .expect_str("targets[].id")?;
        let Some(raw_records) = target
            .lookup("dns.records")
            .and_then(Document::as_sequence)
        else {
            continue;
        };
        for raw in raw_records {
            records.push(PlannedRecord {
                record: record::normalize(raw)?,
                target: target_id.to_string(),
            });
        }
    }

    info!(
        stack = %stack,
        env = env.trim(),
        records = records.len(),
        "compiled DNS plan"
    );

    Ok(DnsPlan {
        stack,
        env: env.trim().to_string(),
        global: PlanGlobal {
            domain,
            dns_provider,
        },
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;
    use serde_json::json;

    const STACK: &str = r#"
kind: StackFlow
metadata:
  name: web
global:
  domain: example.com
  dns_provider: cloudflare
  cloud: gcp
  environments:
    prod:
      dns_provider: route53
    bad:
      domain: other.org
targets:
  - id: api
    type: service
    domains: [api.example.com]
    dns:
      records:
        - {name: api, type: a, value: 1.2.3.4, ttl: 300}
        - {name: api, type: aaaa, value: "::1"}
  - id: static
    type: bucket
    domains: [example.com]
  - id: www
    type: cdn
    domains: [www.example.com]
    dns:
      records:
        - {name: www, type: cname, valueFrom: origin-ref, proxied: true}
"#;

    #[test]
    fn records_keep_declaration_order() {
        let plan = compile(&parse(STACK.as_bytes()).unwrap(), "").unwrap();
        let order: Vec<_> = plan
            .records
            .iter()
            .map(|r| (r.target.as_str(), r.record.record_type.as_str()))
            .collect();
        assert_eq!(order, vec![("api", "A"), ("api", "AAAA"), ("www", "CNAME")]);
        assert_eq!(plan.env, "");
        assert_eq!(plan.global.dns_provider, "cloudflare");
    }

    #[test]
    fn plan_serializes_flat_records() {
        let plan = compile(&parse(STACK.as_bytes()).unwrap(), "").unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            json["records"][0],
            json!({"name": "api", "type": "A", "value": "1.2.3.4", "ttl": 300, "target": "api"})
        );
        assert_eq!(
            json["records"][2],
            json!({"name": "www", "type": "CNAME", "valueFrom": "origin-ref", "proxied": true, "target": "www"})
        );
        assert_eq!(
            json["global"],
            json!({"domain": "example.com", "dns_provider": "cloudflare"})
        );
    }

    #[test]
    fn env_overlay_is_applied_and_trimmed() {
        let doc = parse(STACK.as_bytes()).unwrap();
        let plan = compile(&doc, "prod").unwrap();
        assert_eq!(plan.env, "prod");
        assert_eq!(plan.global.dns_provider, "route53");
    }

    #[test]
    fn unknown_env_is_not_found() {
        let doc = parse(STACK.as_bytes()).unwrap();
        let err = compile(&doc, "staging").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(
            err.to_string(),
            "env not found in global.environments: staging"
        );

        let no_envs = parse(b"kind: StackFlow\n").unwrap();
        assert!(matches!(compile(&no_envs, "prod"), Err(Error::NotFound(_))));
    }

    #[test]
    fn blank_env_skips_the_check() {
        let doc = parse(STACK.as_bytes()).unwrap();
        let plan = compile(&doc, "   ").unwrap();
        assert_eq!(plan.env, "");
        assert_eq!(plan.global.dns_provider, "cloudflare");
    }

    #[test]
    fn validation_runs_on_overlaid_document() {
        // the `bad` overlay moves the zone away from every target domain
        let doc = parse(STACK.as_bytes()).unwrap();
        let err = compile(&doc, "bad").unwrap_err();
        assert_eq!(err.as_validation().unwrap().path, "targets[0].domains[0]");
    }
}
