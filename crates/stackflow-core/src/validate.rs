//! StackFlow document validation
//!
//! Checks run in a fixed order and stop at the first violation:
//!
//! 1. `kind` is `StackFlow`
//! 2. `metadata.name` is a non-empty string
//! 3. `global.{domain,dns_provider,cloud}` are non-empty strings
//! 4. `targets` is a sequence (possibly empty)
//! 5. every target has `id`, `type`, in-zone `domains`, and well-formed
//!    `dns.records`

use serde::Serialize;

use crate::document::{self, Document, Mapping};
use crate::error::{Error, Result};
use crate::record;

/// Expected value of the top-level `kind` key
pub const STACKFLOW_KIND: &str = "StackFlow";

/// Summary returned by a successful validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub stack: String,
    pub domain: String,
    pub dns_provider: String,
    pub cloud: String,
    #[serde(rename = "targetCount")]
    pub target_count: usize,
}

/// Validate a StackFlow document
///
/// # Errors
///
/// [`Error::Validation`] naming the offending path; the first violation
/// wins, nothing is aggregated.
pub fn validate(doc: &Document) -> Result<ValidationReport> {
    let kind = doc.get("kind").and_then(Document::as_str).unwrap_or_default();
    if kind != STACKFLOW_KIND {
        return Err(Error::validation(
            "kind",
            format!("must be {STACKFLOW_KIND}, got {kind:?}"),
        ));
    }

    let stack = document::stack_name(doc)?;

    let global = match doc.get("global") {
        None => return Err(Error::validation("global", "missing required field")),
        Some(node) => node
            .as_mapping()
            .ok_or_else(|| Error::validation("global", "must be a mapping"))?,
    };
    let domain = required_str(global, "domain", "global.domain")?;
    let dns_provider = required_str(global, "dns_provider", "global.dns_provider")?;
    let cloud = required_str(global, "cloud", "global.cloud")?;

    let targets = match doc.get("targets") {
        None => return Err(Error::validation("targets", "missing required field")),
        Some(node) => node
            .as_sequence()
            .ok_or_else(|| Error::validation("targets", "must be a sequence"))?,
    };

    for (i, target) in targets.iter().enumerate() {
        validate_target(target, i, &domain)?;
    }

    Ok(ValidationReport {
        ok: true,
        stack,
        domain,
        dns_provider,
        cloud,
        target_count: targets.len(),
    })
}

fn validate_target(target: &Document, i: usize, root_domain: &str) -> Result<()> {
    let path = format!("targets[{i}]");
    let target = target
        .as_mapping()
        .ok_or_else(|| Error::validation(&path, "must be a mapping"))?;

    required_str(target, "id", &format!("{path}.id"))?;
    required_str(target, "type", &format!("{path}.type"))?;

    let domains_path = format!("{path}.domains");
    let domains = target
        .get("domains")
        .and_then(Document::as_sequence)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| Error::validation(&domains_path, "must be a non-empty sequence"))?;

    for (j, entry) in domains.iter().enumerate() {
        let entry_path = format!("{domains_path}[{j}]");
        let fqdn = match entry.as_str() {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Err(Error::validation(entry_path, "must be a non-empty string")),
        };
        if !in_zone(fqdn, root_domain) {
            return Err(Error::validation(
                entry_path,
                format!("must be under global.domain ({root_domain}), got {fqdn}"),
            ));
        }
    }

    let Some(dns) = target.get("dns") else {
        return Ok(());
    };
    let dns = dns
        .as_mapping()
        .ok_or_else(|| Error::validation(format!("{path}.dns"), "must be a mapping"))?;

    let records = match dns.get("records") {
        None => return Ok(()),
        Some(node) if node.is_null() => return Ok(()),
        Some(node) => node.as_sequence().ok_or_else(|| {
            Error::validation(format!("{path}.dns.records"), "must be a sequence")
        })?,
    };

    for (k, raw) in records.iter().enumerate() {
        let record_path = format!("{path}.dns.records[{k}]");
        if raw.as_mapping().is_none() {
            return Err(Error::validation(record_path, "must be a mapping"));
        }
        record::normalize(raw).map_err(|e| e.under(&record_path))?;
    }

    Ok(())
}

/// `fqdn` is the root domain itself or a dot-separated child of it
pub fn in_zone(fqdn: &str, root_domain: &str) -> bool {
    fqdn == root_domain
        || fqdn
            .strip_suffix(root_domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Non-empty string value of `key`, reported at `path` otherwise
pub(crate) fn required_str(map: &Mapping, key: &str, path: &str) -> Result<String> {
    match map.get(key) {
        None => Err(Error::validation(path, "missing required field")),
        Some(node) => match node.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
            _ => Err(Error::validation(path, "must be a non-empty string")),
        },
    }
}
