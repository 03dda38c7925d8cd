// # DNS Record Normalization
//
// Turns one raw `dns.records[]` entry into its canonical form:
//
// - `name` kept as written, `type` trimmed and upper-cased
// - exactly one of `value` / `valueFrom` (`valueFrom` wins when both are set)
// - optional positive `ttl`, optional boolean `proxied`
// - every other key dropped
//
// Error paths are relative to the record: `""` for the record itself, the
// field name otherwise. The validator re-roots them under
// `targets[i].dns.records[k]`.

use serde::Serialize;

use crate::document::{Document, Mapping};
use crate::error::{Error, Result};

/// Where a record's content comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RecordValue {
    /// Literal record content
    #[serde(rename = "value")]
    Literal(String),
    /// Reference resolved by a later stage (e.g. a load balancer address)
    #[serde(rename = "valueFrom")]
    Reference(String),
}

/// A validated, canonical DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub name: String,

    #[serde(rename = "type")]
    pub record_type: String,

    #[serde(flatten)]
    pub value: RecordValue,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
}

impl DnsRecord {
    /// Raw form of this record; normalizing it yields `self` again
    pub fn to_document(&self) -> Document {
        let mut map = Mapping::new();
        map.insert("name".into(), Document::from(self.name.as_str()));
        map.insert("type".into(), Document::from(self.record_type.as_str()));
        match &self.value {
            RecordValue::Literal(v) => map.insert("value".into(), Document::from(v.as_str())),
            RecordValue::Reference(v) => {
                map.insert("valueFrom".into(), Document::from(v.as_str()))
            }
        };
        if let Some(ttl) = self.ttl {
            map.insert("ttl".into(), Document::from(ttl));
        }
        if let Some(proxied) = self.proxied {
            map.insert("proxied".into(), Document::from(proxied));
        }
        Document::from(map)
    }
}

/// Validate and canonicalize one raw record description
///
/// # Errors
///
/// [`Error::Validation`] with a record-relative path on the first violated
/// rule.
pub fn normalize(raw: &Document) -> Result<DnsRecord> {
    let (Some(name), Some(record_type)) = (raw.get("name"), raw.get("type")) else {
        return Err(Error::validation("", "entries require name and type"));
    };
    let name = non_empty_str(name, "name")?;
    let record_type = non_empty_str(record_type, "type")?.trim().to_uppercase();

    let value = if let Some(value_from) = raw.get("valueFrom") {
        RecordValue::Reference(non_empty_str(value_from, "valueFrom")?)
    } else if let Some(value) = raw.get("value") {
        RecordValue::Literal(non_empty_str(value, "value")?)
    } else {
        return Err(Error::validation(
            "",
            "entries require either value or valueFrom",
        ));
    };

    let ttl = raw.get("ttl").map(positive_ttl).transpose()?;

    let proxied = raw
        .get("proxied")
        .map(|p| {
            p.as_bool()
                .ok_or_else(|| Error::validation("proxied", "must be a boolean"))
        })
        .transpose()?;

    Ok(DnsRecord {
        name,
        record_type,
        value,
        ttl,
        proxied,
    })
}

fn non_empty_str(node: &Document, field: &str) -> Result<String> {
    match node.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(Error::validation(field, "must be a non-empty string")),
    }
}

fn positive_ttl(node: &Document) -> Result<i64> {
    node.as_i64()
        .filter(|ttl| *ttl > 0)
        .ok_or_else(|| Error::validation("ttl", "must be a positive integer"))
}
