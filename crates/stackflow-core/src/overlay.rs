//! Environment overlays
//!
//! `global.environments.<env>` holds per-environment overrides for the
//! `global` section. Overriding is shallow: each override key replaces the
//! same-named global key wholesale, nested mappings included.
//!
//! Lookup is lenient here. An unknown environment (or a document without
//! `global`/`environments`) yields the input unchanged. The DNS plan
//! compiler checks the environment strictly before calling in.

use crate::document::{Document, Mapping};
use tracing::debug;

/// Shallow merge: a copy of `base` with every key of `overrides` replaced
pub fn merge_shallow(base: &Mapping, overrides: &Mapping) -> Mapping {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Apply `global.environments.<env>` onto `global`
///
/// Never mutates `doc`. When an overlay applies, the result shares every
/// top-level key except `global` with `doc`.
pub fn apply_overlay(doc: &Document, env: &str) -> Document {
    let Some(global) = doc.get("global").and_then(Document::as_mapping) else {
        return doc.clone();
    };
    let Some(environments) = global.get("environments").and_then(Document::as_mapping) else {
        return doc.clone();
    };
    let Some(overrides) = environments.get(env).and_then(Document::as_mapping) else {
        debug!(env, "no overlay for environment");
        return doc.clone();
    };

    let merged = Document::from(merge_shallow(global, overrides));
    match doc.with_entry("global", merged) {
        Ok(overlaid) => {
            debug!(env, keys = overrides.len(), "applied environment overlay");
            overlaid
        }
        // `global` was found through a mapping root, so this is unreachable
        Err(_) => doc.clone(),
    }
}
