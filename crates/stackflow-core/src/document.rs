// # Document Tree
//
// Generic, immutable tree that a StackFlow YAML file decodes into.
//
// ## Shape
//
// ```text
// Document ─┬─ Mapping  (string → Document)
//           ├─ Sequence ([Document])
//           └─ Scalar   (null | bool | int | float | string)
// ```
//
// Containers are reference counted. Cloning a Document is cheap and never
// copies nested nodes, so a derived document (see `overlay`) shares every
// subtree it did not replace with the document it came from. There is no
// way to mutate a node in place through this API.
//
// ## Loading
//
// ```rust
// use stackflow_core::document;
//
// let doc = document::parse(b"kind: StackFlow\nmetadata:\n  name: web\n").unwrap();
// assert_eq!(doc.lookup("metadata.name").and_then(|d| d.as_str()), Some("web"));
// ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Ordered string-keyed mapping of child nodes
pub type Mapping = BTreeMap<String, Document>;

/// A node of the decoded configuration tree
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// String-keyed mapping
    Mapping(Arc<Mapping>),
    /// Ordered sequence
    Sequence(Arc<Vec<Document>>),
    /// Leaf value
    Scalar(Scalar),
}

/// Leaf values of the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `null` / `~` / empty value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer that fits in an i64
    Int(i64),
    /// Any other number (fractional, or an integer beyond i64)
    Float(f64),
    /// String
    String(String),
}

impl Document {
    /// The null scalar
    pub fn null() -> Self {
        Document::Scalar(Scalar::Null)
    }

    /// Build a mapping node from key/value pairs
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Document)>,
    {
        Document::Mapping(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build a sequence node
    pub fn sequence(items: impl IntoIterator<Item = Document>) -> Self {
        Document::Sequence(Arc::new(items.into_iter().collect()))
    }

    /// Human-readable name of this node's type, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Document::Mapping(_) => "mapping",
            Document::Sequence(_) => "sequence",
            Document::Scalar(Scalar::Null) => "null",
            Document::Scalar(Scalar::Bool(_)) => "boolean",
            Document::Scalar(Scalar::Int(_)) => "integer",
            Document::Scalar(Scalar::Float(_)) => "float",
            Document::Scalar(Scalar::String(_)) => "string",
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Document::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Document]> {
        match self {
            Document::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Document::Scalar(Scalar::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Document::Scalar(Scalar::Null))
    }

    /// Child of a mapping node; `None` for missing keys and non-mappings
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Follow a dotted path of mapping keys (`"global.environments"`)
    pub fn lookup(&self, path: &str) -> Option<&Document> {
        path.split('.').try_fold(self, |node, key| node.get(key))
    }

    /// Typed access that fails instead of coercing
    ///
    /// `what` names the node in the error message.
    pub fn expect_mapping(&self, what: &str) -> Result<&Mapping> {
        self.as_mapping()
            .ok_or_else(|| self.mismatch(what, "mapping"))
    }

    /// Typed access that fails instead of coercing
    pub fn expect_sequence(&self, what: &str) -> Result<&[Document]> {
        self.as_sequence()
            .ok_or_else(|| self.mismatch(what, "sequence"))
    }

    /// Typed access that fails instead of coercing
    pub fn expect_str(&self, what: &str) -> Result<&str> {
        self.as_str().ok_or_else(|| self.mismatch(what, "string"))
    }

    fn mismatch(&self, what: &str, expected: &str) -> Error {
        Error::schema(format!(
            "{} must be a {}, found {}",
            what,
            expected,
            self.kind_name()
        ))
    }

    /// Return a new mapping document with `key` set to `value`
    ///
    /// Only the top-level map is copied; every other child is shared with
    /// `self`.
    pub fn with_entry(&self, key: impl Into<String>, value: Document) -> Result<Document> {
        let mut top = self.expect_mapping("document")?.clone();
        top.insert(key.into(), value);
        Ok(Document::Mapping(Arc::new(top)))
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::Scalar(Scalar::String(s))
    }
}

impl From<i64> for Document {
    fn from(n: i64) -> Self {
        Document::Scalar(Scalar::Int(n))
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Scalar(Scalar::Bool(b))
    }
}

impl From<Mapping> for Document {
    fn from(m: Mapping) -> Self {
        Document::Mapping(Arc::new(m))
    }
}

impl TryFrom<serde_yaml::Value> for Document {
    type Error = Error;

    fn try_from(value: serde_yaml::Value) -> Result<Self> {
        use serde_yaml::Value;

        Ok(match value {
            Value::Null => Document::null(),
            Value::Bool(b) => Document::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Document::Scalar(Scalar::Int(i)),
                None => Document::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => Document::Scalar(Scalar::String(s)),
            Value::Sequence(items) => Document::sequence(
                items
                    .into_iter()
                    .map(Document::try_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Mapping(map) => {
                let mut out = Mapping::new();
                for (k, v) in map {
                    out.insert(mapping_key(k)?, Document::try_from(v)?);
                }
                Document::from(out)
            }
            Value::Tagged(tagged) => Document::try_from(tagged.value)?,
        })
    }
}

/// Scalar YAML keys are stringified; containers as keys are rejected
fn mapping_key(key: serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Tagged(tagged) => mapping_key(tagged.value),
        Value::Null => Err(Error::schema("mapping keys must not be null")),
        Value::Sequence(_) | Value::Mapping(_) => {
            Err(Error::schema("mapping keys must be scalars"))
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Document::Mapping(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Document::Sequence(items) => serializer.collect_seq(items.iter()),
            Document::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Document::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Document::Scalar(Scalar::Int(n)) => serializer.serialize_i64(*n),
            Document::Scalar(Scalar::Float(f)) => serializer.serialize_f64(*f),
            Document::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
        }
    }
}

/// Parse StackFlow YAML into a document tree
///
/// # Errors
///
/// - [`Error::Parse`] if the bytes are not well-formed YAML
/// - [`Error::Schema`] if the root is not a mapping (an empty file included)
pub fn parse(bytes: &[u8]) -> Result<Document> {
    let value: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    let doc = Document::try_from(value)?;
    if doc.as_mapping().is_none() {
        return Err(Error::schema("config must be a mapping"));
    }
    Ok(doc)
}

/// `metadata.name` of a document, as a non-empty string
pub fn stack_name(doc: &Document) -> Result<String> {
    match doc.lookup("metadata.name") {
        None => Err(Error::validation("metadata.name", "missing required field")),
        Some(node) => match node.as_str() {
            Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
            _ => Err(Error::validation("metadata.name", "must be a non-empty string")),
        },
    }
}
