//! Error types for StackFlow
//!
//! This module defines all error types used throughout the crate.

use std::fmt;
use thiserror::Error;

/// Result type alias for StackFlow operations
pub type Result<T> = std::result::Result<T, Error>;

/// JSON-RPC error code for a body that is not a valid request envelope
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC error code for an unrecognized method
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC error code for malformed `params`
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC error code used for every application-level failure
pub const APPLICATION_ERROR: i64 = -32000;

/// A business-rule violation at a location inside the document
///
/// `path` uses the dotted/indexed notation of the document, e.g.
/// `targets[0].domains[1]`. An empty path means the violation is about
/// the node itself (used by record normalization before re-rooting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Location of the offending node
    pub path: String,
    /// What is wrong with it
    pub reason: String,
}

impl ValidationError {
    /// Create a validation error at `path`
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Re-root this error under `prefix`
    ///
    /// `records[0]` + `ttl` becomes `records[0].ttl`; an empty relative
    /// path becomes `prefix` itself.
    pub fn under(self, prefix: &str) -> Self {
        let path = match (prefix.is_empty(), self.path.is_empty()) {
            (true, _) => self.path,
            (false, true) => prefix.to_string(),
            (false, false) => format!("{}.{}", prefix, self.path),
        };
        Self {
            path,
            reason: self.reason,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Core error type for StackFlow
#[derive(Error, Debug)]
pub enum Error {
    /// Input bytes are not well-formed YAML
    #[error("YAML parse error: {0}")]
    Parse(String),

    /// Document has the wrong shape
    #[error("{0}")]
    Schema(String),

    /// Business-rule violation with a document path
    #[error("{0}")]
    Validation(ValidationError),

    /// A referenced entity (environment) does not exist
    #[error("{0}")]
    NotFound(String),

    /// Malformed RPC envelope, unknown method or unknown tool
    #[error("{message}")]
    Protocol {
        /// JSON-RPC error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Audit sink errors
    #[error("Audit sink error: {0}")]
    Audit(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fault that should never happen (caught panic, broken invariant)
    #[error("internal error: {0}")]
    Internal(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a validation error at `path`
    pub fn validation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(path, reason))
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a protocol error with an explicit JSON-RPC code
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Create an audit sink error
    pub fn audit(msg: impl Into<String>) -> Self {
        Self::Audit(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Re-root a validation error under `prefix`; other variants pass through
    pub fn under(self, prefix: &str) -> Self {
        match self {
            Self::Validation(err) => Self::Validation(err.under(prefix)),
            other => other,
        }
    }

    /// The JSON-RPC error code this error is reported with
    pub fn rpc_code(&self) -> i64 {
        match self {
            Self::Protocol { code, .. } => *code,
            _ => APPLICATION_ERROR,
        }
    }

    /// The validation details, if this is a validation error
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
