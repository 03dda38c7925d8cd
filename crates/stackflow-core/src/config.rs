//! Configuration types for the StackFlow server
//!
//! The daemon fills these from environment variables; embedders construct
//! them directly.

use serde::{Deserialize, Serialize};

/// Default name reported by `initialize`
pub const DEFAULT_SERVER_NAME: &str = "stackflow";

/// Default upper bound for an RPC request body (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

const MIN_BODY_BYTES: usize = 1024;
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP transport binds to (e.g. "0.0.0.0:8080")
    pub listen_addr: String,

    /// Identity reported by `initialize`
    #[serde(default)]
    pub server: ServerInfo,

    /// Where tool invocations are recorded
    #[serde(default)]
    pub audit: AuditConfig,

    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Create a configuration with defaults for everything but the address
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            server: ServerInfo::default(),
            audit: AuditConfig::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.listen_addr.trim().is_empty() {
            return Err(crate::Error::config("Listen address cannot be empty"));
        }
        if self
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(crate::Error::config(format!(
                "Listen address must be host:port, got {}",
                self.listen_addr
            )));
        }
        if !(MIN_BODY_BYTES..=MAX_BODY_BYTES).contains(&self.max_body_bytes) {
            return Err(crate::Error::config(format!(
                "Max body size must be between {} and {} bytes, got {}",
                MIN_BODY_BYTES, MAX_BODY_BYTES, self.max_body_bytes
            )));
        }

        self.server.validate()?;
        self.audit.validate()?;

        Ok(())
    }
}

/// Server identity reported to RPC clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    /// Validate the server identity
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config("Server name cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Audit sink configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditConfig {
    /// No audit records
    #[default]
    Disabled,

    /// In-memory records (lost on restart)
    Memory {
        /// Recorded as `actor` on every run
        actor: Option<String>,
    },

    /// Append-only JSON-lines file
    File {
        /// Path to the audit log
        path: String,
        /// Recorded as `actor` on every run
        actor: Option<String>,
    },
}

impl AuditConfig {
    /// Validate the audit configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            AuditConfig::File { path, .. } if path.trim().is_empty() => {
                Err(crate::Error::config("Audit log path cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Actor stamped on run records, if configured
    pub fn actor(&self) -> Option<&str> {
        match self {
            AuditConfig::Disabled => None,
            AuditConfig::Memory { actor } | AuditConfig::File { actor, .. } => actor.as_deref(),
        }
    }

    /// Get the audit sink type name
    pub fn type_name(&self) -> &'static str {
        match self {
            AuditConfig::Disabled => "disabled",
            AuditConfig::Memory { .. } => "memory",
            AuditConfig::File { .. } => "file",
        }
    }
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}
