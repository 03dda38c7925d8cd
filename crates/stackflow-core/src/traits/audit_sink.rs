// # Audit Sink Trait
//
// Defines the interface for recording tool invocations.
//
// ## Purpose
//
// Every `stackflow.validate` / `stackflow.plan.dns` call can be written to
// an audit log: which stack and environment, which phase, whether it
// succeeded, and the inputs and result as JSON.
//
// The core only *calls* a sink. It never reads records back and never lets
// a sink failure change an RPC response.
//
// ## Implementations
//
// - `stackflow-audit` crate: in-memory and JSON-lines file sinks
//
// ## Usage
//
// ```rust,ignore
// use stackflow_core::{AuditSink, RunRecord};
//
// let run_id = sink.record(RunRecord::new("web", "prod", RunPhase::DnsPlan)).await?;
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which operation a run performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    /// `stackflow.validate`
    Validate,
    /// `stackflow.plan.dns`
    DnsPlan,
}

/// Outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Failed,
}

/// One audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// Stack name (`metadata.name`), empty if it could not be read
    pub stack: String,
    /// Requested environment, empty for none
    pub env: String,
    pub phase: RunPhase,
    pub status: RunStatus,
    /// Who triggered the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Where the config came from (path, URL, git ref)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<String>,
    pub inputs: serde_json::Value,
    pub result: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    /// Start a record now; status defaults to failed until [`RunRecord::finish`]
    pub fn new(stack: impl Into<String>, env: impl Into<String>, phase: RunPhase) -> Self {
        let now = Utc::now();
        Self {
            stack: stack.into(),
            env: env.into(),
            phase,
            status: RunStatus::Failed,
            actor: None,
            config_ref: None,
            inputs: serde_json::Value::Null,
            result: serde_json::Value::Null,
            started_at: now,
            finished_at: now,
        }
    }

    /// Stamp the outcome and finish time
    pub fn finish(mut self, status: RunStatus, result: serde_json::Value) -> Self {
        self.status = status;
        self.result = result;
        self.finished_at = Utc::now();
        self
    }
}

/// Trait for audit sink implementations
///
/// # Thread Safety
///
/// Sinks are shared by every in-flight request; all methods must be safe to
/// call concurrently.
///
/// # Failure Handling
///
/// Return an error when the record could not be stored. The dispatcher logs
/// it and carries on; sinks must not retry internally.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Store a run record
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: Opaque run identifier
    /// - `Err(Error)`: Storage error
    async fn record(&self, run: RunRecord) -> Result<String, crate::Error>;

    /// Sink name (for logging)
    fn sink_name(&self) -> &'static str;
}
