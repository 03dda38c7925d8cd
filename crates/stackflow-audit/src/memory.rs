// # Memory Audit Sink
//
// In-memory implementation of AuditSink.
//
// ## Purpose
//
// Keeps the most recent run records in process memory so they can be
// inspected by an embedding program or a test. Nothing survives a restart.
//
// ## Capacity
//
// The sink holds at most `capacity` records (default
// `DEFAULT_MEMORY_CAPACITY`). Recording past the cap evicts the oldest run.
//
// ## When to Use
//
// - Tests that assert on what was recorded
// - Local development where an audit trail on disk is noise

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use stackflow_core::{AuditSink, Error, RunRecord};

/// Runs kept by [`MemoryAuditSink::new`]
pub const DEFAULT_MEMORY_CAPACITY: usize = 1024;

/// In-memory audit sink
///
/// Records are stored in insertion order behind a RwLock, each paired with
/// the run id returned from [`AuditSink::record`]. Once `capacity` runs are
/// held, each new run evicts the oldest one.
///
/// # Example
///
/// ```rust,no_run
/// use stackflow_audit::MemoryAuditSink;
/// use stackflow_core::{AuditSink, RunPhase, RunRecord, RunStatus};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = MemoryAuditSink::new();
///
///     let run = RunRecord::new("web", "prod", RunPhase::Validate)
///         .finish(RunStatus::Ok, serde_json::json!({"ok": true}));
///     let id = sink.record(run).await?;
///
///     assert_eq!(sink.get(&id).await.map(|r| r.stack), Some("web".to_string()));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryAuditSink {
    inner: Arc<RwLock<VecDeque<(String, RunRecord)>>>,
    capacity: usize,
}

impl MemoryAuditSink {
    /// Create a new empty sink holding up to [`DEFAULT_MEMORY_CAPACITY`] runs
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// Create a new empty sink holding up to `capacity` runs (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Every retained run, oldest first
    pub async fn runs(&self) -> Vec<RunRecord> {
        self.inner
            .read()
            .await
            .iter()
            .map(|(_, run)| run.clone())
            .collect()
    }

    /// The run recorded under `id`
    pub async fn get(&self, id: &str) -> Option<RunRecord> {
        self.inner
            .read()
            .await
            .iter()
            .find(|(run_id, _)| run_id == id)
            .map(|(_, run)| run.clone())
    }

    /// Drop every recorded run
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, run: RunRecord) -> Result<String, Error> {
        let id = crate::new_run_id();
        let mut guard = self.inner.write().await;
        while guard.len() >= self.capacity {
            if let Some((evicted, _)) = guard.pop_front() {
                tracing::trace!("Evicted run {} from memory audit sink", evicted);
            }
        }
        guard.push_back((id.clone(), run));
        Ok(id)
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}
