// # StackFlow Audit Sinks
//
// Implementations of `stackflow_core::AuditSink`.
//
// - `MemoryAuditSink`: most recent records kept in process memory, lost on
//   restart
// - `FileAuditSink`: one JSON object per line, appended to a file
//
// `sink_from_config` builds whichever one an `AuditConfig` asks for.

pub mod file;
pub mod memory;

pub use file::{AuditEntry, FileAuditSink};
pub use memory::{DEFAULT_MEMORY_CAPACITY, MemoryAuditSink};

use stackflow_core::{AuditConfig, AuditSink, Error};
use std::sync::Arc;

/// Build the sink described by `config`, or `None` when auditing is disabled
pub async fn sink_from_config(config: &AuditConfig) -> Result<Option<Arc<dyn AuditSink>>, Error> {
    let sink: Arc<dyn AuditSink> = match config {
        AuditConfig::Disabled => return Ok(None),
        AuditConfig::Memory { .. } => Arc::new(MemoryAuditSink::new()),
        AuditConfig::File { path, .. } => Arc::new(FileAuditSink::new(path).await?),
    };
    tracing::info!(sink = sink.sink_name(), "audit sink ready");
    Ok(Some(sink))
}

/// Fresh opaque run identifier
pub(crate) fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_builds_nothing() {
        assert!(sink_from_config(&AuditConfig::Disabled).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn builds_configured_sink() {
        let memory = sink_from_config(&AuditConfig::Memory { actor: None })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(memory.sink_name(), "memory");

        let dir = tempfile::tempdir().unwrap();
        let file = sink_from_config(&AuditConfig::File {
            path: dir.path().join("runs.jsonl").display().to_string(),
            actor: Some("ci".into()),
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(file.sink_name(), "file");
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(new_run_id(), new_run_id());
    }
}
