// # File Audit Sink
//
// Append-only JSON-lines implementation of AuditSink.
//
// ## File Format
//
// One object per line, the run record with its id alongside:
//
// ```json
// {"id":"0b6c…","stack":"web","env":"prod","phase":"dns-plan","status":"ok","inputs":{…},"result":{…},"startedAt":"…","finishedAt":"…"}
// ```
//
// ## Crash Behavior
//
// - Each record is written with a single append followed by a flush
// - A crash mid-write can leave a torn final line; readers skip lines that
//   do not parse and log a warning
// - Existing lines are never rewritten

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use stackflow_core::{AuditSink, Error, RunRecord};

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    #[serde(flatten)]
    pub run: RunRecord,
}

/// JSON-lines audit sink
///
/// Appends are serialized through a mutex so concurrent requests never
/// interleave partial lines.
///
/// # Example
///
/// ```rust,no_run
/// use stackflow_audit::FileAuditSink;
/// use stackflow_core::{AuditSink, RunPhase, RunRecord, RunStatus};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = FileAuditSink::new("/var/lib/stackflow/runs.jsonl").await?;
///
///     let run = RunRecord::new("web", "", RunPhase::DnsPlan)
///         .finish(RunStatus::Ok, serde_json::json!({"records": []}));
///     sink.record(run).await?;
///
///     assert_eq!(sink.read_all().await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileAuditSink {
    /// Open (or prepare to create) the audit log at `path`
    ///
    /// Parent directories are created if needed. The file itself is created
    /// on first write.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !fs::try_exists(parent).await.unwrap_or(false)
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::audit(format!(
                    "Failed to create audit directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(Error::audit(format!(
                "Audit path {} is a directory",
                path.display()
            )));
        }

        tracing::debug!("Audit log at {}", path.display());
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed entry back, oldest first
    ///
    /// Lines that fail to parse are skipped with a warning.
    pub async fn read_all(&self) -> Result<Vec<AuditEntry>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::audit(format!(
                "Failed to read audit log {}: {}",
                self.path.display(),
                e
            ))),
        };

        let mut entries = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(
                    "Skipping malformed audit line {} in {}: {}",
                    lineno + 1,
                    self.path.display(),
                    e
                ),
            }
        }
        Ok(entries)
    }

    async fn append(&self, line: &[u8]) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::audit(format!(
                    "Failed to open audit log {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.write_all(line).await.map_err(|e| {
            Error::audit(format!(
                "Failed to append to audit log {}: {}",
                self.path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::audit(format!(
                "Failed to flush audit log {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn record(&self, run: RunRecord) -> Result<String, Error> {
        let entry = AuditEntry {
            id: crate::new_run_id(),
            run,
        };

        let mut line = serde_json::to_vec(&entry)
            .map_err(|e| Error::audit(format!("Failed to serialize run: {}", e)))?;
        line.push(b'\n');

        self.append(&line).await?;
        tracing::trace!("Run {} appended to {}", entry.id, self.path.display());
        Ok(entry.id)
    }

    fn sink_name(&self) -> &'static str {
        "file"
    }
}
