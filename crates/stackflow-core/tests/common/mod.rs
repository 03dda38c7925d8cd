//! Fixtures and test doubles shared by the contract tests

#![allow(dead_code)]

use stackflow_core::error::Result;
use stackflow_core::traits::{AuditSink, RunRecord};
use stackflow_core::{Error, ServerInfo, ToolCatalog, ToolDispatcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The canonical single-target stack
pub const WEB_STACK: &str = r#"
kind: StackFlow
metadata:
  name: web
global:
  domain: example.com
  dns_provider: cloudflare
  cloud: gcp
  environments:
    prod:
      dns_provider: route53
      cloud: aws
targets:
  - id: api
    type: service
    domains: ["api.example.com"]
    dns:
      records:
        - name: api
          type: a
          value: 1.2.3.4
          ttl: 300
"#;

/// Same stack without any environments
pub const WEB_STACK_NO_ENVS: &str = r#"
kind: StackFlow
metadata:
  name: web
global:
  domain: example.com
  dns_provider: cloudflare
  cloud: gcp
targets:
  - id: api
    type: service
    domains: ["api.example.com"]
    dns:
      records:
        - {name: api, type: a, value: 1.2.3.4, ttl: 300}
"#;

/// Dispatcher with the standard catalog and no audit sink
pub fn dispatcher() -> ToolDispatcher {
    ToolDispatcher::new(Arc::new(ToolCatalog::new()), ServerInfo::default())
}

/// `tools/call` request body
pub fn tool_call(id: serde_json::Value, tool: &str, arguments: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": tool, "arguments": arguments },
    }))
    .expect("serializable request")
}

/// An AuditSink that keeps every record and counts calls
pub struct RecordingAuditSink {
    call_count: Arc<AtomicUsize>,
    runs: Arc<std::sync::Mutex<Vec<RunRecord>>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self {
            call_count: Arc::new(AtomicUsize::new(0)),
            runs: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Get the number of times record() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get a copy of every recorded run
    pub fn runs(&self) -> Vec<RunRecord> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, run: RunRecord) -> Result<String> {
        let n = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.runs.lock().unwrap().push(run);
        Ok(format!("run-{n}"))
    }

    fn sink_name(&self) -> &'static str {
        "recording"
    }
}

/// An AuditSink whose every write fails
pub struct FailingAuditSink {
    call_count: Arc<AtomicUsize>,
}

impl FailingAuditSink {
    pub fn new() -> Self {
        Self {
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _run: RunRecord) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::audit("database unavailable"))
    }

    fn sink_name(&self) -> &'static str {
        "failing"
    }
}
