//! Minimal embedding example for stackflow-core
//!
//! Uses the pipeline directly, then drives the JSON-RPC dispatcher in
//! process with a custom audit sink alongside the in-memory one.

use stackflow_audit::MemoryAuditSink;
use stackflow_core::document;
use stackflow_core::{
    AuditSink, Result, RunRecord, ServerInfo, ToolCatalog, ToolDispatcher, compile, validate,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const STACK: &str = r#"
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
targets:
  - id: api
    type: service
    domains: [api.example.com]
    dns:
      records:
        - {name: api, type: a, value: 1.2.3.4, ttl: 300}
  - id: site
    type: bucket
    domains: [www.example.com]
    dns:
      records:
        - {name: www, type: cname, valueFrom: site-endpoint}
"#;

/// Audit sink that prints each run and forwards it to an in-memory sink
struct PrintingAuditSink {
    inner: MemoryAuditSink,
    printed: AtomicUsize,
}

impl PrintingAuditSink {
    fn new(inner: MemoryAuditSink) -> Self {
        Self {
            inner,
            printed: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl AuditSink for PrintingAuditSink {
    async fn record(&self, run: RunRecord) -> Result<String> {
        self.printed.fetch_add(1, Ordering::SeqCst);
        println!(
            "[Embedded] audit: stack={} env={:?} phase={:?} status={:?}",
            run.stack, run.env, run.phase, run.status
        );
        self.inner.record(run).await
    }

    fn sink_name(&self) -> &'static str {
        "printing"
    }
}

fn call(id: u64, tool: &str, env: &str) -> Vec<u8> {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": tool, "arguments": {"config_yaml": STACK, "env": env}},
    })
    .to_string()
    .into_bytes()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Embedded stackflow-core Example ===\n");

    // Library calls
    let doc = document::parse(STACK.as_bytes())?;
    let report = validate(&doc)?;
    println!("validated {} ({} targets)", report.stack, report.target_count);

    let plan = compile(&doc, "prod")?;
    println!("plan for {} via {}:", plan.env, plan.global.dns_provider);
    for record in &plan.records {
        println!("  {}", serde_json::to_string(record)?);
    }

    // Same tools through the dispatcher
    let memory = MemoryAuditSink::new();
    let sink = Arc::new(PrintingAuditSink::new(memory.clone()));
    let dispatcher = ToolDispatcher::new(Arc::new(ToolCatalog::new()), ServerInfo::default())
        .with_audit(sink.clone(), Some("embedded".to_string()));

    for (id, tool, env) in [
        (1, "stackflow.validate", ""),
        (2, "stackflow.plan.dns", "prod"),
        (3, "stackflow.plan.dns", "staging"),
    ] {
        let response = dispatcher.handle(&call(id, tool, env)).await;
        println!("\n{tool} env={env:?}\n{}", serde_json::to_string_pretty(&response)?);
    }

    println!(
        "\n=== {} run(s) printed, {} kept in memory ===",
        sink.printed.load(Ordering::SeqCst),
        memory.len().await
    );
    Ok(())
}
