//! Stateless JSON-RPC dispatcher
//!
//! ## Request Flow
//!
//! ```text
//! body ─► decode envelope ─► Method ─┬─ initialize ─► server info
//!            │ (-32700)              ├─ tools/list ─► catalog
//!            ▼                       ├─ tools/call ─► ToolName ─► parse ─► validate / compile
//!         error                      └─ other      ─► -32601
//! ```
//!
//! Every failure becomes an error response; `handle` itself never fails.
//! Tool execution runs behind a panic guard, and audit records are written
//! after the result is known without affecting it.

use chrono::{SecondsFormat, Utc};
use serde_json::value::RawValue;
use serde_json::{Value, json};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::catalog::{ToolCatalog, ToolName};
use super::envelope::{
    JSONRPC_VERSION, Method, RpcRequest, RpcResponse, ToolArguments, ToolCall,
};
use crate::config::ServerInfo;
use crate::document::{self, Document};
use crate::error::{APPLICATION_ERROR, Error, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR, Result};
use crate::overlay::apply_overlay;
use crate::plan::compile;
use crate::traits::{AuditSink, RunRecord, RunStatus};
use crate::validate::validate;

/// JSON-RPC front door for the StackFlow tools
///
/// Cheap to share: wrap it in an `Arc` and hand it to every request task.
pub struct ToolDispatcher {
    catalog: Arc<ToolCatalog>,
    server: ServerInfo,
    audit: Option<Arc<dyn AuditSink>>,
    actor: Option<String>,
}

impl ToolDispatcher {
    /// Create a dispatcher over a prebuilt catalog
    pub fn new(catalog: Arc<ToolCatalog>, server: ServerInfo) -> Self {
        Self {
            catalog,
            server,
            audit: None,
            actor: None,
        }
    }

    /// Record every tool invocation to `sink`, stamped with `actor`
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>, actor: Option<String>) -> Self {
        self.audit = Some(sink);
        self.actor = actor;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Handle one request body and produce its response
    pub async fn handle(&self, body: &[u8]) -> RpcResponse {
        let request: RpcRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "rejecting undecodable request");
                return RpcResponse::failure(Value::Null, PARSE_ERROR, "invalid JSON");
            }
        };

        let RpcRequest {
            jsonrpc,
            id,
            method,
            params,
        } = request;
        let jsonrpc = if jsonrpc.is_empty() {
            JSONRPC_VERSION.to_string()
        } else {
            jsonrpc
        };
        debug!(method = %method, jsonrpc = %jsonrpc, id = %id, "dispatching request");

        match self.dispatch(&method, params.as_deref()).await {
            Ok(result) => RpcResponse::success(id, result),
            Err(err) => {
                debug!(method = %method, error = %err, "request failed");
                RpcResponse::from_error(id, &err)
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Option<&RawValue>) -> Result<Value> {
        match Method::parse(method) {
            Some(Method::Initialize) => Ok(self.initialize()),
            Some(Method::ToolsList) => Ok(json!({ "tools": self.catalog.tools() })),
            Some(Method::ToolsCall) => self.call_tool(params).await,
            None => Err(Error::protocol(METHOD_NOT_FOUND, "method not found")),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "server": {
                "name": self.server.name,
                "version": self.server.version,
            },
            "capabilities": {
                "tools": true,
            },
            "time": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    async fn call_tool(&self, params: Option<&RawValue>) -> Result<Value> {
        let call: ToolCall = params
            .and_then(|raw| serde_json::from_str(raw.get()).ok())
            .filter(|call: &ToolCall| !call.name.is_empty())
            .ok_or_else(|| Error::protocol(INVALID_PARAMS, "invalid params"))?;

        let Some(tool) = self.catalog.get(&call.name) else {
            return Err(Error::protocol(
                APPLICATION_ERROR,
                format!("unknown tool: {}", call.name),
            ));
        };

        let args = call
            .arguments
            .as_deref()
            .and_then(|raw| serde_json::from_str::<ToolArguments>(raw.get()).ok())
            .unwrap_or_default();
        let Some(config_yaml) = args.config_yaml.filter(|c| !c.is_empty()) else {
            return Err(Error::protocol(APPLICATION_ERROR, "missing config_yaml"));
        };
        let env = args.env.unwrap_or_default();

        let mut run = RunRecord::new("", env.as_str(), tool.phase());
        let mut stack = String::new();
        let outcome = guarded(|| {
            let doc = document::parse(config_yaml.as_bytes())?;
            stack = document::stack_name(&doc).unwrap_or_default();
            run_tool(tool, &doc, &env)
        });

        run.stack = stack;
        self.record_run(tool, run, &env, &outcome).await;
        outcome
    }

    async fn record_run(&self, tool: ToolName, mut run: RunRecord, env: &str, outcome: &Result<Value>) {
        let Some(sink) = &self.audit else {
            return;
        };

        run.actor = self.actor.clone();
        run.inputs = json!({ "tool": tool.as_str(), "env": env });
        let run = match outcome {
            Ok(result) => run.finish(RunStatus::Ok, result.clone()),
            Err(e) => run.finish(RunStatus::Failed, json!({ "error": e.to_string() })),
        };

        match sink.record(run).await {
            Ok(run_id) => debug!(run_id = %run_id, sink = sink.sink_name(), "recorded run"),
            Err(e) => warn!(error = %e, sink = sink.sink_name(), "failed to record run"),
        }
    }
}

/// Execute one tool against a parsed document
fn run_tool(tool: ToolName, doc: &Document, env: &str) -> Result<Value> {
    match tool {
        ToolName::Validate => {
            let report = if env.is_empty() {
                validate(doc)?
            } else {
                validate(&apply_overlay(doc, env))?
            };
            Ok(serde_json::to_value(report)?)
        }
        ToolName::PlanDns => Ok(serde_json::to_value(compile(doc, env)?)?),
    }
}

/// Run `f`, turning a panic into [`Error::Internal`]
pub(crate) fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            error!(detail = %detail, "tool execution panicked");
            Err(Error::internal("tool execution panicked"))
        }
    }
}
