// # stackflow-core
//
// Core library for the StackFlow control plane.
//
// ## Architecture Overview
//
// ```text
// bytes ─► document::parse ─► overlay::apply_overlay ─► validate::validate
//                                      │                       │
//                                      ▼                       ▼
//                               plan::compile ──────────► DnsPlan
//                                      │
//                                      ▼
//                          rpc::ToolDispatcher (JSON-RPC)
// ```
//
// - **document**: YAML → immutable document tree
// - **overlay**: shallow per-environment overrides of `global`
// - **record**: canonical form of one DNS record
// - **validate**: fail-fast structural and zone checks
// - **plan**: ordered, normalized DNS record plan
// - **rpc**: tool catalog and stateless JSON-RPC dispatcher
// - **traits**: collaborator interfaces (audit sink)
//
// ## Design Principles
//
// 1. **Pure pipeline**: parsing, validation and planning share no state
// 2. **Fail fast**: the first violation is reported with its document path
// 3. **Library-first**: the daemon is a thin HTTP wrapper around `rpc`
// 4. **No persistence**: audit storage lives behind the `AuditSink` trait

pub mod config;
pub mod document;
pub mod error;
pub mod overlay;
pub mod plan;
pub mod record;
pub mod rpc;
pub mod traits;
pub mod validate;

// Re-export core types for convenience
pub use config::{AuditConfig, ServerConfig, ServerInfo};
pub use document::{Document, Scalar};
pub use error::{Error, Result, ValidationError};
pub use overlay::apply_overlay;
pub use plan::{DnsPlan, PlannedRecord, compile};
pub use record::{DnsRecord, RecordValue, normalize};
pub use rpc::{ToolCatalog, ToolDispatcher};
pub use traits::{AuditSink, RunPhase, RunRecord, RunStatus};
pub use validate::{ValidationReport, validate};
