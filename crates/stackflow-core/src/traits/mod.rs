//! Collaborator interfaces consumed by the core
//!
//! - [`AuditSink`]: Record tool invocations for observability

pub mod audit_sink;

pub use audit_sink::{AuditSink, RunPhase, RunRecord, RunStatus};
