//! JSON-RPC tool surface
//!
//! - [`ToolCatalog`]: the fixed list of tools, built once
//! - [`ToolDispatcher`]: request → response, stateless across requests
//! - [`envelope`]: wire types

pub mod catalog;
pub mod dispatcher;
pub mod envelope;

pub use catalog::{ToolCatalog, ToolDescriptor, ToolName};
pub use dispatcher::ToolDispatcher;
pub use envelope::{Method, RpcError, RpcOutcome, RpcRequest, RpcResponse, JSONRPC_VERSION};
