//! JSON-RPC 2.0 envelopes
//!
//! The request decoder is strict about top-level fields and lenient about
//! missing ones, matching what MCP-style clients actually send.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

/// Protocol version emitted on every response
pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound request envelope
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,

    /// Echoed back verbatim; any JSON value
    #[serde(default)]
    pub id: Value,

    #[serde(default)]
    pub method: String,

    /// Left undecoded until the method is known
    #[serde(default)]
    pub params: Option<Box<RawValue>>,
}

/// Protocol methods served by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ToolsList,
    ToolsCall,
}

impl Method {
    /// Look up a method by its wire name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            _ => None,
        }
    }

    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
        }
    }
}

/// `params` of a `tools/call` request
#[derive(Debug, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub name: String,

    /// Tool-specific; decoded by the tool itself
    #[serde(default)]
    pub arguments: Option<Box<RawValue>>,
}

/// Arguments shared by both StackFlow tools
#[derive(Debug, Default, Deserialize)]
pub struct ToolArguments {
    #[serde(default)]
    pub config_yaml: Option<String>,

    #[serde(default)]
    pub env: Option<String>,
}

/// Error object of a failed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Exactly one of `result` / `error`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    Result(Value),
    Error(RpcError),
}

/// Outbound response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    /// Successful response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: RpcOutcome::Result(result),
        }
    }

    /// Error response
    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: RpcOutcome::Error(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Error response for a crate error
    pub fn from_error(id: Value, err: &crate::Error) -> Self {
        Self::failure(id, err.rpc_code(), err.to_string())
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            RpcOutcome::Result(value) => Some(value),
            RpcOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            RpcOutcome::Result(_) => None,
            RpcOutcome::Error(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_rejects_unknown_fields() {
        let ok: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).unwrap();
        assert_eq!(ok.id, json!(7));
        assert!(ok.params.is_none());

        let err = serde_json::from_str::<RpcRequest>(
            r#"{"jsonrpc":"2.0","id":1,"method":"x","extra":true}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn missing_fields_default() {
        let req: RpcRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.jsonrpc, "");
        assert_eq!(req.id, Value::Null);
        assert_eq!(req.method, "");
    }

    #[test]
    fn params_stay_raw() {
        let req: RpcRequest = serde_json::from_str(
            r#"{"method":"tools/call","params":{"name":"t","arguments":{"config_yaml":"a: 1"}}}"#,
        )
        .unwrap();
        let call: ToolCall = serde_json::from_str(req.params.unwrap().get()).unwrap();
        assert_eq!(call.name, "t");
        assert_eq!(call.arguments.unwrap().get(), r#"{"config_yaml":"a: 1"}"#);
    }

    #[test]
    fn response_has_exactly_one_outcome() {
        let ok = serde_json::to_value(RpcResponse::success(json!("a"), json!({"x": 1}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": "a", "result": {"x": 1}}));

        let err = serde_json::to_value(RpcResponse::failure(Value::Null, -32700, "invalid JSON"))
            .unwrap();
        assert_eq!(
            err,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "invalid JSON"}})
        );
    }

    #[test]
    fn method_names_round_trip() {
        for method in [Method::Initialize, Method::ToolsList, Method::ToolsCall] {
            assert_eq!(Method::parse(method.as_str()), Some(method));
        }
        assert_eq!(Method::parse("resources/list"), None);
    }
}
