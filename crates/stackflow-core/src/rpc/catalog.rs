//! Tool catalog
//!
//! The catalog is fixed: two tools, built once at startup and shared
//! read-only by every request.

use serde::Serialize;
use serde_json::{Value, json};

use crate::traits::RunPhase;

/// The tools this server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    /// `stackflow.validate`
    Validate,
    /// `stackflow.plan.dns`
    PlanDns,
}

impl ToolName {
    /// Every tool, in catalog order
    pub const ALL: [ToolName; 2] = [ToolName::Validate, ToolName::PlanDns];

    /// Look up a tool by its wire name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "stackflow.validate" => Some(Self::Validate),
            "stackflow.plan.dns" => Some(Self::PlanDns),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "stackflow.validate",
            Self::PlanDns => "stackflow.plan.dns",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Validate => "Validate StackFlow config (schema + constraints).",
            Self::PlanDns => "Generate DNS plan from StackFlow config.",
        }
    }

    /// Audit phase recorded for invocations of this tool
    pub fn phase(&self) -> RunPhase {
        match self {
            Self::Validate => RunPhase::Validate,
            Self::PlanDns => RunPhase::DnsPlan,
        }
    }
}

/// One `tools/list` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Read-only list of tool descriptors
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    /// Build the catalog of StackFlow tools
    pub fn new() -> Self {
        let tools = ToolName::ALL
            .iter()
            .map(|tool| ToolDescriptor {
                name: tool.as_str().to_string(),
                description: tool.description().to_string(),
                input_schema: config_input_schema(),
            })
            .collect();
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// The tool served under `name`, if it is in the catalog
    pub fn get(&self, name: &str) -> Option<ToolName> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .and_then(|t| ToolName::parse(&t.name))
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// `config_yaml` required, `env` optional
fn config_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "config_yaml": {"type": "string"},
            "env": {"type": "string"}
        },
        "required": ["config_yaml"]
    })
}
