//! Workflow node domain model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node in a workflow graph.
///
/// `position` is 1-based and dense within a workflow; `alias` is a stable,
/// human-chosen identifier that survives position shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub position: i64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub alias: String,
    pub config: Value,
    pub description: Option<String>,
    pub status: NodeStatus,
    pub result: Option<Value>,
    pub store_variable: bool,
}

/// The ten node types supported by the Workflow Runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    BrowserAction,
    BrowserAiExtract,
    BrowserAiAction,
    BrowserQuery,
    Cognition,
    Context,
    Iterate,
    Route,
    Transform,
    Handle,
}

impl NodeType {
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "browser_action" => Self::BrowserAction,
            "browser_ai_extract" => Self::BrowserAiExtract,
            "browser_ai_action" => Self::BrowserAiAction,
            "browser_query" => Self::BrowserQuery,
            "cognition" => Self::Cognition,
            "context" => Self::Context,
            "iterate" => Self::Iterate,
            "route" => Self::Route,
            "transform" => Self::Transform,
            "handle" => Self::Handle,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrowserAction => "browser_action",
            Self::BrowserAiExtract => "browser_ai_extract",
            Self::BrowserAiAction => "browser_ai_action",
            Self::BrowserQuery => "browser_query",
            Self::Cognition => "cognition",
            Self::Context => "context",
            Self::Iterate => "iterate",
            Self::Route => "route",
            Self::Transform => "transform",
            Self::Handle => "handle",
        }
    }

    /// Control-flow node types carry child node positions (`iterate.body`,
    /// `route[i].branch`) that must be rewritten when positions shift.
    pub fn is_control_flow(&self) -> bool {
        matches!(self, Self::Iterate | Self::Route | Self::Handle)
    }
}

/// Lifecycle status of a node's last (or current) execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl NodeStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "success" => Self::Success,
            "failed" => Self::Failed,
            "skipped" => Self::Skipped,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// A placeholder for inserting a node either at the end, at a numeric
/// position (shifting everything at or after it), or replacing an existing
/// node by alias/id.
#[derive(Debug, Clone)]
pub enum UpsertTarget {
    End,
    Position(i64),
    ReplaceByAlias(String),
    ReplaceById(String),
}

/// An item to upsert via `State Store::upsertNodes`.
#[derive(Debug, Clone)]
pub struct NodeUpsert {
    pub target: UpsertTarget,
    pub node_type: NodeType,
    pub alias: String,
    pub config: Value,
    pub description: Option<String>,
    pub store_variable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_round_trips_through_str() {
        for nt in [
            NodeType::BrowserAction,
            NodeType::BrowserAiExtract,
            NodeType::BrowserAiAction,
            NodeType::BrowserQuery,
            NodeType::Cognition,
            NodeType::Context,
            NodeType::Iterate,
            NodeType::Route,
            NodeType::Transform,
            NodeType::Handle,
        ] {
            assert_eq!(NodeType::from_str(nt.as_str()), Some(nt));
        }
    }

    #[test]
    fn control_flow_types_are_flagged() {
        assert!(NodeType::Iterate.is_control_flow());
        assert!(NodeType::Route.is_control_flow());
        assert!(!NodeType::BrowserAction.is_control_flow());
    }
}
