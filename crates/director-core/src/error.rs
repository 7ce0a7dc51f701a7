//! Centralized error types for the Director core.

use thiserror::Error;

/// Top-level error type for Director operations.
#[derive(Error, Debug)]
pub enum DirectorError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate alias '{0}' in workflow")]
    AliasConflict(String),

    #[error("Position {position} out of range (workflow has {len} nodes)")]
    RangeError { position: i64, len: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schema validation failed: expected {expected}, received {received}")]
    SchemaValidation { expected: String, received: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Ambiguous match for selector '{0}': {1} candidates")]
    AmbiguousMatch(String, usize),

    #[error("Navigation timed out after {0:?}")]
    NavigationTimeout(std::time::Duration),

    #[error("AI action failed: {0}")]
    AiActionFailed(String),

    #[error("Route had no matching branch")]
    RouteNoMatch,

    #[error("Expected an array for iteration variable '{variable}', got {actual_type}")]
    NotArray {
        variable: String,
        actual_type: String,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for Director operations.
pub type DirectorResult<T> = Result<T, DirectorError>;

impl DirectorError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// A single node execution failure
///
/// Distinct from `DirectorError`: this is a *value* returned alongside a
/// node result, not necessarily propagated as a Rust error — `iterate` and
/// `browser_query.validate` capture it instead of unwinding.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeFailure {
    pub node_id: String,
    #[serde(rename = "type")]
    pub failure_type: String,
    pub message: String,
    pub retriable: bool,
}

impl NodeFailure {
    pub fn new(node_id: impl Into<String>, failure_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            failure_type: failure_type.into(),
            message: message.into(),
            retriable: false,
        }
    }

    pub fn retriable(mut self) -> Self {
        self.retriable = true;
        self
    }
}

impl From<&DirectorError> for NodeFailure {
    fn from(err: &DirectorError) -> Self {
        let failure_type = match err {
            DirectorError::ElementNotFound(_) => "SelectorError.ElementNotFound",
            DirectorError::AmbiguousMatch(_, _) => "SelectorError.AmbiguousMatch",
            DirectorError::NavigationTimeout(_) => "ExecutionError.NavigationTimeout",
            DirectorError::AiActionFailed(_) => "ExecutionError.AIActionFailed",
            DirectorError::RouteNoMatch => "ExecutionError.RouteNoMatch",
            DirectorError::NotArray { .. } => "IterationError.NotArray",
            DirectorError::SchemaValidation { .. } => "ValidationError",
            DirectorError::StorageUnavailable(_) => "StorageError.Unavailable",
            DirectorError::WorkflowNotFound(_) => "StorageError.NotFound",
            DirectorError::AliasConflict(_) => "StorageError.AliasConflict",
            _ => "ExecutionError",
        };
        NodeFailure::new("", failure_type, err.to_string())
    }
}
