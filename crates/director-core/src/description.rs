//! Workflow description: an immutable version log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One version of a workflow's description. Versions are never mutated;
/// `appendVersion` always inserts `version = max + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDescription {
    pub workflow_id: String,
    pub version: i64,
    pub data: Value,
    pub reason: String,
    pub created_at: String,
}
