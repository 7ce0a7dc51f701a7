//! Plan domain model.

use serde::{Deserialize, Serialize};

/// The Director's working plan for a workflow: phases of tasks tracked
/// across turns so progress survives conversation compaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub overall_goal: String,
    pub current_phase: Option<String>,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub next_actions: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Plan {
    pub fn empty(overall_goal: impl Into<String>) -> Self {
        Self {
            overall_goal: overall_goal.into(),
            current_phase: None,
            phases: Vec::new(),
            next_actions: Vec::new(),
            blockers: Vec::new(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub phase_name: String,
    pub status: PlanStatus,
    pub tasks: Vec<PlanTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTask {
    pub task_id: String,
    pub description: String,
    pub status: PlanStatus,
    #[serde(default)]
    pub node_ids: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Status shared by phases and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl PlanStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}
