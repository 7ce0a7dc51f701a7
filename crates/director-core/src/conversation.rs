//! Conversation log domain model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

impl Role {
    pub fn from_str(s: &str) -> Self {
        match s {
            "assistant" => Self::Assistant,
            "tool" => Self::Tool,
            "system" => Self::System,
            _ => Self::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::System => "system",
        }
    }
}

/// Token usage for a single completion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub reasoning: u64,
    pub total: u64,
    pub cost: f64,
}

/// One append-only conversation turn entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub workflow_id: String,
    pub seq: i64,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub tool_calls: Option<Value>,
    #[serde(default)]
    pub reasoning_encrypted: Option<String>,
    #[serde(default)]
    pub tokens: Option<TokenUsage>,
    pub created_at: String,
}
