//! Shared broadcast channel for tool-call lifecycle events.
//!
//! Consumed by `director-agent` (publisher, one event per tool-call
//! lifecycle transition) and `director-web` (subscriber, forwarded to SSE
//! clients on `/director/tool-stream`)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Tool-call lifecycle event
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(tag = "event")]
pub enum ToolEvent {
    #[serde(rename = "tool.start")]
    Start {
        workflow_id: String,
        name: String,
        args: Value,
        at: String,
    },
    #[serde(rename = "tool.result")]
    Result {
        workflow_id: String,
        name: String,
        result: Value,
        at: String,
    },
    #[serde(rename = "tool.error")]
    Error {
        workflow_id: String,
        name: String,
        error: String,
        at: String,
    },
}

impl ToolEvent {
    pub fn workflow_id(&self) -> &str {
        match self {
            Self::Start { workflow_id, .. }
            | Self::Result { workflow_id, .. }
            | Self::Error { workflow_id, .. } => workflow_id,
        }
    }
}

/// Type alias for the broadcast sender.
pub type BroadcastSender = broadcast::Sender<ToolEvent>;

/// Type alias for the broadcast receiver.
pub type BroadcastReceiver = broadcast::Receiver<ToolEvent>;

/// Create a new broadcast channel with default capacity.
pub fn create_broadcast_channel() -> BroadcastSender {
    let (tx, _rx) = broadcast::channel(100);
    tx
}
