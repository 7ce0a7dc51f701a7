//! Browser state echo stored alongside a workflow.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    pub name: String,
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrowserState {
    pub tabs: Vec<Tab>,
    pub active_tab: Option<String>,
    pub last_snapshot_id: Option<String>,
}

impl BrowserState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tab(&self, name: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.name == name)
    }
}
