//! DOM snapshot data model.
//!
//! The toolkit operations that read and diff snapshots (`overview`,
//! `search`, `inspect`, `checkPortals`, ...) live in `director-browser`;
//! this module only defines the shared, serializable snapshot shape so
//! that both `director-browser` and `director-runtime` can reference it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cached, read-only view of a tab's DOM. Element ids (`[123]`) are valid
/// only within the snapshot that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomSnapshot {
    pub snapshot_id: String,
    pub tab_name: String,
    pub url: String,
    pub captured_at: String,
    pub element_index: HashMap<String, DomElement>,
}

impl DomSnapshot {
    pub fn get(&self, element_id: &str) -> Option<&DomElement> {
        self.element_index.get(element_id)
    }
}

/// A single element captured in a DOM snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomElement {
    pub id: String,
    pub tag: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    pub bounds: Bounds,
    #[serde(default)]
    pub text: Option<String>,
    /// Ids of ancestor elements, root-first.
    #[serde(default)]
    pub ancestry: Vec<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub in_viewport: bool,
    #[serde(default)]
    pub mounted_at_body: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DomElement {
    pub fn center(&self) -> (f64, f64) {
        (
            self.bounds.x + self.bounds.width / 2.0,
            self.bounds.y + self.bounds.height / 2.0,
        )
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(|s| s.as_str())
    }
}
