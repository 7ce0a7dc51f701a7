//! In-memory `BrowserDriver` used by `director-browser` and
//! `director-runtime` tests, grounded in `DbPool::in_memory`'s role as a
//! real-thing stand-in for the same trait used in production.

use crate::driver::BrowserDriver;
use async_trait::async_trait;
use director_core::dom::{Bounds, DomElement, DomSnapshot};
use director_core::{DirectorError, DirectorResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct MockState {
    pages: HashMap<String, String>,
    profiles: Vec<String>,
    act_script: Vec<String>,
    extract_script: Vec<Value>,
}

/// A scripted driver: navigation and clicks just record/update in-memory
/// state; `act`/`extract` pop pre-seeded responses so tests can exercise
/// the runtime's node semantics without a real page.
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_act(&self, response: impl Into<String>) {
        self.state.lock().unwrap().act_script.push(response.into());
    }

    pub fn seed_extract(&self, response: Value) {
        self.state.lock().unwrap().extract_script.push(response);
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn new_page(&self, name: &str, url: &str) -> DirectorResult<()> {
        self.state.lock().unwrap().pages.insert(name.to_string(), url.to_string());
        Ok(())
    }

    async fn close_page(&self, name: &str) -> DirectorResult<()> {
        self.state.lock().unwrap().pages.remove(name);
        Ok(())
    }

    async fn list_pages(&self) -> DirectorResult<Vec<String>> {
        Ok(self.state.lock().unwrap().pages.keys().cloned().collect())
    }

    async fn goto(&self, tab: &str, url: &str, _wait_until: Option<&str>) -> DirectorResult<()> {
        self.state.lock().unwrap().pages.insert(tab.to_string(), url.to_string());
        Ok(())
    }

    async fn back(&self, _tab: &str) -> DirectorResult<()> {
        Ok(())
    }

    async fn forward(&self, _tab: &str) -> DirectorResult<()> {
        Ok(())
    }

    async fn refresh(&self, _tab: &str) -> DirectorResult<()> {
        Ok(())
    }

    async fn click(&self, _tab: &str, selector: &str, _nth: usize) -> DirectorResult<()> {
        if selector.is_empty() {
            return Err(DirectorError::ElementNotFound(selector.to_string()));
        }
        Ok(())
    }

    async fn type_text(&self, _tab: &str, selector: &str, _text: &str, _nth: usize) -> DirectorResult<()> {
        if selector.is_empty() {
            return Err(DirectorError::ElementNotFound(selector.to_string()));
        }
        Ok(())
    }

    async fn keypress(&self, _tab: &str, _key: &str, _modifiers: &[String]) -> DirectorResult<()> {
        Ok(())
    }

    async fn wait_for_time(&self, _ms: u64) {}

    async fn wait_for_selector(&self, _tab: &str, _selector: &str, _timeout_ms: u64) -> DirectorResult<()> {
        Ok(())
    }

    async fn wait_for_navigation(&self, _tab: &str, _timeout_ms: u64) -> DirectorResult<()> {
        Ok(())
    }

    async fn scroll_into_view(&self, _tab: &str, _selector: &str) -> DirectorResult<bool> {
        Ok(true)
    }

    async fn scroll_to_row(&self, _tab: &str, _index: i64, _row_height: Option<f64>) -> DirectorResult<()> {
        Ok(())
    }

    async fn act(&self, _tab: &str, instruction: &str, _constraints: Option<&Value>) -> DirectorResult<String> {
        let mut state = self.state.lock().unwrap();
        if !state.act_script.is_empty() {
            return Ok(state.act_script.remove(0));
        }
        Err(DirectorError::AiActionFailed(format!(
            "no element matched instruction: {instruction}"
        )))
    }

    async fn extract(&self, _tab: &str, _instruction: &str, _schema: &Value) -> DirectorResult<Value> {
        let mut state = self.state.lock().unwrap();
        if !state.extract_script.is_empty() {
            return Ok(state.extract_script.remove(0));
        }
        Ok(json!({}))
    }

    async fn screenshot(&self, _tab: &str, _full_page: bool) -> DirectorResult<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn current_url(&self, tab: &str) -> DirectorResult<String> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pages
            .get(tab)
            .cloned()
            .unwrap_or_default())
    }

    async fn title(&self, _tab: &str) -> DirectorResult<String> {
        Ok("Mock Page".to_string())
    }

    async fn dom_snapshot(&self, tab: &str) -> DirectorResult<DomSnapshot> {
        let mut element_index = HashMap::new();
        element_index.insert(
            "1".to_string(),
            DomElement {
                id: "1".to_string(),
                tag: "button".to_string(),
                attrs: HashMap::new(),
                bounds: Bounds { x: 0.0, y: 0.0, width: 100.0, height: 20.0 },
                text: Some("Submit".to_string()),
                ancestry: Vec::new(),
                role: Some("button".to_string()),
                visible: true,
                in_viewport: true,
                mounted_at_body: false,
            },
        );
        Ok(DomSnapshot {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            tab_name: tab.to_string(),
            url: self.current_url(tab).await?,
            captured_at: chrono::Utc::now().to_rfc3339(),
            element_index,
        })
    }

    async fn save_profile(&self, name: &str) -> DirectorResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.profiles.contains(&name.to_string()) {
            state.profiles.push(name.to_string());
        }
        Ok(())
    }

    async fn load_profile(&self, _name: &str) -> DirectorResult<()> {
        Ok(())
    }

    async fn list_profiles(&self) -> DirectorResult<Vec<String>> {
        Ok(self.state.lock().unwrap().profiles.clone())
    }

    async fn restore_profile(&self, _name: &str) -> DirectorResult<()> {
        Ok(())
    }
}
