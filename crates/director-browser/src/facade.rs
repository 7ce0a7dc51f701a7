//! Uniform wrapper around a `BrowserDriver`: navigation,
//! tabs, deterministic interaction, scrolling helpers, AI-assisted
//! action/extraction, and observability.

use crate::driver::BrowserDriver;
use crate::nth::resolve_nth;
use crate::snapshot_cache::SnapshotCache;
use director_core::browser_state::{BrowserState, Tab};
use director_core::dom::DomSnapshot;
use director_core::{DirectorError, DirectorResult};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BrowserFacade {
    driver: Box<dyn BrowserDriver>,
    state: Mutex<BrowserState>,
    snapshots: SnapshotCache,
}

impl BrowserFacade {
    pub fn new(driver: Box<dyn BrowserDriver>) -> Self {
        Self {
            driver,
            state: Mutex::new(BrowserState::empty()),
            snapshots: SnapshotCache::default(),
        }
    }

    pub fn state(&self) -> BrowserState {
        self.state.lock().unwrap().clone()
    }

    fn require_tab(&self, tab: Option<&str>) -> DirectorResult<String> {
        let state = self.state.lock().unwrap();
        match tab {
            Some(t) => Ok(t.to_string()),
            None => state
                .active_tab
                .clone()
                .ok_or_else(|| DirectorError::Validation("no active tab and none specified".into())),
        }
    }

    // --- Tabs ---

    pub async fn open_tab(&self, name: &str, url: &str) -> DirectorResult<()> {
        self.driver.new_page(name, url).await?;
        let mut state = self.state.lock().unwrap();
        for t in state.tabs.iter_mut() {
            t.active = false;
        }
        state.tabs.push(Tab { name: name.to_string(), url: url.to_string(), active: true });
        state.active_tab = Some(name.to_string());
        Ok(())
    }

    pub async fn close_tab(&self, name: &str) -> DirectorResult<()> {
        self.driver.close_page(name).await?;
        let mut state = self.state.lock().unwrap();
        state.tabs.retain(|t| t.name != name);
        if state.active_tab.as_deref() == Some(name) {
            state.active_tab = state.tabs.first().map(|t| t.name.clone());
        }
        self.snapshots.invalidate(name);
        Ok(())
    }

    pub fn switch_tab(&self, name: &str) -> DirectorResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.tabs.iter().any(|t| t.name == name) {
            return Err(DirectorError::Validation(format!("unknown tab '{name}'")));
        }
        for t in state.tabs.iter_mut() {
            t.active = t.name == name;
        }
        state.active_tab = Some(name.to_string());
        Ok(())
    }

    pub fn list_tabs(&self) -> Vec<Tab> {
        self.state.lock().unwrap().tabs.clone()
    }

    pub fn current_tab(&self) -> Option<String> {
        self.state.lock().unwrap().active_tab.clone()
    }

    // --- Navigation ---

    pub async fn navigate(&self, url: &str, tab: Option<&str>, wait_until: Option<&str>) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        self.driver.goto(&tab, url, wait_until).await?;
        self.update_tab_url(&tab, url);
        self.snapshots.invalidate(&tab);
        Ok(())
    }

    pub async fn back(&self, tab: Option<&str>) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        self.driver.back(&tab).await?;
        self.snapshots.invalidate(&tab);
        Ok(())
    }

    pub async fn forward(&self, tab: Option<&str>) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        self.driver.forward(&tab).await?;
        self.snapshots.invalidate(&tab);
        Ok(())
    }

    pub async fn refresh(&self, tab: Option<&str>) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        self.driver.refresh(&tab).await?;
        self.snapshots.invalidate(&tab);
        Ok(())
    }

    fn update_tab_url(&self, tab: &str, url: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(t) = state.tabs.iter_mut().find(|t| t.name == tab) {
            t.url = url.to_string();
        }
    }

    // --- Waits ---

    pub async fn wait_time(&self, ms: u64) {
        self.driver.wait_for_time(ms).await;
    }

    pub async fn wait_selector(&self, tab: Option<&str>, selector: &str, timeout_ms: Option<u64>) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        self.driver
            .wait_for_selector(&tab, selector, timeout_ms.unwrap_or(DEFAULT_OP_TIMEOUT.as_millis() as u64))
            .await
            .map_err(|_| DirectorError::ElementNotFound(selector.to_string()))
    }

    pub async fn wait_navigation(&self, tab: Option<&str>, timeout_ms: Option<u64>) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        self.driver
            .wait_for_navigation(&tab, timeout_ms.unwrap_or(DEFAULT_OP_TIMEOUT.as_millis() as u64))
            .await
            .map_err(|_| DirectorError::NavigationTimeout(DEFAULT_OP_TIMEOUT))
    }

    // --- Deterministic interaction ---

    pub async fn click(&self, tab: Option<&str>, selector: &str, nth: &Value) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        let index = resolve_nth(nth, 1).unwrap_or(0);
        self.driver.click(&tab, selector, index).await?;
        self.snapshots.invalidate(&tab);
        Ok(())
    }

    pub async fn type_text(&self, tab: Option<&str>, selector: &str, text: &str, nth: &Value) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        let index = resolve_nth(nth, 1).unwrap_or(0);
        self.driver.type_text(&tab, selector, text, index).await?;
        self.snapshots.invalidate(&tab);
        Ok(())
    }

    pub async fn keypress(&self, tab: Option<&str>, key: &str, modifiers: &[String]) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        self.driver.keypress(&tab, key, modifiers).await?;
        self.snapshots.invalidate(&tab);
        Ok(())
    }

    // --- Scrolling ---

    pub async fn scroll_into_view(&self, tab: Option<&str>, selector: &str, max_attempts: Option<u32>) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        let attempts = max_attempts.unwrap_or(10).max(1);
        for _ in 0..attempts {
            if self.driver.scroll_into_view(&tab, selector).await? {
                self.snapshots.invalidate(&tab);
                return Ok(());
            }
        }
        Err(DirectorError::ElementNotFound(selector.to_string()))
    }

    pub async fn scroll_to_row(&self, tab: Option<&str>, index: i64, row_height: Option<f64>) -> DirectorResult<()> {
        let tab = self.require_tab(tab)?;
        self.driver.scroll_to_row(&tab, index, row_height).await?;
        self.snapshots.invalidate(&tab);
        Ok(())
    }

    // --- AI-assisted ---

    pub async fn ai_act(&self, tab: Option<&str>, instruction: &str, constraints: Option<&Value>) -> DirectorResult<String> {
        let tab = self.require_tab(tab)?;
        let result = self.driver.act(&tab, instruction, constraints).await?;
        self.snapshots.invalidate(&tab);
        Ok(result)
    }

    pub async fn ai_extract(&self, tab: Option<&str>, instruction: &str, schema: &Value) -> DirectorResult<Value> {
        let tab = self.require_tab(tab)?;
        self.driver.extract(&tab, instruction, schema).await
    }

    // --- Observability ---

    pub async fn screenshot(&self, tab: Option<&str>, full_page: bool) -> DirectorResult<Vec<u8>> {
        let tab = self.require_tab(tab)?;
        self.driver.screenshot(&tab, full_page).await
    }

    pub async fn current_url(&self, tab: Option<&str>) -> DirectorResult<String> {
        let tab = self.require_tab(tab)?;
        self.driver.current_url(&tab).await
    }

    pub async fn title(&self, tab: Option<&str>) -> DirectorResult<String> {
        let tab = self.require_tab(tab)?;
        self.driver.title(&tab).await
    }

    pub async fn dom_snapshot(&self, tab: Option<&str>) -> DirectorResult<DomSnapshot> {
        let tab = self.require_tab(tab)?;
        if let Some(cached) = self.snapshots.get(&tab) {
            return Ok(cached);
        }
        let snapshot = self.driver.dom_snapshot(&tab).await?;
        self.snapshots.put(&tab, snapshot.clone());
        let mut state = self.state.lock().unwrap();
        state.last_snapshot_id = Some(snapshot.snapshot_id.clone());
        Ok(snapshot)
    }

    // --- Profiles ---

    pub async fn save_profile(&self, name: &str) -> DirectorResult<()> {
        self.driver.save_profile(name).await
    }

    pub async fn load_profile(&self, name: &str) -> DirectorResult<()> {
        self.driver.load_profile(name).await
    }

    pub async fn list_profiles(&self) -> DirectorResult<Vec<String>> {
        self.driver.list_profiles().await
    }

    pub async fn restore_profile(&self, name: &str) -> DirectorResult<()> {
        self.driver.restore_profile(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_driver::MockDriver;

    #[tokio::test]
    async fn open_tab_becomes_active() {
        let facade = BrowserFacade::new(Box::new(MockDriver::new()));
        facade.open_tab("main", "https://example.com").await.unwrap();
        assert_eq!(facade.current_tab(), Some("main".to_string()));
    }

    #[tokio::test]
    async fn navigate_without_tab_argument_uses_active_tab() {
        let facade = BrowserFacade::new(Box::new(MockDriver::new()));
        facade.open_tab("main", "https://example.com").await.unwrap();
        facade.navigate("https://example.com/next", None, None).await.unwrap();
        assert_eq!(facade.current_url(None).await.unwrap(), "https://example.com/next");
    }

    #[tokio::test]
    async fn navigate_without_any_tab_fails() {
        let facade = BrowserFacade::new(Box::new(MockDriver::new()));
        assert!(facade.navigate("https://example.com", None, None).await.is_err());
    }

    #[tokio::test]
    async fn dom_snapshot_is_cached_until_invalidated() {
        let facade = BrowserFacade::new(Box::new(MockDriver::new()));
        facade.open_tab("main", "https://example.com").await.unwrap();
        let first = facade.dom_snapshot(None).await.unwrap();
        let second = facade.dom_snapshot(None).await.unwrap();
        assert_eq!(first.snapshot_id, second.snapshot_id);

        facade.click(None, "#submit", &Value::Null).await.unwrap();
        let third = facade.dom_snapshot(None).await.unwrap();
        assert_ne!(first.snapshot_id, third.snapshot_id);
    }
}
