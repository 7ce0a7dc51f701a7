//! The driver contract: the seam between the Browser Facade
//! and a real Stagehand/Playwright-equivalent. Out of scope to implement
//! for real; `MockDriver` stands in for tests the way `DbPool::in_memory`
//! stands in for a real SQLite file.

use async_trait::async_trait;
use director_core::DirectorResult;
use director_core::dom::DomSnapshot;
use serde_json::Value;

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn new_page(&self, name: &str, url: &str) -> DirectorResult<()>;
    async fn close_page(&self, name: &str) -> DirectorResult<()>;
    async fn list_pages(&self) -> DirectorResult<Vec<String>>;

    async fn goto(&self, tab: &str, url: &str, wait_until: Option<&str>) -> DirectorResult<()>;
    async fn back(&self, tab: &str) -> DirectorResult<()>;
    async fn forward(&self, tab: &str) -> DirectorResult<()>;
    async fn refresh(&self, tab: &str) -> DirectorResult<()>;

    async fn click(&self, tab: &str, selector: &str, nth: usize) -> DirectorResult<()>;
    async fn type_text(&self, tab: &str, selector: &str, text: &str, nth: usize) -> DirectorResult<()>;
    async fn keypress(&self, tab: &str, key: &str, modifiers: &[String]) -> DirectorResult<()>;

    async fn wait_for_time(&self, ms: u64);
    async fn wait_for_selector(&self, tab: &str, selector: &str, timeout_ms: u64) -> DirectorResult<()>;
    async fn wait_for_navigation(&self, tab: &str, timeout_ms: u64) -> DirectorResult<()>;

    async fn scroll_into_view(&self, tab: &str, selector: &str) -> DirectorResult<bool>;
    async fn scroll_to_row(&self, tab: &str, index: i64, row_height: Option<f64>) -> DirectorResult<()>;

    async fn act(&self, tab: &str, instruction: &str, constraints: Option<&Value>) -> DirectorResult<String>;
    async fn extract(&self, tab: &str, instruction: &str, schema: &Value) -> DirectorResult<Value>;

    async fn screenshot(&self, tab: &str, full_page: bool) -> DirectorResult<Vec<u8>>;
    async fn current_url(&self, tab: &str) -> DirectorResult<String>;
    async fn title(&self, tab: &str) -> DirectorResult<String>;
    async fn dom_snapshot(&self, tab: &str) -> DirectorResult<DomSnapshot>;

    async fn save_profile(&self, name: &str) -> DirectorResult<()>;
    async fn load_profile(&self, name: &str) -> DirectorResult<()>;
    async fn list_profiles(&self) -> DirectorResult<Vec<String>>;
    async fn restore_profile(&self, name: &str) -> DirectorResult<()>;
}
