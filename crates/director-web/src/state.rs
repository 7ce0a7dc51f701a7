//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use director_agent::MockProvider;
use director_browser::{BrowserFacade, MockDriver};
use director_db::broadcast::{create_broadcast_channel, BroadcastSender};
use director_db::DbPool;

/// One browser session and one LLM conversation per workflow id, behind a
/// shared tool-event channel the way `cwa_web::AppState` shared one
/// WebSocket broadcast channel across all Kanban clients.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub events: BroadcastSender,
    pub llm: Arc<MockProvider>,
    sessions: Arc<Mutex<HashMap<String, Arc<BrowserFacade>>>>,
}

impl AppState {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            db,
            events: create_broadcast_channel(),
            llm: Arc::new(MockProvider::new()),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetch or open the workflow's browser session. No production
    /// `BrowserDriver` ships in this codebase (the driver contract is the
    /// extension point) so sessions run against `MockDriver`.
    pub fn session(&self, workflow_id: &str) -> Arc<BrowserFacade> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(workflow_id.to_string())
            .or_insert_with(|| Arc::new(BrowserFacade::new(Box::new(MockDriver::new()))))
            .clone()
    }

    pub fn has_session(&self, workflow_id: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(workflow_id)
    }

    pub fn end_session(&self, workflow_id: &str) -> bool {
        self.sessions.lock().unwrap().remove(workflow_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_db::DbPool;

    fn test_state() -> AppState {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        AppState::new(Arc::new(pool))
    }

    #[test]
    fn session_is_created_lazily_and_reused() {
        let state = test_state();
        assert!(!state.has_session("wf-1"));

        let first = state.session("wf-1");
        assert!(state.has_session("wf-1"));
        let second = state.session("wf-1");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn ending_a_session_removes_it() {
        let state = test_state();
        state.session("wf-1");
        assert!(state.end_session("wf-1"));
        assert!(!state.has_session("wf-1"));
        assert!(!state.end_session("wf-1"));
    }

    #[test]
    fn sessions_are_scoped_per_workflow() {
        let state = test_state();
        let a = state.session("wf-a");
        let b = state.session("wf-b");
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
