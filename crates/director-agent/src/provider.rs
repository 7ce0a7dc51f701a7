//! `MockProvider`: a scripted `LlmProvider` test double, grounded in
//! `director_browser::mock_driver::MockDriver`'s scripted-queue pattern.
//! Lets the control loop's recursion, cancellation, and token-accounting
//! logic be exercised without a live model.

use async_trait::async_trait;
use director_core::llm::{ChatRequest, ChatResponse, LlmProvider};
use director_core::{DirectorError, DirectorResult};
use std::sync::Mutex;

#[derive(Default)]
struct ScriptState {
    responses: Vec<ChatResponse>,
    requests: Vec<ChatRequest>,
}

/// Replies with pre-seeded `ChatResponse`s in order, one per `complete`
/// call. Every request it receives is recorded for assertions.
pub struct MockProvider {
    state: Mutex<ScriptState>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self { state: Mutex::new(ScriptState::default()) }
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, response: ChatResponse) {
        self.state.lock().unwrap().responses.push(response);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: ChatRequest) -> DirectorResult<ChatResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        if state.responses.is_empty() {
            return Err(DirectorError::Validation("MockProvider has no seeded responses left".to_string()));
        }
        Ok(state.responses.remove(0))
    }
}
