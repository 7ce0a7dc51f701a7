//! `POST /director/process`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use director_agent::{CancellationFlag, Director};
use director_core::conversation::TokenUsage;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProcessRequest {
    #[serde(rename = "workflowId")]
    pub workflow_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ProcessResponse {
    pub reply: String,
    pub tool_calls: usize,
    pub usage: TokenUsage,
}

pub async fn process(State(state): State<AppState>, Json(req): Json<ProcessRequest>) -> Result<Json<ProcessResponse>, (StatusCode, String)> {
    let browser = state.session(&req.workflow_id);
    let cancel = CancellationFlag::new();
    let director = Director::new(&state.db, req.workflow_id.clone(), &browser, state.llm.as_ref(), state.events.clone());

    let result = director.process(&req.message, &cancel).await.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ProcessResponse { reply: result.reply, tool_calls: result.tool_calls, usage: result.usage }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_core::llm::ChatResponse;
    use director_db::DbPool;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        AppState::new(Arc::new(pool))
    }

    #[tokio::test]
    async fn process_returns_the_providers_reply() {
        let state = test_state();
        state.llm.seed(ChatResponse {
            text: "hi there".to_string(),
            tool_calls: Vec::new(),
            reasoning_encrypted: None,
            reasoning_summary: None,
            usage: TokenUsage::default(),
        });

        let req = ProcessRequest { workflow_id: "wf-1".to_string(), message: "hello".to_string() };
        let response = process(State(state), Json(req)).await.unwrap();

        assert_eq!(response.0.reply, "hi there");
        assert_eq!(response.0.tool_calls, 0);
    }

    #[tokio::test]
    async fn a_provider_error_surfaces_as_a_500() {
        let state = test_state();
        // no seeded response: MockProvider errors on the first call

        let req = ProcessRequest { workflow_id: "wf-1".to_string(), message: "hello".to_string() };
        let (status, _) = process(State(state), Json(req)).await.unwrap_err();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
