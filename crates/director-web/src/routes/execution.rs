//! `POST /execution/start` / `POST /execution/stop`: lifecycle
//! of a workflow's browser session.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct SessionRequest {
    #[serde(rename = "workflowId")]
    pub workflow_id: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    #[serde(rename = "workflowId")]
    pub workflow_id: String,
    pub active: bool,
}

pub async fn start(State(state): State<AppState>, Json(req): Json<SessionRequest>) -> Json<SessionResponse> {
    state.session(&req.workflow_id);
    Json(SessionResponse { workflow_id: req.workflow_id, active: true })
}

pub async fn stop(State(state): State<AppState>, Json(req): Json<SessionRequest>) -> Json<SessionResponse> {
    state.end_session(&req.workflow_id);
    Json(SessionResponse { workflow_id: req.workflow_id, active: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_db::DbPool;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        AppState::new(Arc::new(pool))
    }

    #[tokio::test]
    async fn start_then_stop_toggles_session_liveness() {
        let state = test_state();
        let req = SessionRequest { workflow_id: "wf-1".to_string() };

        let started = start(State(state.clone()), Json(SessionRequest { workflow_id: req.workflow_id.clone() })).await;
        assert!(started.0.active);
        assert!(state.has_session("wf-1"));

        let stopped = stop(State(state.clone()), Json(req)).await;
        assert!(!stopped.0.active);
        assert!(!state.has_session("wf-1"));
    }
}
