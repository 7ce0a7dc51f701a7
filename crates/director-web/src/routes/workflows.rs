//! `GET /workflows/{id}`: a snapshot for UI rendering.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use director_core::browser_state::BrowserState;
use director_db::queries::nodes::{self as node_queries, NodeRow};
use director_db::queries::{descriptions, plans, variables as variable_queries};
use serde::Serialize;
use serde_json::Value;

use crate::state::AppState;

#[derive(Serialize)]
pub struct WorkflowSnapshot {
    pub description: Option<Value>,
    pub plan: Option<Value>,
    pub nodes: Vec<NodeRow>,
    pub variables: Value,
    pub browser_state: Option<BrowserState>,
}

pub async fn get_workflow(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<WorkflowSnapshot>, (StatusCode, String)> {
    let to_500 = |e: director_db::DbError| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string());

    let description = descriptions::get_latest(&state.db, &id).map_err(to_500)?.map(|(_, data)| data);
    let plan = plans::get_latest(&state.db, &id).map_err(to_500)?;
    let nodes = node_queries::list_nodes(&state.db, &id).map_err(to_500)?;
    let variables = Value::Object(variable_queries::get_all(&state.db, &id).map_err(to_500)?.into_iter().collect());
    let browser_state = state.has_session(&id).then(|| state.session(&id).state());

    Ok(Json(WorkflowSnapshot { description, plan, nodes, variables, browser_state }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_db::queries::workflows;
    use director_db::DbPool;
    use std::sync::Arc;

    fn test_state() -> (AppState, String) {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        let workflow_id = workflows::create(&pool, "test").unwrap();
        (AppState::new(Arc::new(pool)), workflow_id)
    }

    #[tokio::test]
    async fn snapshot_has_no_browser_state_before_a_session_starts() {
        let (state, workflow_id) = test_state();

        let response = get_workflow(State(state), Path(workflow_id)).await.unwrap();

        assert!(response.0.browser_state.is_none());
        assert!(response.0.nodes.is_empty());
    }

    #[tokio::test]
    async fn snapshot_reports_browser_state_once_a_session_exists() {
        let (state, workflow_id) = test_state();
        state.session(&workflow_id);

        let response = get_workflow(State(state), Path(workflow_id)).await.unwrap();

        assert!(response.0.browser_state.is_some());
    }
}
