//! `POST /nodes/execute`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use director_runtime::{ExecutionMode, Interpreter, NodeExecutionRecord};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExecuteNodesRequest {
    #[serde(rename = "workflowId")]
    pub workflow_id: String,
    pub selection: String,
    #[serde(default)]
    pub mode: Option<String>,
}

pub async fn execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteNodesRequest>,
) -> Result<Json<Vec<NodeExecutionRecord>>, (StatusCode, String)> {
    let browser = state.session(&req.workflow_id);
    let mode = match req.mode.as_deref() {
        Some("flow") => ExecutionMode::Flow,
        _ => ExecutionMode::Isolated,
    };

    let interpreter = Interpreter::new(&state.db, req.workflow_id.clone(), &browser, None);
    let records = interpreter.run(&req.selection, mode).await.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_db::queries::nodes::{NodeUpsert, upsert_nodes};
    use director_db::queries::workflows;
    use director_db::DbPool;
    use serde_json::json;
    use std::sync::Arc;

    fn test_state() -> (AppState, String) {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        let workflow_id = workflows::create(&pool, "test").unwrap();
        upsert_nodes(
            &pool,
            &workflow_id,
            &[NodeUpsert {
                position: 1,
                alias: "greet".to_string(),
                r#type: "transform".to_string(),
                config: json!({"expression": "upper(\"hi\")", "store_as": "greeting"}),
                description: None,
                store_variable: false,
            }],
        )
        .unwrap();
        (AppState::new(Arc::new(pool)), workflow_id)
    }

    #[tokio::test]
    async fn executes_the_requested_selection() {
        let (state, workflow_id) = test_state();
        let req = ExecuteNodesRequest { workflow_id, selection: "1".to_string(), mode: None };

        let records = execute(State(state), Json(req)).await.unwrap();

        assert_eq!(records.0.len(), 1);
        assert_eq!(records.0[0].status, "success");
    }

    #[tokio::test]
    async fn an_invalid_selection_is_a_400() {
        let (state, workflow_id) = test_state();
        let req = ExecuteNodesRequest { workflow_id, selection: "not a selection".to_string(), mode: None };

        let (status, _) = execute(State(state), Json(req)).await.unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
