//! Queries over `execution_runs`, `node_run_results`, and `tool_call_log`:
//! execution selection and the Director turn log.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::params;
use serde_json::Value;
use uuid::Uuid;

/// Start a new execution run over `selection` in the given `mode`
/// ("isolated" or "flow") and return its id.
pub fn start_run(pool: &DbPool, workflow_id: &str, selection: &str, mode: &str) -> DbResult<String> {
    pool.with_conn(|conn| {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO execution_runs (id, workflow_id, selection, mode) VALUES (?1, ?2, ?3, ?4)",
            params![id, workflow_id, selection, mode],
        )
        .map_err(DbError::Connection)?;
        Ok(id)
    })
}

/// Mark a run finished with its terminal status ("completed", "failed",
/// or "cancelled").
pub fn finish_run(pool: &DbPool, run_id: &str, status: &str) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "UPDATE execution_runs SET status = ?1, finished_at = datetime('now') WHERE id = ?2",
            params![status, run_id],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}

/// Record the outcome of one node within a run.
pub fn record_node_result(
    pool: &DbPool,
    run_id: &str,
    node_id: &str,
    status: &str,
    result: Option<&Value>,
    error: Option<&Value>,
) -> DbResult<()> {
    pool.with_conn(|conn| {
        let result_text = result.map(|r| serde_json::to_string(r).unwrap_or_default());
        let error_text = error.map(|e| serde_json::to_string(e).unwrap_or_default());
        conn.execute(
            "INSERT INTO node_run_results (run_id, node_id, status, result, error, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
            params![run_id, node_id, status, result_text, error_text],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}

/// Append one entry to the tool-call log for a Director turn.
pub fn log_tool_call(
    pool: &DbPool,
    workflow_id: &str,
    turn_seq: i64,
    tool_name: &str,
    args: &Value,
    result: Option<&Value>,
    error: Option<&str>,
) -> DbResult<()> {
    pool.with_conn(|conn| {
        let args_text = serde_json::to_string(args).unwrap_or_default();
        let result_text = result.map(|r| serde_json::to_string(r).unwrap_or_default());
        conn.execute(
            "INSERT INTO tool_call_log (workflow_id, turn_seq, tool_name, args, result, error, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
            params![workflow_id, turn_seq, tool_name, args_text, result_text, error],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}
