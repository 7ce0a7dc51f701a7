//! Queries over `workflow_plans`: the append-only plan history.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

/// The most recently stored plan for a workflow, if any has been set.
pub fn get_latest(pool: &DbPool, workflow_id: &str) -> DbResult<Option<Value>> {
    pool.with_conn(|conn| {
        let text: Option<String> = conn
            .query_row(
                "SELECT data FROM workflow_plans WHERE workflow_id = ?1 ORDER BY id DESC LIMIT 1",
                params![workflow_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::Connection)?;
        Ok(text.and_then(|t| serde_json::from_str(&t).ok()))
    })
}

/// Append a new plan version with the reason it changed.
pub fn set(pool: &DbPool, workflow_id: &str, data: &Value, reason: Option<&str>) -> DbResult<()> {
    pool.with_conn(|conn| {
        let text = serde_json::to_string(data).unwrap_or_default();
        conn.execute(
            "INSERT INTO workflow_plans (workflow_id, data, reason) VALUES (?1, ?2, ?3)",
            params![workflow_id, text, reason],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}
