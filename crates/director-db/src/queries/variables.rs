//! Queries over `workflow_memory`: the variable store.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

/// Fetch one variable by exact key.
pub fn get(pool: &DbPool, workflow_id: &str, key: &str) -> DbResult<Option<Value>> {
    pool.with_conn(|conn| {
        let text: Option<String> = conn
            .query_row(
                "SELECT value FROM workflow_memory WHERE workflow_id = ?1 AND key = ?2",
                params![workflow_id, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::Connection)?;
        Ok(text.and_then(|t| serde_json::from_str(&t).ok()))
    })
}

/// Fetch every variable for a workflow, keyed by their stored key
/// (including any `@iter:<position>:<index>` suffix).
pub fn get_all(pool: &DbPool, workflow_id: &str) -> DbResult<Vec<(String, Value)>> {
    pool.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT key, value FROM workflow_memory WHERE workflow_id = ?1")
            .map_err(DbError::Connection)?;
        let rows = stmt
            .query_map(params![workflow_id], |row| {
                let key: String = row.get(0)?;
                let text: String = row.get(1)?;
                Ok((key, text))
            })
            .map_err(DbError::Connection)?;

        let mut out = Vec::new();
        for row in rows {
            let (key, text) = row.map_err(DbError::Connection)?;
            if let Ok(value) = serde_json::from_str(&text) {
                out.push((key, value));
            }
        }
        Ok(out)
    })
}

/// Set (insert or overwrite) a single variable.
pub fn set(pool: &DbPool, workflow_id: &str, key: &str, value: &Value) -> DbResult<()> {
    pool.with_conn(|conn| {
        let text = serde_json::to_string(value).unwrap_or_default();
        conn.execute(
            "INSERT INTO workflow_memory (workflow_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(workflow_id, key) DO UPDATE SET
                 value = excluded.value, updated_at = datetime('now')",
            params![workflow_id, key, text],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}

/// Delete a single variable by exact key.
pub fn delete(pool: &DbPool, workflow_id: &str, key: &str) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "DELETE FROM workflow_memory WHERE workflow_id = ?1 AND key = ?2",
            params![workflow_id, key],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}

/// Delete every variable for a workflow.
pub fn clear_all(pool: &DbPool, workflow_id: &str) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "DELETE FROM workflow_memory WHERE workflow_id = ?1",
            params![workflow_id],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}

/// Delete every variable scoped to one iterate node's position, i.e. every
/// key matching `<name>@iter:<position>:<index>` for any name and index.
pub fn clear_iteration_for(pool: &DbPool, workflow_id: &str, position: &str) -> DbResult<()> {
    pool.with_conn(|conn| {
        let pattern = format!("%@iter:{position}:%");
        conn.execute(
            "DELETE FROM workflow_memory WHERE workflow_id = ?1 AND key LIKE ?2",
            params![workflow_id, pattern],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}
