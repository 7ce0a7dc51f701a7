//! Queries over `workflow_descriptions`: the versioned workflow
//! description.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

/// The highest-versioned description for a workflow, if one has been set.
pub fn get_latest(pool: &DbPool, workflow_id: &str) -> DbResult<Option<(i64, Value)>> {
    pool.with_conn(|conn| {
        conn.query_row(
            "SELECT version, data FROM workflow_descriptions
             WHERE workflow_id = ?1 ORDER BY version DESC LIMIT 1",
            params![workflow_id],
            |row| {
                let version: i64 = row.get(0)?;
                let text: String = row.get(1)?;
                Ok((version, text))
            },
        )
        .optional()
        .map_err(DbError::Connection)
        .map(|opt| opt.and_then(|(v, t)| serde_json::from_str(&t).ok().map(|data| (v, data))))
    })
}

/// Append a new description version, incrementing from the latest one.
pub fn append_version(pool: &DbPool, workflow_id: &str, data: &Value, reason: Option<&str>) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let next_version: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) + 1 FROM workflow_descriptions WHERE workflow_id = ?1",
                params![workflow_id],
                |row| row.get(0),
            )
            .map_err(DbError::Connection)?;

        let text = serde_json::to_string(data).unwrap_or_default();
        conn.execute(
            "INSERT INTO workflow_descriptions (workflow_id, version, data, reason)
             VALUES (?1, ?2, ?3, ?4)",
            params![workflow_id, next_version, text, reason],
        )
        .map_err(DbError::Connection)?;
        Ok(next_version)
    })
}
