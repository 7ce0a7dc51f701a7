//! Queries over the `workflows` table itself.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct WorkflowRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_workflow(row: &rusqlite::Row) -> rusqlite::Result<WorkflowRow> {
    Ok(WorkflowRow {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Create a new, empty workflow and return its id.
pub fn create(pool: &DbPool, name: &str) -> DbResult<String> {
    pool.with_conn(|conn| {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO workflows (id, name) VALUES (?1, ?2)",
            params![id, name],
        )
        .map_err(DbError::Connection)?;
        Ok(id)
    })
}

pub fn get(pool: &DbPool, workflow_id: &str) -> DbResult<WorkflowRow> {
    pool.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM workflows WHERE id = ?1",
            params![workflow_id],
            row_to_workflow,
        )
        .optional()
        .map_err(DbError::Connection)?
        .ok_or_else(|| DbError::NotFound(format!("workflow {workflow_id}")))
    })
}

pub fn list(pool: &DbPool) -> DbResult<Vec<WorkflowRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM workflows ORDER BY created_at DESC")
            .map_err(DbError::Connection)?;
        let rows = stmt
            .query_map([], row_to_workflow)
            .map_err(DbError::Connection)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::Connection)
    })
}
