//! Queries over `conversation_messages`: the append-only turn log.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::params;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub seq: i64,
    pub role: String,
    pub content: String,
    pub tool_calls: Option<Value>,
    pub reasoning_encrypted: Option<String>,
    pub tokens: Option<Value>,
    pub created_at: String,
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<MessageRow> {
    let tool_calls_text: Option<String> = row.get("tool_calls")?;
    let tokens_text: Option<String> = row.get("tokens")?;
    Ok(MessageRow {
        seq: row.get("seq")?,
        role: row.get("role")?,
        content: row.get("content")?,
        tool_calls: tool_calls_text.and_then(|t| serde_json::from_str(&t).ok()),
        reasoning_encrypted: row.get("reasoning_encrypted")?,
        tokens: tokens_text.and_then(|t| serde_json::from_str(&t).ok()),
        created_at: row.get("created_at")?,
    })
}

/// Append the next message in the conversation, auto-assigning `seq`.
pub fn append(
    pool: &DbPool,
    workflow_id: &str,
    role: &str,
    content: &str,
    tool_calls: Option<&Value>,
    reasoning_encrypted: Option<&str>,
    tokens: Option<&Value>,
) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let next_seq: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM conversation_messages WHERE workflow_id = ?1",
                params![workflow_id],
                |row| row.get(0),
            )
            .map_err(DbError::Connection)?;

        let tool_calls_text = tool_calls.map(|v| serde_json::to_string(v).unwrap_or_default());
        let tokens_text = tokens.map(|v| serde_json::to_string(v).unwrap_or_default());

        conn.execute(
            "INSERT INTO conversation_messages
                 (workflow_id, seq, role, content, tool_calls, reasoning_encrypted, tokens)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                workflow_id,
                next_seq,
                role,
                content,
                tool_calls_text,
                reasoning_encrypted,
                tokens_text,
            ],
        )
        .map_err(DbError::Connection)?;
        Ok(next_seq)
    })
}

/// The full conversation for a workflow, oldest first.
pub fn list(pool: &DbPool, workflow_id: &str) -> DbResult<Vec<MessageRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM conversation_messages WHERE workflow_id = ?1 ORDER BY seq ASC")
            .map_err(DbError::Connection)?;
        let rows = stmt
            .query_map(params![workflow_id], row_to_message)
            .map_err(DbError::Connection)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::Connection)
    })
}
