//! Queries over `workflow_nodes`: the state store's node table
//! (upsertNodes / deleteNodes).

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: String,
    pub workflow_id: String,
    pub position: i64,
    pub alias: String,
    pub r#type: String,
    pub config: Value,
    pub description: Option<String>,
    pub status: String,
    pub result: Option<Value>,
    pub store_variable: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<NodeRow> {
    let config_text: String = row.get("config")?;
    let result_text: Option<String> = row.get("result")?;
    Ok(NodeRow {
        id: row.get("id")?,
        workflow_id: row.get("workflow_id")?,
        position: row.get("position")?,
        alias: row.get("alias")?,
        r#type: row.get("type")?,
        config: serde_json::from_str(&config_text).unwrap_or(Value::Null),
        description: row.get("description")?,
        status: row.get("status")?,
        result: result_text.and_then(|t| serde_json::from_str(&t).ok()),
        store_variable: row.get::<_, i64>("store_variable")? != 0,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// One node to insert or overwrite at `position`, keyed by `alias`.
pub struct NodeUpsert {
    pub position: i64,
    pub alias: String,
    pub r#type: String,
    pub config: Value,
    pub description: Option<String>,
    pub store_variable: bool,
}

fn config_is_empty(config: &Value) -> bool {
    match config {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Control-flow node types keep child positions inside their config
/// (`iterate.body`, `route[i].branch`, `handle.catch`). Walk every array of
/// positions such a config carries and replace each entry through `remap`,
/// dropping entries `remap` maps to `None`.
fn rewrite_position_refs(type_str: &str, config: &mut Value, remap: &mut impl FnMut(i64) -> Option<i64>) {
    fn rewrite_array(arr: &mut Vec<Value>, remap: &mut impl FnMut(i64) -> Option<i64>) {
        let rewritten = std::mem::take(arr)
            .into_iter()
            .filter_map(|v| match v.as_i64() {
                Some(n) => remap(n).map(Value::from),
                None => Some(v),
            })
            .collect();
        *arr = rewritten;
    }

    match type_str {
        "iterate" => {
            if let Some(arr) = config.get_mut("body").and_then(Value::as_array_mut) {
                rewrite_array(arr, remap);
            }
        }
        "handle" => {
            if let Some(arr) = config.get_mut("catch").and_then(Value::as_array_mut) {
                rewrite_array(arr, remap);
            }
        }
        "route" => {
            if let Some(branches) = config.as_array_mut() {
                for branch in branches {
                    if let Some(arr) = branch.get_mut("branch").and_then(Value::as_array_mut) {
                        rewrite_array(arr, remap);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Insert or replace nodes at the given positions, shifting any existing
/// nodes at or after the lowest inserted position down to make room, and
/// rewriting any `iterate.body`/`route[i].branch`/`handle.catch` position
/// reference that now points past the insertion point. Runs inside a
/// single transaction. Rejects an empty/`null` node config.
pub fn upsert_nodes(pool: &DbPool, workflow_id: &str, nodes: &[NodeUpsert]) -> DbResult<Vec<NodeRow>> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(bad) = nodes.iter().find(|n| config_is_empty(&n.config)) {
        return Err(DbError::ConstraintViolation(format!(
            "node '{}' has an empty config",
            bad.alias
        )));
    }

    pool.with_conn_mut(|conn| {
        let tx = conn.transaction().map_err(DbError::Connection)?;
        let min_position = nodes.iter().map(|n| n.position).min().unwrap_or(0);
        let shift = nodes.len() as i64;

        tx.execute(
            "UPDATE workflow_nodes SET position = position + ?1
             WHERE workflow_id = ?2 AND position >= ?3",
            params![shift, workflow_id, min_position],
        )
        .map_err(DbError::Connection)?;

        {
            let mut stmt = tx
                .prepare("SELECT id, type, config FROM workflow_nodes WHERE workflow_id = ?1")
                .map_err(DbError::Connection)?;
            let surviving: Vec<(String, String, String)> = stmt
                .query_map(params![workflow_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .map_err(DbError::Connection)?
                .filter_map(Result::ok)
                .collect();

            for (id, type_str, config_text) in surviving {
                let mut config: Value = serde_json::from_str(&config_text).unwrap_or(Value::Null);
                let before = config.clone();
                rewrite_position_refs(&type_str, &mut config, &mut |n| {
                    Some(if n >= min_position { n + shift } else { n })
                });
                if config != before {
                    let updated_text = serde_json::to_string(&config).unwrap_or_default();
                    tx.execute(
                        "UPDATE workflow_nodes SET config = ?1 WHERE id = ?2",
                        params![updated_text, id],
                    )
                    .map_err(DbError::Connection)?;
                }
            }
        }

        let mut inserted = Vec::with_capacity(nodes.len());
        for (offset, node) in nodes.iter().enumerate() {
            let id = Uuid::new_v4().to_string();
            let position = node.position + offset as i64;
            let config_text = serde_json::to_string(&node.config).unwrap_or_default();

            tx.execute(
                "INSERT INTO workflow_nodes
                     (id, workflow_id, position, alias, type, config, description,
                      status, store_variable)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8)
                 ON CONFLICT(workflow_id, alias) DO UPDATE SET
                     position = excluded.position,
                     type = excluded.type,
                     config = excluded.config,
                     description = excluded.description,
                     status = 'pending',
                     result = NULL,
                     store_variable = excluded.store_variable,
                     updated_at = datetime('now')",
                params![
                    id,
                    workflow_id,
                    position,
                    node.alias,
                    node.r#type,
                    config_text,
                    node.description,
                    node.store_variable as i64,
                ],
            )
            .map_err(DbError::Connection)?;

            let row = tx
                .query_row(
                    "SELECT * FROM workflow_nodes WHERE workflow_id = ?1 AND alias = ?2",
                    params![workflow_id, node.alias],
                    row_to_node,
                )
                .map_err(DbError::Connection)?;
            inserted.push(row);
        }

        tx.commit().map_err(DbError::Connection)?;
        Ok(inserted)
    })
}

/// Delete nodes by id. Surviving positions are compacted back to a dense
/// 1-based run, and every surviving `iterate.body`/`route[i].branch`/
/// `handle.catch` reference is rewritten: references to a deleted position
/// are dropped, references to a surviving position are remapped to its new,
/// compacted position. When `handle_dependencies` is set, nodes whose config
/// still mentions a deleted node's alias are deleted too (cascading, applied
/// before compaction). `dry_run` computes and returns the full set of ids
/// that would be deleted without mutating anything.
pub fn delete_nodes(
    pool: &DbPool,
    workflow_id: &str,
    ids: &[String],
    handle_dependencies: bool,
    dry_run: bool,
) -> DbResult<Vec<String>> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction().map_err(DbError::Connection)?;
        let mut to_delete: Vec<String> = ids.to_vec();

        let mut stmt = tx
            .prepare("SELECT id, position, alias, type, config FROM workflow_nodes WHERE workflow_id = ?1 ORDER BY position ASC")
            .map_err(DbError::Connection)?;
        let all: Vec<(String, i64, String, String, String)> = stmt
            .query_map(params![workflow_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .map_err(DbError::Connection)?
            .filter_map(Result::ok)
            .collect();
        drop(stmt);

        if handle_dependencies {
            let deleted_aliases: Vec<String> = all
                .iter()
                .filter(|(id, ..)| to_delete.contains(id))
                .map(|(_, _, alias, ..)| alias.clone())
                .collect();

            for (id, _, _, _, config) in &all {
                if to_delete.contains(id) {
                    continue;
                }
                if deleted_aliases.iter().any(|a| config.contains(a.as_str())) {
                    to_delete.push(id.clone());
                }
            }
        }

        if dry_run {
            return Ok(to_delete);
        }

        let deleted_positions: HashSet<i64> = all
            .iter()
            .filter(|(id, ..)| to_delete.contains(id))
            .map(|(_, position, ..)| *position)
            .collect();

        for id in &to_delete {
            tx.execute(
                "DELETE FROM workflow_nodes WHERE id = ?1 AND workflow_id = ?2",
                params![id, workflow_id],
            )
            .map_err(DbError::Connection)?;
        }

        let remap: HashMap<i64, i64> = all
            .iter()
            .filter(|(_, position, ..)| !deleted_positions.contains(position))
            .enumerate()
            .map(|(idx, (_, position, ..))| (*position, idx as i64 + 1))
            .collect();

        for (id, position, _, type_str, config_text) in &all {
            if deleted_positions.contains(position) {
                continue;
            }
            let new_position = remap[position];
            let mut config: Value = serde_json::from_str(config_text).unwrap_or(Value::Null);
            let before = config.clone();
            rewrite_position_refs(type_str, &mut config, &mut |n| {
                if deleted_positions.contains(&n) {
                    None
                } else {
                    remap.get(&n).copied()
                }
            });

            if new_position != *position || config != before {
                let config_changed = config != before;
                let updated_text = serde_json::to_string(&config).unwrap_or_default();
                if config_changed {
                    tx.execute(
                        "UPDATE workflow_nodes SET position = ?1, config = ?2 WHERE id = ?3",
                        params![new_position, updated_text, id],
                    )
                } else {
                    tx.execute("UPDATE workflow_nodes SET position = ?1 WHERE id = ?2", params![new_position, id])
                }
                .map_err(DbError::Connection)?;
            }
        }

        tx.commit().map_err(DbError::Connection)?;
        Ok(to_delete)
    })
}

/// List all nodes for a workflow, ordered by position.
pub fn list_nodes(pool: &DbPool, workflow_id: &str) -> DbResult<Vec<NodeRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM workflow_nodes WHERE workflow_id = ?1 ORDER BY position ASC")
            .map_err(DbError::Connection)?;
        let rows = stmt
            .query_map(params![workflow_id], row_to_node)
            .map_err(DbError::Connection)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::Connection)
    })
}

/// Fetch a single node by id.
pub fn get_node(pool: &DbPool, workflow_id: &str, node_id: &str) -> DbResult<NodeRow> {
    pool.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM workflow_nodes WHERE workflow_id = ?1 AND id = ?2",
            params![workflow_id, node_id],
            row_to_node,
        )
        .optional()
        .map_err(DbError::Connection)?
        .ok_or_else(|| DbError::NotFound(format!("node {node_id}")))
    })
}

/// Update a node's status and, optionally, its result payload.
pub fn set_node_status(pool: &DbPool, workflow_id: &str, node_id: &str, status: &str, result: Option<&Value>) -> DbResult<()> {
    pool.with_conn(|conn| {
        let result_text = result.map(|r| serde_json::to_string(r).unwrap_or_default());
        conn.execute(
            "UPDATE workflow_nodes SET status = ?1, result = ?2, updated_at = datetime('now')
             WHERE workflow_id = ?3 AND id = ?4",
            params![status, result_text, workflow_id, node_id],
        )
        .map_err(DbError::Connection)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::workflows;
    use serde_json::json;

    fn test_pool() -> (DbPool, String) {
        let pool = DbPool::in_memory().unwrap();
        crate::migrations::run_migrations(&pool).unwrap();
        let workflow_id = workflows::create(&pool, "test").unwrap();
        (pool, workflow_id)
    }

    fn upsert(pool: &DbPool, workflow_id: &str, position: i64, alias: &str, r#type: &str, config: Value) {
        upsert_nodes(
            pool,
            workflow_id,
            &[NodeUpsert { position, alias: alias.to_string(), r#type: r#type.to_string(), config, description: None, store_variable: false }],
        )
        .unwrap();
    }

    #[test]
    fn upsert_rejects_empty_config() {
        let (pool, workflow_id) = test_pool();
        let err = upsert_nodes(
            &pool,
            &workflow_id,
            &[NodeUpsert { position: 1, alias: "a".into(), r#type: "transform".into(), config: Value::Null, description: None, store_variable: false }],
        )
        .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));

        let err = upsert_nodes(
            &pool,
            &workflow_id,
            &[NodeUpsert { position: 1, alias: "a".into(), r#type: "transform".into(), config: json!({}), description: None, store_variable: false }],
        )
        .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }

    #[test]
    fn upsert_shifts_positions_and_rewrites_iterate_body_references() {
        let (pool, workflow_id) = test_pool();
        upsert(&pool, &workflow_id, 1, "noop1", "transform", json!({"expression": "upper(\"a\")", "store_as": "x"}));
        upsert(&pool, &workflow_id, 2, "noop2", "transform", json!({"expression": "upper(\"b\")", "store_as": "y"}));
        upsert(&pool, &workflow_id, 3, "loop", "iterate", json!({"over": "items", "variable": "item", "body": [4, 5]}));
        upsert(&pool, &workflow_id, 4, "body1", "transform", json!({"expression": "upper(\"c\")", "store_as": "z"}));
        upsert(&pool, &workflow_id, 5, "body2", "transform", json!({"expression": "upper(\"d\")", "store_as": "w"}));

        // Insert one node at position 4: everything at or after 4 shifts by 1,
        // and `loop`'s body references (4, 5) must become (5, 6).
        upsert(&pool, &workflow_id, 4, "inserted", "transform", json!({"expression": "upper(\"e\")", "store_as": "v"}));

        let rows = list_nodes(&pool, &workflow_id).unwrap();
        let loop_row = rows.iter().find(|r| r.alias == "loop").unwrap();
        assert_eq!(loop_row.config["body"], json!([5, 6]));
    }

    #[test]
    fn upsert_rewrites_route_branch_references() {
        let (pool, workflow_id) = test_pool();
        upsert(
            &pool,
            &workflow_id,
            1,
            "router",
            "route",
            json!([{"name": "a", "condition": "true", "branch": [2, 3]}]),
        );
        upsert(&pool, &workflow_id, 2, "target_a", "transform", json!({"expression": "upper(\"a\")", "store_as": "a"}));
        upsert(&pool, &workflow_id, 3, "target_b", "transform", json!({"expression": "upper(\"b\")", "store_as": "b"}));

        upsert(&pool, &workflow_id, 2, "inserted", "transform", json!({"expression": "upper(\"c\")", "store_as": "c"}));

        let rows = list_nodes(&pool, &workflow_id).unwrap();
        let router_row = rows.iter().find(|r| r.alias == "router").unwrap();
        assert_eq!(router_row.config[0]["branch"], json!([3, 4]));
    }

    #[test]
    fn delete_compacts_positions_and_drops_dangling_references() {
        let (pool, workflow_id) = test_pool();
        upsert(&pool, &workflow_id, 1, "loop", "iterate", json!({"over": "items", "variable": "item", "body": [2, 3]}));
        upsert(&pool, &workflow_id, 2, "body1", "transform", json!({"expression": "upper(\"a\")", "store_as": "a"}));
        upsert(&pool, &workflow_id, 3, "body2", "transform", json!({"expression": "upper(\"b\")", "store_as": "b"}));
        upsert(&pool, &workflow_id, 4, "after", "transform", json!({"expression": "upper(\"c\")", "store_as": "c"}));

        let rows = list_nodes(&pool, &workflow_id).unwrap();
        let body1_id = rows.iter().find(|r| r.alias == "body1").unwrap().id.clone();

        delete_nodes(&pool, &workflow_id, &[body1_id], false, false).unwrap();

        let rows = list_nodes(&pool, &workflow_id).unwrap();
        assert_eq!(rows.len(), 3);
        // Positions are dense and 1-based again.
        assert_eq!(rows.iter().map(|r| r.position).collect::<Vec<_>>(), vec![1, 2, 3]);

        let loop_row = rows.iter().find(|r| r.alias == "loop").unwrap();
        // body1 (old position 2) is gone; body2 (old position 3) compacts to 2.
        assert_eq!(loop_row.config["body"], json!([2]));
    }

    #[test]
    fn delete_dry_run_reports_without_mutating() {
        let (pool, workflow_id) = test_pool();
        upsert(&pool, &workflow_id, 1, "a", "transform", json!({"expression": "upper(\"a\")", "store_as": "a"}));
        let rows = list_nodes(&pool, &workflow_id).unwrap();
        let id = rows[0].id.clone();

        let would_delete = delete_nodes(&pool, &workflow_id, &[id.clone()], false, true).unwrap();
        assert_eq!(would_delete, vec![id]);
        assert_eq!(list_nodes(&pool, &workflow_id).unwrap().len(), 1);
    }

    #[test]
    fn delete_with_handle_dependencies_cascades_to_referencing_nodes() {
        let (pool, workflow_id) = test_pool();
        upsert(&pool, &workflow_id, 1, "target", "transform", json!({"expression": "upper(\"a\")", "store_as": "a"}));
        upsert(&pool, &workflow_id, 2, "consumer", "transform", json!({"expression": "target", "store_as": "b"}));

        let rows = list_nodes(&pool, &workflow_id).unwrap();
        let target_id = rows.iter().find(|r| r.alias == "target").unwrap().id.clone();

        let deleted = delete_nodes(&pool, &workflow_id, &[target_id], true, false).unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(list_nodes(&pool, &workflow_id).unwrap().is_empty());
    }
}
