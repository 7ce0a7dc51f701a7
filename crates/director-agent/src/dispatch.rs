//! Tool dispatch: one match arm per tool in `tools::registry()`, calling
//! into `director-runtime`/`director-db`/`director-browser` — the same
//! shape as `cwa_mcp::server::handle_tool_call`'s `match name { ... }`,
//! retargeted at the Director's own tool set.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use director_browser::dom_toolkit::{self, InspectInclude, SearchQuery};
use director_browser::BrowserFacade;
use director_core::node::{NodeType, NodeUpsert as CoreUpsert, UpsertTarget};
use director_core::DirectorError;
use director_db::queries::nodes::{self as node_queries, NodeRow, NodeUpsert as DbUpsert};
use director_db::queries::{descriptions, plans, variables as variable_queries};
use director_db::DbPool;
use director_runtime::nodes::{self, NodeContext};
use director_runtime::{ExecutionMode, Interpreter};
use serde_json::{json, Value};

use crate::error::{AgentError, AgentResult};

fn field_str<'a>(value: &'a Value, key: &str) -> AgentResult<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::Director(DirectorError::Validation(format!("'{key}' is required"))))
}

pub async fn execute_tool(pool: &DbPool, workflow_id: &str, browser: &BrowserFacade, name: &str, args: &Value) -> AgentResult<Value> {
    match name {
        "add_or_replace_nodes" => add_or_replace_nodes(pool, workflow_id, args),
        "delete_nodes" => delete_nodes(pool, workflow_id, args),
        "update_plan" => update_plan(pool, workflow_id, args),
        "update_workflow_description" => update_workflow_description(pool, workflow_id, args),
        "set_variable" => set_variable(pool, workflow_id, args),
        "clear_variable" => clear_variable(pool, workflow_id, args),
        "clear_all_variables" => {
            variable_queries::clear_all(pool, workflow_id)?;
            Ok(json!({ "cleared": true }))
        }
        "execute_nodes" => execute_nodes(pool, workflow_id, browser, args).await,

        "get_workflow_variables" => get_workflow_variables(pool, workflow_id, args),
        "get_current_plan" => Ok(plans::get_latest(pool, workflow_id)?.unwrap_or(Value::Null)),
        "get_workflow_nodes" => get_workflow_nodes(pool, workflow_id, args),
        "get_workflow_description" => Ok(descriptions::get_latest(pool, workflow_id)?
            .map(|(version, data)| json!({ "version": version, "data": data }))
            .unwrap_or(Value::Null)),
        "get_browser_state" => Ok(serde_json::to_value(browser.state())?),
        "browser_action" => {
            let ctx = NodeContext { browser, llm: None };
            Ok(nodes::browser_action::execute(&ctx, args).await?)
        }
        "get_screenshot" => get_screenshot(browser, args).await,

        "dom_overview" => dom_overview(browser, args).await,
        "dom_structure" => dom_structure(browser, args).await,
        "dom_search" => dom_search(browser, args).await,
        "dom_inspect" => dom_inspect(browser, args).await,
        "dom_click_inspect" => dom_click_inspect(browser, args).await,

        other => Err(AgentError::UnknownTool(other.to_string())),
    }
}

fn tab_arg(args: &Value) -> Option<&str> {
    args.get("tab").and_then(Value::as_str)
}

// --- mutation tools ---

fn resolve_position(rows: &[NodeRow], target: &UpsertTarget) -> i64 {
    let next_end = || rows.iter().map(|r| r.position).max().unwrap_or(0) + 1;
    match target {
        UpsertTarget::End => next_end(),
        UpsertTarget::Position(p) => *p,
        UpsertTarget::ReplaceByAlias(alias) => rows.iter().find(|r| &r.alias == alias).map(|r| r.position).unwrap_or_else(next_end),
        UpsertTarget::ReplaceById(id) => rows.iter().find(|r| &r.id == id).map(|r| r.position).unwrap_or_else(next_end),
    }
}

fn parse_node_arg(rows: &[NodeRow], value: &Value) -> AgentResult<CoreUpsert> {
    let node_type = field_str(value, "type")
        .ok()
        .and_then(NodeType::from_str)
        .ok_or_else(|| AgentError::Director(DirectorError::Validation("node requires a valid 'type'".into())))?;
    let config = value.get("config").cloned().unwrap_or(Value::Null);
    let description = value.get("description").and_then(Value::as_str).map(str::to_string);
    let store_variable = value.get("store_variable").and_then(Value::as_bool).unwrap_or(false);

    let target = if let Some(id) = value.get("replace_id").and_then(Value::as_str) {
        UpsertTarget::ReplaceById(id.to_string())
    } else if let Some(alias) = value.get("replace_alias").and_then(Value::as_str) {
        UpsertTarget::ReplaceByAlias(alias.to_string())
    } else if let Some(position) = value.get("position").and_then(Value::as_i64) {
        UpsertTarget::Position(position)
    } else {
        UpsertTarget::End
    };

    // Replacing by id still upserts on the storage layer's alias key, so
    // the existing alias wins over whatever the caller passed.
    let alias = match &target {
        UpsertTarget::ReplaceById(id) => rows
            .iter()
            .find(|r| &r.id == id)
            .map(|r| r.alias.clone())
            .ok_or_else(|| AgentError::Director(DirectorError::NodeNotFound(id.clone())))?,
        _ => field_str(value, "alias")?.to_string(),
    };

    Ok(CoreUpsert { target, node_type, alias, config, description, store_variable })
}

fn add_or_replace_nodes(pool: &DbPool, workflow_id: &str, args: &Value) -> AgentResult<Value> {
    let entries = args
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::Director(DirectorError::Validation("'nodes' must be an array".into())))?;

    let rows = node_queries::list_nodes(pool, workflow_id)?;
    let upserts = entries.iter().map(|v| parse_node_arg(&rows, v)).collect::<AgentResult<Vec<_>>>()?;

    let db_upserts: Vec<DbUpsert> = upserts
        .iter()
        .map(|u| DbUpsert {
            position: resolve_position(&rows, &u.target),
            alias: u.alias.clone(),
            r#type: u.node_type.as_str().to_string(),
            config: u.config.clone(),
            description: u.description.clone(),
            store_variable: u.store_variable,
        })
        .collect();

    let inserted = node_queries::upsert_nodes(pool, workflow_id, &db_upserts)?;
    Ok(serde_json::to_value(inserted)?)
}

fn delete_nodes(pool: &DbPool, workflow_id: &str, args: &Value) -> AgentResult<Value> {
    let ids: Vec<String> = args
        .get("ids")
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::Director(DirectorError::Validation("'ids' must be an array".into())))?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    let handle_dependencies = args.get("handle_dependencies").and_then(Value::as_bool).unwrap_or(false);
    let dry_run = args.get("dry_run").and_then(Value::as_bool).unwrap_or(false);
    let affected = node_queries::delete_nodes(pool, workflow_id, &ids, handle_dependencies, dry_run)?;
    if dry_run {
        Ok(json!({ "would_delete": affected }))
    } else {
        Ok(json!({ "deleted": affected }))
    }
}

fn update_plan(pool: &DbPool, workflow_id: &str, args: &Value) -> AgentResult<Value> {
    let plan = args.get("plan").ok_or_else(|| AgentError::Director(DirectorError::Validation("'plan' is required".into())))?;
    let reason = args.get("reason").and_then(Value::as_str);
    plans::set(pool, workflow_id, plan, reason)?;
    Ok(json!({ "updated": true }))
}

fn update_workflow_description(pool: &DbPool, workflow_id: &str, args: &Value) -> AgentResult<Value> {
    let description = args
        .get("description")
        .ok_or_else(|| AgentError::Director(DirectorError::Validation("'description' is required".into())))?;
    let reason = args.get("reason").and_then(Value::as_str);
    let version = descriptions::append_version(pool, workflow_id, description, reason)?;
    Ok(json!({ "version": version }))
}

fn set_variable(pool: &DbPool, workflow_id: &str, args: &Value) -> AgentResult<Value> {
    let key = field_str(args, "key")?;
    let value = args.get("value").ok_or_else(|| AgentError::Director(DirectorError::Validation("'value' is required".into())))?;
    variable_queries::set(pool, workflow_id, key, value)?;
    Ok(json!({ "set": true }))
}

fn clear_variable(pool: &DbPool, workflow_id: &str, args: &Value) -> AgentResult<Value> {
    let key = field_str(args, "key")?;
    variable_queries::delete(pool, workflow_id, key)?;
    Ok(json!({ "cleared": true }))
}

async fn execute_nodes(pool: &DbPool, workflow_id: &str, browser: &BrowserFacade, args: &Value) -> AgentResult<Value> {
    let selection = field_str(args, "selection")?;
    let mode = match args.get("mode").and_then(Value::as_str) {
        Some("flow") => ExecutionMode::Flow,
        _ => ExecutionMode::Isolated,
    };
    let interpreter = Interpreter::new(pool, workflow_id, browser, None);
    let records = interpreter.run(selection, mode).await?;
    Ok(serde_json::to_value(records)?)
}

// --- perception tools ---

fn get_workflow_variables(pool: &DbPool, workflow_id: &str, args: &Value) -> AgentResult<Value> {
    match args.get("keys").and_then(Value::as_array) {
        Some(keys) => {
            let mut out = serde_json::Map::new();
            for key in keys.iter().filter_map(Value::as_str) {
                out.insert(key.to_string(), variable_queries::get(pool, workflow_id, key)?.unwrap_or(Value::Null));
            }
            Ok(Value::Object(out))
        }
        None => Ok(json!(variable_queries::get_all(pool, workflow_id)?.into_iter().collect::<serde_json::Map<_, _>>())),
    }
}

fn get_workflow_nodes(pool: &DbPool, workflow_id: &str, args: &Value) -> AgentResult<Value> {
    let from = args.get("from_position").and_then(Value::as_i64);
    let to = args.get("to_position").and_then(Value::as_i64);
    let rows = node_queries::list_nodes(pool, workflow_id)?
        .into_iter()
        .filter(|r| from.map(|f| r.position >= f).unwrap_or(true) && to.map(|t| r.position <= t).unwrap_or(true))
        .collect::<Vec<_>>();
    Ok(serde_json::to_value(rows)?)
}

async fn get_screenshot(browser: &BrowserFacade, args: &Value) -> AgentResult<Value> {
    let full_page = args.get("full_page").and_then(Value::as_bool).unwrap_or(false);
    let bytes = browser.screenshot(tab_arg(args), full_page).await.map_err(AgentError::Director)?;
    Ok(json!({ "base64": BASE64.encode(&bytes) }))
}

async fn dom_overview(browser: &BrowserFacade, args: &Value) -> AgentResult<Value> {
    let snapshot = browser.dom_snapshot(tab_arg(args)).await.map_err(AgentError::Director)?;
    let filters = args.get("filters").map(dom_toolkit::overview_filters_from_json).unwrap_or_default();
    let overview = dom_toolkit::overview(&snapshot, &filters, true, Some(200));
    Ok(serde_json::to_value(&overview)?)
}

async fn dom_structure(browser: &BrowserFacade, args: &Value) -> AgentResult<Value> {
    let snapshot = browser.dom_snapshot(tab_arg(args)).await.map_err(AgentError::Director)?;
    let depth = args.get("depth").and_then(Value::as_u64).unwrap_or(2) as usize;
    Ok(serde_json::to_value(dom_toolkit::structure(&snapshot, depth))?)
}

async fn dom_search(browser: &BrowserFacade, args: &Value) -> AgentResult<Value> {
    let snapshot = browser.dom_snapshot(tab_arg(args)).await.map_err(AgentError::Director)?;
    let query = SearchQuery {
        text: args.get("text").and_then(Value::as_str),
        selector_tag: args.get("tag").and_then(Value::as_str),
        attributes: Vec::new(),
        role: args.get("role").and_then(Value::as_str),
    };
    Ok(serde_json::to_value(dom_toolkit::search(&snapshot, &query, Some(100), true))?)
}

async fn dom_inspect(browser: &BrowserFacade, args: &Value) -> AgentResult<Value> {
    let snapshot = browser.dom_snapshot(tab_arg(args)).await.map_err(AgentError::Director)?;
    let selector = field_str(args, "selector")?;
    let element = dom_toolkit::query_selector_all(&snapshot, selector)
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::Director(DirectorError::ElementNotFound(selector.to_string())))?;

    let include = args
        .get("include")
        .map(|v| InspectInclude {
            attributes: v.get("attributes").and_then(Value::as_bool).unwrap_or(true),
            parents: v.get("parents").and_then(Value::as_bool).unwrap_or(true),
            children: v.get("children").and_then(Value::as_bool).unwrap_or(false),
            siblings: v.get("siblings").and_then(Value::as_bool).unwrap_or(false),
        })
        .unwrap_or(InspectInclude { attributes: true, parents: true, children: false, siblings: false });

    let result = dom_toolkit::inspect(&snapshot, &element.id, &include)
        .ok_or_else(|| AgentError::Director(DirectorError::ElementNotFound(selector.to_string())))?;
    Ok(serde_json::to_value(&result)?)
}

async fn dom_click_inspect(browser: &BrowserFacade, args: &Value) -> AgentResult<Value> {
    let snapshot = browser.dom_snapshot(tab_arg(args)).await.map_err(AgentError::Director)?;
    let x = args.get("x").and_then(Value::as_f64).unwrap_or(0.0);
    let y = args.get("y").and_then(Value::as_f64).unwrap_or(0.0);
    Ok(dom_toolkit::click_inspect(&snapshot, x, y).map(|r| serde_json::to_value(&r).unwrap_or(Value::Null)).unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_browser::MockDriver;
    use director_db::DbPool;
    use serde_json::json;

    fn test_pool() -> (DbPool, String) {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        let workflow_id = director_db::queries::workflows::create(&pool, "test").unwrap();
        (pool, workflow_id)
    }

    fn test_browser() -> BrowserFacade {
        BrowserFacade::new(Box::new(MockDriver::new()))
    }

    #[tokio::test]
    async fn add_or_replace_nodes_inserts_and_get_workflow_nodes_returns_them() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        let args = json!({
            "nodes": [{
                "type": "browser_action",
                "alias": "go_home",
                "config": {"action": "navigate", "url": "https://example.com"}
            }]
        });

        execute_tool(&pool, &workflow_id, &browser, "add_or_replace_nodes", &args).await.unwrap();

        let result = execute_tool(&pool, &workflow_id, &browser, "get_workflow_nodes", &json!({})).await.unwrap();
        let rows: Vec<NodeRow> = serde_json::from_value(result).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].alias, "go_home");
        assert_eq!(rows[0].position, 1);
    }

    #[tokio::test]
    async fn add_or_replace_nodes_rejects_unknown_type() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        let args = json!({"nodes": [{"type": "not_a_type", "alias": "x", "config": {}}]});

        let err = execute_tool(&pool, &workflow_id, &browser, "add_or_replace_nodes", &args).await.unwrap_err();
        assert!(matches!(err, AgentError::Director(DirectorError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_nodes_removes_by_id() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        let add_args = json!({"nodes": [{"type": "transform", "alias": "a", "config": {"expression": "1", "store_as": "x"}}]});
        let inserted = execute_tool(&pool, &workflow_id, &browser, "add_or_replace_nodes", &add_args).await.unwrap();
        let rows: Vec<NodeRow> = serde_json::from_value(inserted).unwrap();

        let delete_args = json!({"ids": [rows[0].id]});
        execute_tool(&pool, &workflow_id, &browser, "delete_nodes", &delete_args).await.unwrap();

        let remaining = node_queries::list_nodes(&pool, &workflow_id).unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn delete_nodes_dry_run_reports_without_removing() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        let add_args = json!({"nodes": [{"type": "transform", "alias": "a", "config": {"expression": "1", "store_as": "x"}}]});
        let inserted = execute_tool(&pool, &workflow_id, &browser, "add_or_replace_nodes", &add_args).await.unwrap();
        let rows: Vec<NodeRow> = serde_json::from_value(inserted).unwrap();

        let delete_args = json!({"ids": [rows[0].id], "dry_run": true});
        let result = execute_tool(&pool, &workflow_id, &browser, "delete_nodes", &delete_args).await.unwrap();
        assert_eq!(result["would_delete"], json!([rows[0].id]));

        let remaining = node_queries::list_nodes(&pool, &workflow_id).unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn set_get_and_clear_variable_round_trip() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();

        execute_tool(&pool, &workflow_id, &browser, "set_variable", &json!({"key": "city", "value": "Lisbon"})).await.unwrap();
        let fetched = execute_tool(&pool, &workflow_id, &browser, "get_workflow_variables", &json!({"keys": ["city"]})).await.unwrap();
        assert_eq!(fetched["city"], json!("Lisbon"));

        execute_tool(&pool, &workflow_id, &browser, "clear_variable", &json!({"key": "city"})).await.unwrap();
        let after_clear = execute_tool(&pool, &workflow_id, &browser, "get_workflow_variables", &json!({"keys": ["city"]})).await.unwrap();
        assert_eq!(after_clear["city"], Value::Null);
    }

    #[tokio::test]
    async fn clear_all_variables_empties_the_store() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        variable_queries::set(&pool, &workflow_id, "a", &json!(1)).unwrap();
        variable_queries::set(&pool, &workflow_id, "b", &json!(2)).unwrap();

        execute_tool(&pool, &workflow_id, &browser, "clear_all_variables", &json!({})).await.unwrap();

        assert!(variable_queries::get_all(&pool, &workflow_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_plan_and_get_current_plan_round_trip() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        let plan = json!({"steps": ["open", "search"]});

        execute_tool(&pool, &workflow_id, &browser, "update_plan", &json!({"plan": plan, "reason": "initial"})).await.unwrap();
        let fetched = execute_tool(&pool, &workflow_id, &browser, "get_current_plan", &json!({})).await.unwrap();
        assert_eq!(fetched, plan);
    }

    #[tokio::test]
    async fn update_workflow_description_increments_version() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();

        let first = execute_tool(&pool, &workflow_id, &browser, "update_workflow_description", &json!({"description": {"goal": "a"}})).await.unwrap();
        assert_eq!(first["version"], json!(1));
        let second = execute_tool(&pool, &workflow_id, &browser, "update_workflow_description", &json!({"description": {"goal": "b"}})).await.unwrap();
        assert_eq!(second["version"], json!(2));

        let fetched = execute_tool(&pool, &workflow_id, &browser, "get_workflow_description", &json!({})).await.unwrap();
        assert_eq!(fetched["version"], json!(2));
        assert_eq!(fetched["data"], json!({"goal": "b"}));
    }

    #[tokio::test]
    async fn execute_nodes_runs_a_selection_through_the_interpreter() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        node_queries::upsert_nodes(
            &pool,
            &workflow_id,
            &[DbUpsert {
                position: 1,
                alias: "compute".to_string(),
                r#type: "transform".to_string(),
                config: json!({"expression": "upper(\"done\")", "store_as": "result"}),
                description: None,
                store_variable: false,
            }],
        )
        .unwrap();

        let result = execute_tool(&pool, &workflow_id, &browser, "execute_nodes", &json!({"selection": "1"})).await.unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_value(result).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["status"], json!("success"));
    }

    #[tokio::test]
    async fn get_browser_state_reflects_opened_tabs() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        browser.open_tab("main", "https://example.com").await.unwrap();

        let state = execute_tool(&pool, &workflow_id, &browser, "get_browser_state", &json!({})).await.unwrap();
        assert_eq!(state["active_tab"], json!("main"));
    }

    #[tokio::test]
    async fn unknown_tool_name_is_rejected() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        let err = execute_tool(&pool, &workflow_id, &browser, "not_a_real_tool", &json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(name) if name == "not_a_real_tool"));
    }
}
