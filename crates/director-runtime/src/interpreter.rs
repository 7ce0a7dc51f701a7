//! The top-level node interpreter: executes a `Selection` under
//! `ExecutionMode::Isolated` or `ExecutionMode::Flow`,
//! dispatching each node to its per-type semantics and threading the
//! variable store and iteration/route/handle control flow through.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;

use director_browser::BrowserFacade;
use director_core::credential::CredentialStore;
use director_core::llm::LlmProvider;
use director_core::node::NodeType;
use director_core::variable::iteration_key;
use director_core::NodeFailure;
use director_db::queries::nodes::{self as node_queries, NodeRow};
use director_db::queries::variables as variable_queries;
use director_db::DbPool;
use regex::Regex;
use serde_json::Value;

use crate::error::{RuntimeError, RuntimeResult};
use crate::nodes::{self, NodeContext};
use crate::selection::{parse_selection, ExecutionMode, Selection};
use crate::template::VariableResolver;

fn credential_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*credential:([^{}]+?)\s*\}\}").unwrap())
}

/// Replace `{{credential:name}}` references inside `value` with the real
/// value from `creds`, recursively. Leaves unknown credential names literal.
fn inject_credentials(value: &mut Value, creds: &HashMap<String, String>) {
    match value {
        Value::String(s) => {
            if creds.is_empty() {
                return;
            }
            let re = credential_ref_re();
            if re.is_match(s) {
                *s = re
                    .replace_all(s, |caps: &regex::Captures| {
                        let name = caps[1].trim();
                        creds.get(name).cloned().unwrap_or_else(|| caps[0].to_string())
                    })
                    .into_owned();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| inject_credentials(v, creds)),
        Value::Object(map) => map.values_mut().for_each(|v| inject_credentials(v, creds)),
        _ => {}
    }
}

/// Replace any literal occurrence of a credential's real value inside
/// `value` back with its `{{credential:name}}` reference, so a dispatched
/// node's result or stored variable never carries the secret.
fn redact_credentials(value: &mut Value, creds: &HashMap<String, String>) {
    if creds.is_empty() {
        return;
    }
    match value {
        Value::String(s) => {
            for (name, secret) in creds {
                if !secret.is_empty() && s.contains(secret.as_str()) {
                    *s = s.replace(secret.as_str(), &format!("{{{{credential:{name}}}}}"));
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| redact_credentials(v, creds)),
        Value::Object(map) => map.values_mut().for_each(|v| redact_credentials(v, creds)),
        _ => {}
    }
}

fn clear_credentials(creds: &mut HashMap<String, String>) {
    for v in creds.values_mut() {
        v.clear();
    }
    creds.clear();
}

/// One node's outcome within a single `run()` call, in execution order.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeExecutionRecord {
    pub node_id: String,
    pub position: i64,
    pub alias: String,
    pub status: &'static str,
    pub result: Option<Value>,
    pub failure: Option<NodeFailure>,
}

pub struct Interpreter<'a> {
    pool: &'a DbPool,
    workflow_id: String,
    browser: &'a BrowserFacade,
    llm: Option<&'a (dyn LlmProvider + Send + Sync)>,
    credentials: Option<&'a (dyn CredentialStore + Send + Sync)>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        pool: &'a DbPool,
        workflow_id: impl Into<String>,
        browser: &'a BrowserFacade,
        llm: Option<&'a (dyn LlmProvider + Send + Sync)>,
    ) -> Self {
        Self { pool, workflow_id: workflow_id.into(), browser, llm, credentials: None }
    }

    /// Attach a credential store: `{{credential:name}}` references in
    /// browser-facing node configs are substituted with the real value only
    /// in the payload dispatched to the driver for that one step, never
    /// into stored config/result/variables, and the local copy is cleared
    /// once the step returns.
    pub fn with_credentials(mut self, store: &'a (dyn CredentialStore + Send + Sync)) -> Self {
        self.credentials = Some(store);
        self
    }

    async fn fetch_credentials(&self, step_id: &str) -> HashMap<String, String> {
        match self.credentials {
            Some(store) => store.get_for_step(step_id, &self.workflow_id).await,
            None => HashMap::new(),
        }
    }

    pub async fn run(&self, selection_input: &str, mode: ExecutionMode) -> RuntimeResult<Vec<NodeExecutionRecord>> {
        let rows = node_queries::list_nodes(self.pool, &self.workflow_id)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let variables = variable_queries::get_all(self.pool, &self.workflow_id)?;
        let mut resolver = VariableResolver::new(variables.into_iter().collect::<HashMap<_, _>>());

        let selection = parse_selection(selection_input, rows.len() as i64)?;
        let mut records = Vec::new();

        match mode {
            ExecutionMode::Isolated => {
                let positions = match &selection {
                    Selection::All => rows.iter().map(|r| r.position).collect::<Vec<_>>(),
                    Selection::Positions(p) => p.clone(),
                };
                for position in positions {
                    self.execute_node_full(&rows, position, &mut resolver, &mut records).await?;
                }
            }
            ExecutionMode::Flow => {
                let start = match &selection {
                    Selection::All => rows.first().map(|r| r.position).unwrap_or(1),
                    Selection::Positions(p) => {
                        *p.first().ok_or_else(|| RuntimeError::InvalidSelection("empty selection".into()))?
                    }
                };
                let max_position = rows.iter().map(|r| r.position).max().unwrap_or(start);
                let mut consumed: HashSet<i64> = HashSet::new();
                let mut position = start;
                while position <= max_position {
                    if !consumed.contains(&position) {
                        self.mark_children_consumed(&rows, position, &mut consumed);
                        self.execute_node_full(&rows, position, &mut resolver, &mut records).await?;
                    }
                    position += 1;
                }
            }
        }

        Ok(records)
    }

    /// In flow mode, body/branch/catch children of a control-flow node are
    /// reached only through that node, not as independent top-level steps.
    fn mark_children_consumed(&self, rows: &[NodeRow], position: i64, consumed: &mut HashSet<i64>) {
        let Ok(row) = find_row(rows, position) else { return };
        match NodeType::from_str(&row.r#type) {
            Some(NodeType::Iterate) => {
                if let Ok(cfg) = nodes::iterate::parse_config(&row.config) {
                    consumed.extend(cfg.body);
                }
            }
            Some(NodeType::Route) => {
                if let Ok(branches) = nodes::route::parse_config(&row.config) {
                    consumed.extend(branches.into_iter().flat_map(|b| b.branch));
                }
            }
            Some(NodeType::Handle) => {
                if let Ok(cfg) = nodes::handle::parse_config(&row.config) {
                    consumed.extend(cfg.catch);
                }
            }
            _ => {}
        }
    }

    fn execute_node_full<'b>(
        &'b self,
        rows: &'b [NodeRow],
        position: i64,
        resolver: &'b mut VariableResolver,
        records: &'b mut Vec<NodeExecutionRecord>,
    ) -> Pin<Box<dyn Future<Output = RuntimeResult<()>> + 'b>> {
        Box::pin(async move {
            let row = find_row(rows, position)?.clone();
            let node_type = NodeType::from_str(&row.r#type)
                .ok_or_else(|| RuntimeError::Validation(format!("unknown node type '{}'", row.r#type)))?;

            node_queries::set_node_status(self.pool, &self.workflow_id, &row.id, "running", None)?;

            match self.dispatch(&row, node_type, rows, resolver, records).await {
                Ok(value) => {
                    node_queries::set_node_status(self.pool, &self.workflow_id, &row.id, "success", Some(&value))?;
                    if row.store_variable {
                        variable_queries::set(self.pool, &self.workflow_id, &row.alias, &value)?;
                        resolver.set(row.alias.clone(), value.clone());
                    }
                    records.push(NodeExecutionRecord {
                        node_id: row.id.clone(),
                        position: row.position,
                        alias: row.alias.clone(),
                        status: "success",
                        result: Some(value),
                        failure: None,
                    });
                    Ok(())
                }
                Err(err) => {
                    let failure = NodeFailure { node_id: row.id.clone(), ..NodeFailure::from(&err) };
                    let failure_value = serde_json::to_value(&failure).unwrap_or(Value::Null);
                    node_queries::set_node_status(self.pool, &self.workflow_id, &row.id, "failed", Some(&failure_value))?;
                    records.push(NodeExecutionRecord {
                        node_id: row.id.clone(),
                        position: row.position,
                        alias: row.alias.clone(),
                        status: "failed",
                        result: None,
                        failure: Some(failure),
                    });
                    Err(err)
                }
            }
        })
    }

    async fn dispatch(
        &self,
        row: &NodeRow,
        node_type: NodeType,
        rows: &[NodeRow],
        resolver: &mut VariableResolver,
        records: &mut Vec<NodeExecutionRecord>,
    ) -> RuntimeResult<Value> {
        let ctx = NodeContext { browser: self.browser, llm: self.llm };

        match node_type {
            NodeType::BrowserAction => {
                let mut creds = self.fetch_credentials(&row.id).await;
                let mut payload = resolver.resolve_value(&row.config);
                inject_credentials(&mut payload, &creds);
                let result = nodes::browser_action::execute(&ctx, &payload).await;
                let result = result.map(|mut v| {
                    redact_credentials(&mut v, &creds);
                    v
                });
                clear_credentials(&mut creds);
                result
            }
            NodeType::BrowserAiAction => {
                let mut creds = self.fetch_credentials(&row.id).await;
                let mut payload = resolver.resolve_value(&row.config);
                inject_credentials(&mut payload, &creds);
                let result = nodes::browser_ai::execute_action(&ctx, &payload).await;
                let result = result.map(|mut v| {
                    redact_credentials(&mut v, &creds);
                    v
                });
                clear_credentials(&mut creds);
                result
            }
            NodeType::BrowserAiExtract => {
                let mut creds = self.fetch_credentials(&row.id).await;
                let mut payload = resolver.resolve_value(&row.config);
                inject_credentials(&mut payload, &creds);
                let result = nodes::browser_ai::execute_extract(&ctx, &payload).await;
                let result = result.map(|mut v| {
                    redact_credentials(&mut v, &creds);
                    v
                });
                clear_credentials(&mut creds);
                result
            }
            NodeType::BrowserQuery => {
                let mut creds = self.fetch_credentials(&row.id).await;
                let mut resolved = resolver.resolve_value(&row.config);
                inject_credentials(&mut resolved, &creds);
                let result = match resolved.get("method").and_then(Value::as_str).unwrap_or("validate") {
                    "deterministic_extract" => nodes::browser_query::deterministic_extract(&ctx, &resolved).await,
                    _ => nodes::browser_query::validate(&ctx, &resolved).await,
                };
                let result = result.map(|mut v| {
                    redact_credentials(&mut v, &creds);
                    v
                });
                clear_credentials(&mut creds);
                result
            }
            NodeType::Cognition => nodes::cognition::execute(&ctx, &row.config, resolver).await,
            NodeType::Context => {
                let entries = nodes::context::execute(&row.config, resolver)?;
                for (key, value) in &entries {
                    variable_queries::set(self.pool, &self.workflow_id, key, value)?;
                    resolver.set(key.clone(), value.clone());
                }
                Ok(Value::Object(entries.into_iter().collect()))
            }
            NodeType::Transform => {
                let (store_as, value) = nodes::transform::execute(&row.config, resolver)?;
                variable_queries::set(self.pool, &self.workflow_id, &store_as, &value)?;
                resolver.set(store_as, value.clone());
                Ok(value)
            }
            NodeType::Iterate => self.run_iterate(row, rows, resolver, records).await,
            NodeType::Route => self.run_route(row, rows, resolver, records).await,
            NodeType::Handle => self.run_handle(row, rows, resolver, records).await,
        }
    }

    async fn run_iterate(
        &self,
        row: &NodeRow,
        rows: &[NodeRow],
        resolver: &mut VariableResolver,
        records: &mut Vec<NodeExecutionRecord>,
    ) -> RuntimeResult<Value> {
        let cfg = nodes::iterate::parse_config(&row.config)?;
        let items = nodes::iterate::resolve_items(&cfg, resolver)?;
        variable_queries::clear_iteration_for(self.pool, &self.workflow_id, &row.position.to_string())?;

        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut errors = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let item_key = iteration_key(&cfg.variable, row.position, index);
            let index_key = iteration_key(&format!("{}Index", cfg.variable), row.position, index);
            let total_key = iteration_key(&format!("{}Total", cfg.variable), row.position, index);

            variable_queries::set(self.pool, &self.workflow_id, &item_key, &item)?;
            variable_queries::set(self.pool, &self.workflow_id, &index_key, &Value::from(index as i64))?;
            variable_queries::set(self.pool, &self.workflow_id, &total_key, &Value::from(total as i64))?;
            resolver.set(item_key, item.clone());
            resolver.set(index_key, Value::from(index as i64));
            resolver.set(total_key, Value::from(total as i64));

            resolver.push_iteration(row.position, index);
            let mut step_failed = None;
            for &body_position in &cfg.body {
                if let Err(err) = self.execute_node_full(rows, body_position, resolver, records).await {
                    step_failed = Some(err);
                    break;
                }
            }
            resolver.pop_iteration();

            match step_failed {
                None => results.push(item),
                Some(err) => {
                    errors.push(NodeFailure::from(&err));
                    if !cfg.continue_on_error {
                        return Err(err);
                    }
                }
            }
        }

        Ok(serde_json::json!({
            "results": results,
            "errors": errors,
            "processed": results.len() + errors.len(),
            "total": total,
        }))
    }

    async fn run_route(
        &self,
        row: &NodeRow,
        rows: &[NodeRow],
        resolver: &mut VariableResolver,
        records: &mut Vec<NodeExecutionRecord>,
    ) -> RuntimeResult<Value> {
        let branches = nodes::route::parse_config(&row.config)?;
        let selected = nodes::route::select(&branches, resolver).cloned();

        match selected {
            Some(branch) => {
                for position in &branch.branch {
                    self.execute_node_full(rows, *position, resolver, records).await?;
                }
                Ok(serde_json::json!({ "selected": branch.name }))
            }
            None => Err(RuntimeError::RouteNoMatch),
        }
    }

    async fn run_handle(
        &self,
        row: &NodeRow,
        rows: &[NodeRow],
        resolver: &mut VariableResolver,
        records: &mut Vec<NodeExecutionRecord>,
    ) -> RuntimeResult<Value> {
        let cfg = nodes::handle::parse_config(&row.config)?;

        for position in &cfg.catch {
            if let Err(err) = self.execute_node_full(rows, *position, resolver, records).await {
                let failure = NodeFailure::from(&err);
                return Ok(serde_json::json!({ "caught": true, "error": failure }));
            }
        }

        Ok(serde_json::json!({ "caught": false }))
    }
}

fn find_row(rows: &[NodeRow], position: i64) -> RuntimeResult<&NodeRow> {
    rows.iter()
        .find(|r| r.position == position)
        .ok_or_else(|| RuntimeError::InvalidSelection(format!("no node at position {position}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use director_browser::MockDriver;
    use director_db::queries::nodes::{NodeUpsert, upsert_nodes};
    use director_db::queries::workflows;
    use serde_json::json;

    fn test_pool() -> (DbPool, String) {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        let workflow_id = workflows::create(&pool, "test").unwrap();
        (pool, workflow_id)
    }

    fn test_browser() -> BrowserFacade {
        BrowserFacade::new(Box::new(MockDriver::new()))
    }

    #[tokio::test]
    async fn route_with_no_matching_branch_is_a_runtime_error() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        upsert_nodes(
            &pool,
            &workflow_id,
            &[NodeUpsert {
                position: 1,
                alias: "router".to_string(),
                r#type: "route".to_string(),
                config: json!([{"name": "a", "condition": "false", "branch": []}]),
                description: None,
                store_variable: false,
            }],
        )
        .unwrap();

        let interpreter = Interpreter::new(&pool, workflow_id, &browser, None);
        let err = interpreter.run("1", ExecutionMode::Isolated).await.unwrap_err();
        assert!(matches!(err, RuntimeError::RouteNoMatch));
    }

    struct StaticCredentialStore {
        values: HashMap<String, String>,
    }

    #[async_trait]
    impl CredentialStore for StaticCredentialStore {
        async fn get_for_step(&self, _step_id: &str, _workflow_id: &str) -> HashMap<String, String> {
            self.values.clone()
        }
    }

    #[tokio::test]
    async fn credential_is_injected_into_the_dispatched_payload_and_redacted_from_the_result() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        browser.open_tab("main", "about:blank").await.unwrap();

        upsert_nodes(
            &pool,
            &workflow_id,
            &[NodeUpsert {
                position: 1,
                alias: "go".to_string(),
                r#type: "browser_action".to_string(),
                config: json!({"action": "navigate", "url": "https://example.com/{{credential:api_key}}"}),
                description: None,
                store_variable: true,
            }],
        )
        .unwrap();

        let mut values = HashMap::new();
        values.insert("api_key".to_string(), "supersecret".to_string());
        let store = StaticCredentialStore { values };

        let interpreter = Interpreter::new(&pool, workflow_id.clone(), &browser, None).with_credentials(&store);
        let records = interpreter.run("1", ExecutionMode::Isolated).await.unwrap();

        // The real secret reached the driver.
        assert_eq!(browser.current_url(Some("main")).await.unwrap(), "https://example.com/supersecret");

        // But the node's own result never carries it.
        let result = records[0].result.as_ref().unwrap();
        let rendered = result.to_string();
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("{{credential:api_key}}"));

        // Nor does the stored variable (store_variable = true for this node).
        let stored = variable_queries::get(&pool, &workflow_id, "go").unwrap().unwrap();
        assert!(!stored.to_string().contains("supersecret"));
    }

    #[tokio::test]
    async fn without_a_credential_store_the_reference_is_left_literal() {
        let (pool, workflow_id) = test_pool();
        let browser = test_browser();
        browser.open_tab("main", "about:blank").await.unwrap();

        upsert_nodes(
            &pool,
            &workflow_id,
            &[NodeUpsert {
                position: 1,
                alias: "go".to_string(),
                r#type: "browser_action".to_string(),
                config: json!({"action": "navigate", "url": "https://example.com/{{credential:api_key}}"}),
                description: None,
                store_variable: false,
            }],
        )
        .unwrap();

        let interpreter = Interpreter::new(&pool, workflow_id, &browser, None);
        interpreter.run("1", ExecutionMode::Isolated).await.unwrap();

        assert_eq!(browser.current_url(Some("main")).await.unwrap(), "https://example.com/{{credential:api_key}}");
    }
}
