//! `browser_query`: `validate` (element_exists/element_absent rules) and
//! `deterministic_extract` (selector + fields map).

use super::NodeContext;
use crate::error::{RuntimeError, RuntimeResult};
use director_browser::dom_toolkit::query_selector_all;
use director_core::dom::DomElement;
use serde_json::{json, Value};

#[derive(Debug, Clone, serde::Serialize)]
struct RuleOutcome {
    rule: String,
    selector: String,
    passed: bool,
}

/// Runs every `element_exists`/`element_absent` rule against a fresh
/// snapshot. Rules default to `stop_workflow` on failure; a rule with
/// `onFailure: "continue_with_error"` is recorded but does not fail the
/// overall node.
pub async fn validate(ctx: &NodeContext<'_>, config: &Value) -> RuntimeResult<Value> {
    let tab = config.get("tab").and_then(Value::as_str);
    let snapshot = ctx.browser.dom_snapshot(tab).await?;

    let rules = config
        .get("rules")
        .and_then(Value::as_array)
        .ok_or_else(|| RuntimeError::Validation("browser_query.validate requires 'rules'".into()))?;

    let mut outcomes = Vec::with_capacity(rules.len());
    let mut hard_failure: Option<String> = None;

    for rule in rules {
        let kind = rule.get("rule").and_then(Value::as_str).unwrap_or("element_exists");
        let selector = rule
            .get("selector")
            .and_then(Value::as_str)
            .ok_or_else(|| RuntimeError::Validation("validate rule requires 'selector'".into()))?;
        let on_failure = rule.get("onFailure").and_then(Value::as_str).unwrap_or("stop_workflow");

        let found = !query_selector_all(&snapshot, selector).is_empty();
        let passed = match kind {
            "element_absent" => !found,
            _ => found,
        };

        outcomes.push(RuleOutcome { rule: kind.to_string(), selector: selector.to_string(), passed });

        if !passed && on_failure == "stop_workflow" && hard_failure.is_none() {
            hard_failure = Some(format!("{kind} failed for selector '{selector}'"));
        }
    }

    if let Some(message) = hard_failure {
        return Err(RuntimeError::Validation(message));
    }

    Ok(json!({ "rules": outcomes }))
}

fn extract_field(el: &DomElement, spec: &str) -> Value {
    if let Some(attr) = spec.strip_prefix('@') {
        if let Some((name, expected)) = attr.split_once('~') {
            return json!(el.attr(name).map(|v| v.contains(expected)).unwrap_or(false));
        }
        return el.attr(attr).map(|v| json!(v)).unwrap_or(Value::Null);
    }
    Value::Null
}

/// `selector` + a `fields` map. Each field value is either `"@attr"`
/// (attribute read), `"@attr~value"` (contains check), or a sub-selector
/// resolved relative to the matched element's own subtree isn't tracked by
/// the flat snapshot model, so sub-selectors are matched against the whole
/// snapshot and the first result nested under the same ancestry is used.
pub async fn deterministic_extract(ctx: &NodeContext<'_>, config: &Value) -> RuntimeResult<Value> {
    let tab = config.get("tab").and_then(Value::as_str);
    let snapshot = ctx.browser.dom_snapshot(tab).await?;

    let selector = config
        .get("selector")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::Validation("deterministic_extract requires 'selector'".into()))?;
    let fields = config
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| RuntimeError::Validation("deterministic_extract requires 'fields'".into()))?;
    let limit = config.get("limit").and_then(Value::as_u64).map(|n| n as usize);

    let mut matches = query_selector_all(&snapshot, selector);
    matches.sort_by(|a, b| a.id.cmp(&b.id));
    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    let mut rows = Vec::with_capacity(matches.len());
    for el in matches {
        let mut row = serde_json::Map::with_capacity(fields.len());
        for (name, spec) in fields {
            let value = match spec.as_str() {
                Some(s) if s.starts_with('@') => extract_field(el, s),
                Some(sub_selector) => query_selector_all(&snapshot, sub_selector)
                    .into_iter()
                    .find(|candidate| candidate.ancestry.contains(&el.id))
                    .and_then(|candidate| candidate.text.clone())
                    .map(Value::String)
                    .unwrap_or(Value::Null),
                None => Value::Null,
            };
            row.insert(name.clone(), value);
        }
        rows.push(Value::Object(row));
    }

    Ok(Value::Array(rows))
}
