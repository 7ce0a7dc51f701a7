//! `browser_ai_action` and `browser_ai_extract`.
//!
//! `browser_ai_action` never returns structured data: it is `click|type|act`
//! phrased as natural language and delegated entirely to `aiAct`. Anything
//! needing structured output is `browser_ai_extract` (delegates to
//! `aiExtract`) instead.

use super::NodeContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::schema::validate_and_coerce;
use serde_json::{json, Value};

pub async fn execute_action(ctx: &NodeContext<'_>, config: &Value) -> RuntimeResult<Value> {
    let verb = config.get("action").and_then(Value::as_str).unwrap_or("act");
    let instruction = config
        .get("instruction")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::Validation("browser_ai_action requires 'instruction'".into()))?;
    let tab = config.get("tab").and_then(Value::as_str);
    let constraints = config.get("constraints");

    let phrased = match verb {
        "click" => format!("Click: {instruction}"),
        "type" => format!("Type: {instruction}"),
        _ => instruction.to_string(),
    };

    let outcome = ctx.browser.ai_act(tab, &phrased, constraints).await?;
    Ok(json!({ "outcome": outcome }))
}

pub async fn execute_extract(ctx: &NodeContext<'_>, config: &Value) -> RuntimeResult<Value> {
    let instruction = config
        .get("instruction")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::Validation("browser_ai_extract requires 'instruction'".into()))?;
    let schema = config
        .get("schema")
        .ok_or_else(|| RuntimeError::Validation("browser_ai_extract requires 'schema'".into()))?;
    let tab = config.get("tab").and_then(Value::as_str);

    let extracted = ctx.browser.ai_extract(tab, instruction, schema).await?;
    let (coerced, _log) = validate_and_coerce(schema, &extracted)?;
    Ok(coerced)
}
