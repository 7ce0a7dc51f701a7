//! `cognition`: a single LLM reasoning call with a template-interpolated
//! instruction and a required output schema.

use super::NodeContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::schema::validate_and_coerce;
use crate::template::VariableResolver;
use director_core::llm::{ChatMessage, ChatRequest};
use serde_json::Value;

pub async fn execute(ctx: &NodeContext<'_>, config: &Value, resolver: &VariableResolver) -> RuntimeResult<Value> {
    let llm = ctx
        .llm
        .ok_or_else(|| RuntimeError::Validation("cognition node requires an LLM provider".into()))?;

    let instruction = config
        .get("instruction")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::Validation("cognition requires 'instruction'".into()))?;
    let schema = config
        .get("schema")
        .ok_or_else(|| RuntimeError::Validation("cognition requires 'schema'".into()))?;

    let resolved_instruction = resolver.resolve_template(instruction);
    let request = ChatRequest {
        messages: vec![ChatMessage { role: "user".to_string(), content: resolved_instruction }],
        tools: Vec::new(),
        response_schema: Some(schema.clone()),
        reasoning_encrypted: None,
    };

    let response = llm.complete(request).await?;
    let parsed: Value = serde_json::from_str(&response.text)
        .unwrap_or_else(|_| Value::String(response.text.clone()));

    let (coerced, _log) = validate_and_coerce(schema, &parsed)?;
    Ok(coerced)
}
