//! `handle`: `{catch: Vec<NodeId-or-position>}`. The body
//! inside `catch` runs with `continueOnError`-like semantics: the first
//! failure is captured into the `handle` node's own result instead of
//! propagating. Looping over `catch` lives in `interpreter.rs`.

use crate::error::{RuntimeError, RuntimeResult};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HandleConfig {
    pub catch: Vec<i64>,
}

pub fn parse_config(config: &Value) -> RuntimeResult<HandleConfig> {
    let catch = config
        .get("catch")
        .and_then(Value::as_array)
        .ok_or_else(|| RuntimeError::Validation("handle requires 'catch'".into()))?
        .iter()
        .filter_map(Value::as_i64)
        .collect();
    Ok(HandleConfig { catch })
}
