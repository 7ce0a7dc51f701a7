//! `iterate`: `{over, variable, body, limit?, continueOnError?, index?}`.
//! The looping itself lives in `interpreter.rs`, which
//! needs to call back into node dispatch for each body position; this
//! module only parses config and resolves the array to iterate over.

use crate::error::{RuntimeError, RuntimeResult};
use crate::template::VariableResolver;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct IterateConfig {
    pub over: String,
    pub variable: String,
    pub body: Vec<i64>,
    pub limit: Option<usize>,
    pub continue_on_error: bool,
}

fn positions_of(value: &Value) -> Vec<i64> {
    match value {
        Value::Number(n) => n.as_i64().into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    }
}

pub fn parse_config(config: &Value) -> RuntimeResult<IterateConfig> {
    let over = config
        .get("over")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::Validation("iterate requires 'over'".into()))?
        .to_string();
    let variable = config
        .get("variable")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::Validation("iterate requires 'variable'".into()))?
        .to_string();
    let body = positions_of(config.get("body").unwrap_or(&Value::Null));
    let limit = config.get("limit").and_then(Value::as_u64).map(|n| n as usize);
    let continue_on_error = config.get("continueOnError").and_then(Value::as_bool).unwrap_or(false);

    Ok(IterateConfig { over, variable, body, limit, continue_on_error })
}

/// Resolves `over` against the variable store. A numeric-keyed object
/// (`{"0": "a", "1": "b"}`) coerces to an array the same way schema
/// validation does. Fails clearly, naming the variable, if it resolves to
/// neither.
pub fn resolve_items(cfg: &IterateConfig, resolver: &VariableResolver) -> RuntimeResult<Vec<Value>> {
    let resolved = resolver.resolve_path(&cfg.over).unwrap_or(Value::Null);
    let items = match resolved {
        Value::Array(items) => items,
        Value::Object(map) => match crate::schema::object_with_numeric_keys_to_array(&map) {
            Some(items) => items,
            None => {
                return Err(RuntimeError::NotArray {
                    variable: cfg.over.clone(),
                    actual_type: crate::schema::value_type_name(&Value::Object(map)).to_string(),
                })
            }
        },
        other => {
            return Err(RuntimeError::NotArray {
                variable: cfg.over.clone(),
                actual_type: crate::schema::value_type_name(&other).to_string(),
            })
        }
    };

    Ok(match cfg.limit {
        Some(limit) => items.into_iter().take(limit).collect(),
        None => items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn resolves_array_variable() {
        let mut vars = HashMap::new();
        vars.insert("rows".to_string(), json!([1, 2, 3]));
        let resolver = VariableResolver::new(vars);
        let cfg = IterateConfig {
            over: "rows".to_string(),
            variable: "row".to_string(),
            body: vec![2],
            limit: None,
            continue_on_error: false,
        };
        assert_eq!(resolve_items(&cfg, &resolver).unwrap(), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn numeric_keyed_object_coerces_to_array() {
        let mut vars = HashMap::new();
        vars.insert("rows".to_string(), json!({"0": "a", "1": "b", "2": "c"}));
        let resolver = VariableResolver::new(vars);
        let cfg = IterateConfig {
            over: "rows".to_string(),
            variable: "row".to_string(),
            body: vec![2],
            limit: None,
            continue_on_error: false,
        };
        assert_eq!(resolve_items(&cfg, &resolver).unwrap(), vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn non_array_fails_naming_variable() {
        let mut vars = HashMap::new();
        vars.insert("rows".to_string(), json!("not an array"));
        let resolver = VariableResolver::new(vars);
        let cfg = IterateConfig {
            over: "rows".to_string(),
            variable: "row".to_string(),
            body: vec![],
            limit: None,
            continue_on_error: false,
        };
        let err = resolve_items(&cfg, &resolver).unwrap_err();
        match err {
            RuntimeError::NotArray { variable, .. } => assert_eq!(variable, "rows"),
            other => panic!("expected NotArray, got {other:?}"),
        }
    }
}
