//! `transform`: `{expression, store_as}`. `expression` is
//! evaluated by a small function-aware extension of the route expression
//! evaluator: a bare `{{path}}` or literal resolves via
//! `VariableResolver`; `name(arg, arg, ...)` calls one of `len`, `concat`,
//! `join`, `upper`, `lower`, `now` over resolved arguments.

use crate::error::{RuntimeError, RuntimeResult};
use crate::template::VariableResolver;
use chrono::Utc;
use serde_json::Value;

pub fn execute(config: &Value, resolver: &VariableResolver) -> RuntimeResult<(String, Value)> {
    let expression = config
        .get("expression")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::Validation("transform requires 'expression'".into()))?;
    let store_as = config
        .get("store_as")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::Validation("transform requires 'store_as'".into()))?;

    Ok((store_as.to_string(), eval_expression(expression, resolver)?))
}

fn eval_expression(expr: &str, resolver: &VariableResolver) -> RuntimeResult<Value> {
    let trimmed = expr.trim();
    if let Some((name, inner)) = parse_call(trimmed) {
        let args: Vec<Value> = split_args(inner).into_iter().map(|a| resolve_arg(a, resolver)).collect();
        return call_function(name, &args);
    }
    Ok(resolver.resolve_value(&Value::String(trimmed.to_string())))
}

fn parse_call(expr: &str) -> Option<(&str, &str)> {
    let open = expr.find('(')?;
    if !expr.ends_with(')') {
        return None;
    }
    let name = &expr[..open];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, &expr[open + 1..expr.len() - 1]))
}

/// Splits a flat, comma-separated argument list. Arguments are not
/// themselves allowed to contain function calls (no nesting), matching
/// the deliberately small scope of this evaluator.
fn split_args(inner: &str) -> Vec<&str> {
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner.split(',').map(str::trim).collect()
}

fn resolve_arg(arg: &str, resolver: &VariableResolver) -> Value {
    let trimmed = arg.trim();
    if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        return Value::String(trimmed[1..trimmed.len() - 1].to_string());
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return Value::Number(num);
        }
    }
    resolver.resolve_value(&Value::String(trimmed.to_string()))
}

fn value_len(value: &Value) -> i64 {
    match value {
        Value::Array(items) => items.len() as i64,
        Value::Object(map) => map.len() as i64,
        Value::String(s) => s.chars().count() as i64,
        Value::Null => 0,
        _ => 1,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn call_function(name: &str, args: &[Value]) -> RuntimeResult<Value> {
    match name {
        "len" => {
            let arg = args.first().ok_or_else(|| RuntimeError::Validation("len() requires one argument".into()))?;
            Ok(Value::Number(value_len(arg).into()))
        }
        "concat" => Ok(Value::String(args.iter().map(value_text).collect())),
        "join" => {
            let items = args
                .first()
                .and_then(Value::as_array)
                .ok_or_else(|| RuntimeError::Validation("join() requires an array first argument".into()))?;
            let sep = args.get(1).map(value_text).unwrap_or_default();
            let joined = items.iter().map(value_text).collect::<Vec<_>>().join(&sep);
            Ok(Value::String(joined))
        }
        "upper" => Ok(Value::String(args.first().map(value_text).unwrap_or_default().to_uppercase())),
        "lower" => Ok(Value::String(args.first().map(value_text).unwrap_or_default().to_lowercase())),
        "now" => Ok(Value::String(Utc::now().to_rfc3339())),
        other => Err(RuntimeError::Validation(format!("unknown transform function '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn resolver() -> VariableResolver {
        let mut vars = HashMap::new();
        vars.insert("items".to_string(), json!(["a", "b", "c"]));
        vars.insert("name".to_string(), json!("Ada"));
        VariableResolver::new(vars)
    }

    #[test]
    fn len_counts_array_elements() {
        let (store_as, value) =
            execute(&json!({"expression": "len({{items}})", "store_as": "count"}), &resolver()).unwrap();
        assert_eq!(store_as, "count");
        assert_eq!(value, json!(3));
    }

    #[test]
    fn join_concatenates_with_separator() {
        let (_, value) =
            execute(&json!({"expression": "join({{items}}, \", \")", "store_as": "joined"}), &resolver()).unwrap();
        assert_eq!(value, json!("a, b, c"));
    }

    #[test]
    fn upper_uppercases_resolved_variable() {
        let (_, value) = execute(&json!({"expression": "upper({{name}})", "store_as": "shout"}), &resolver()).unwrap();
        assert_eq!(value, json!("ADA"));
    }

    #[test]
    fn bare_template_resolves_to_native_value() {
        let (_, value) = execute(&json!({"expression": "{{items}}", "store_as": "copy"}), &resolver()).unwrap();
        assert_eq!(value, json!(["a", "b", "c"]));
    }
}
