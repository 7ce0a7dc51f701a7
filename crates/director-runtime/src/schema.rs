//! Schema validation and coercion for AI-produced node outputs, built on
//! the `jsonschema` crate the way `siumai_extras::schema` compiles and
//! re-uses a validator.

use crate::error::{RuntimeError, RuntimeResult};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CoercionLog {
    pub rule: &'static str,
    pub detail: String,
}

/// Validate `value` against `schema`. If invalid, attempt the bounded set
/// of coercions once, then re-validate. On success
/// returns the (possibly coerced) value and the coercions applied; on
/// failure returns a `RuntimeError::SchemaValidation`-shaped error naming
/// expected vs received types.
pub fn validate_and_coerce(schema: &Value, value: &Value) -> RuntimeResult<(Value, Vec<CoercionLog>)> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| RuntimeError::Validation(format!("invalid schema: {e}")))?;

    if validator.is_valid(value) {
        return Ok((value.clone(), Vec::new()));
    }

    let mut log = Vec::new();
    let coerced = coerce_to_schema(schema, value, &mut log);

    if validator.is_valid(&coerced) {
        for entry in &log {
            debug!(rule = entry.rule, detail = %entry.detail, "schema coercion applied");
        }
        return Ok((coerced, log));
    }

    Err(RuntimeError::SchemaValidation {
        expected: schema_type_summary(schema),
        received: value_type_name(&coerced).to_string(),
    })
}

fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(types)) => types.first().and_then(Value::as_str),
        _ => None,
    }
}

fn schema_type_summary(schema: &Value) -> String {
    schema_type(schema).unwrap_or("unknown").to_string()
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce_to_schema(schema: &Value, value: &Value, log: &mut Vec<CoercionLog>) -> Value {
    match schema_type(schema) {
        Some("array") => coerce_array(schema, value, log),
        Some("object") => coerce_object(schema, value, log),
        Some("string") => coerce_primitive_to(value, "string", log),
        Some("number") | Some("integer") => coerce_primitive_to(value, "number", log),
        Some("boolean") => coerce_primitive_to(value, "boolean", log),
        _ => value.clone(),
    }
}

/// Object with purely numeric keys → array (sorted by key).
pub(crate) fn object_with_numeric_keys_to_array(map: &Map<String, Value>) -> Option<Vec<Value>> {
    if map.is_empty() {
        return None;
    }
    let mut entries: Vec<(u64, &Value)> = Vec::with_capacity(map.len());
    for (k, v) in map {
        entries.push((k.parse::<u64>().ok()?, v));
    }
    entries.sort_by_key(|(k, _)| *k);
    Some(entries.into_iter().map(|(_, v)| v.clone()).collect())
}

fn coerce_array(schema: &Value, value: &Value, log: &mut Vec<CoercionLog>) -> Value {
    let as_array: Vec<Value> = match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            if let Some(items) = object_with_numeric_keys_to_array(map) {
                log.push(CoercionLog {
                    rule: "object_with_numeric_keys_to_array",
                    detail: format!("{} entries", items.len()),
                });
                items
            } else {
                return value.clone();
            }
        }
        Value::String(s) => {
            if let Ok(Value::Array(parsed)) = serde_json::from_str::<Value>(s) {
                log.push(CoercionLog { rule: "parse_string_json", detail: "string -> array".into() });
                parsed
            } else {
                log.push(CoercionLog { rule: "wrap_single_value", detail: "string -> [string]".into() });
                vec![value.clone()]
            }
        }
        other => {
            log.push(CoercionLog { rule: "wrap_single_value", detail: format!("{} -> array", value_type_name(other)) });
            vec![other.clone()]
        }
    };

    let items_schema = schema.get("items");
    let coerced_items = match items_schema {
        Some(item_schema) => as_array.iter().map(|item| coerce_to_schema(item_schema, item, log)).collect(),
        None => as_array,
    };
    Value::Array(coerced_items)
}

fn coerce_object(schema: &Value, value: &Value, log: &mut Vec<CoercionLog>) -> Value {
    let mut map = match value {
        Value::Object(map) => map.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(parsed)) => {
                log.push(CoercionLog { rule: "parse_string_json", detail: "string -> object".into() });
                parsed
            }
            _ => return value.clone(),
        },
        _ => return value.clone(),
    };

    if let Some(Value::Object(properties)) = schema.get("properties") {
        map = rename_case_insensitive(map, properties, log);
        for (prop_name, prop_schema) in properties {
            if let Some(existing) = map.get(prop_name).cloned() {
                map.insert(prop_name.clone(), coerce_to_schema(prop_schema, &existing, log));
            }
        }
    }

    Value::Object(map)
}

/// Case-insensitive property renaming to match schema properties.
fn rename_case_insensitive(
    map: Map<String, Value>,
    properties: &Map<String, Value>,
    log: &mut Vec<CoercionLog>,
) -> Map<String, Value> {
    let mut renamed = Map::with_capacity(map.len());
    for (key, value) in map {
        if properties.contains_key(&key) {
            renamed.insert(key, value);
            continue;
        }
        let canonical = properties.keys().find(|p| p.eq_ignore_ascii_case(&key));
        match canonical {
            Some(canonical_key) => {
                log.push(CoercionLog {
                    rule: "case_insensitive_rename",
                    detail: format!("{key} -> {canonical_key}"),
                });
                renamed.insert(canonical_key.clone(), value);
            }
            None => {
                renamed.insert(key, value);
            }
        }
    }
    renamed
}

/// Primitive ↔ primitive coercion for string/number/boolean.
fn coerce_primitive_to(value: &Value, target: &str, log: &mut Vec<CoercionLog>) -> Value {
    match (target, value) {
        ("string", Value::Number(n)) => {
            log.push(CoercionLog { rule: "primitive_coercion", detail: "number -> string".into() });
            Value::String(n.to_string())
        }
        ("string", Value::Bool(b)) => {
            log.push(CoercionLog { rule: "primitive_coercion", detail: "boolean -> string".into() });
            Value::String(b.to_string())
        }
        ("number", Value::String(s)) => match s.parse::<f64>() {
            Ok(n) => {
                log.push(CoercionLog { rule: "primitive_coercion", detail: "string -> number".into() });
                serde_json::Number::from_f64(n).map(Value::Number).unwrap_or_else(|| value.clone())
            }
            Err(_) => value.clone(),
        },
        ("number", Value::Bool(b)) => {
            log.push(CoercionLog { rule: "primitive_coercion", detail: "boolean -> number".into() });
            Value::Number(serde_json::Number::from(if *b { 1 } else { 0 }))
        }
        ("boolean", Value::String(s)) => match s.to_lowercase().as_str() {
            "true" => {
                log.push(CoercionLog { rule: "primitive_coercion", detail: "string -> boolean".into() });
                Value::Bool(true)
            }
            "false" => {
                log.push(CoercionLog { rule: "primitive_coercion", detail: "string -> boolean".into() });
                Value::Bool(false)
            }
            _ => value.clone(),
        },
        ("boolean", Value::Number(n)) => {
            log.push(CoercionLog { rule: "primitive_coercion", detail: "number -> boolean".into() });
            Value::Bool(n.as_f64().unwrap_or(0.0) != 0.0)
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_with_numeric_keys_coerces_to_array() {
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let value = json!({"0": "a", "1": "b", "2": "c"});
        let (coerced, log) = validate_and_coerce(&schema, &value).unwrap();
        assert_eq!(coerced, json!(["a", "b", "c"]));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn single_value_wraps_into_array() {
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let value = json!("solo");
        let (coerced, _) = validate_and_coerce(&schema, &value).unwrap();
        assert_eq!(coerced, json!(["solo"]));
    }

    #[test]
    fn case_insensitive_property_renaming() {
        let schema = json!({"type": "object", "properties": {"fullName": {"type": "string"}}});
        let value = json!({"fullname": "Ada Lovelace"});
        let (coerced, _) = validate_and_coerce(&schema, &value).unwrap();
        assert_eq!(coerced, json!({"fullName": "Ada Lovelace"}));
    }

    #[test]
    fn string_json_parses_when_target_is_object() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "number"}}});
        let value = json!("{\"a\": 1}");
        let (coerced, _) = validate_and_coerce(&schema, &value).unwrap();
        assert_eq!(coerced, json!({"a": 1.0}));
    }

    #[test]
    fn primitive_string_to_number_coercion() {
        let schema = json!({"type": "number"});
        let value = json!("42");
        let (coerced, _) = validate_and_coerce(&schema, &value).unwrap();
        assert_eq!(coerced, json!(42.0));
    }

    #[test]
    fn already_valid_value_is_untouched() {
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let value = json!(["a", "b"]);
        let (coerced, log) = validate_and_coerce(&schema, &value).unwrap();
        assert_eq!(coerced, value);
        assert!(log.is_empty());
    }

    #[test]
    fn coercion_is_idempotent() {
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let value = json!({"0": "a", "1": "b"});
        let (once, _) = validate_and_coerce(&schema, &value).unwrap();
        let (twice, log) = validate_and_coerce(&schema, &once).unwrap();
        assert_eq!(once, twice);
        assert!(log.is_empty());
    }

    #[test]
    fn unsatisfiable_coercion_reports_expected_vs_received() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "number"}}, "required": ["a"]});
        let value = json!([1, 2, 3]);
        let err = validate_and_coerce(&schema, &value).unwrap_err();
        match err {
            RuntimeError::SchemaValidation { expected, received } => {
                assert_eq!(expected, "object");
                assert_eq!(received, "array");
            }
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }
}
