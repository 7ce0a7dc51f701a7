//! `context`: writes `config.variables` flat into the variable store.
//! References inside values are resolved first.

use crate::error::{RuntimeError, RuntimeResult};
use crate::template::VariableResolver;
use serde_json::Value;

/// Resolves every value in `config.variables` and returns the
/// `(key, resolved_value)` pairs to persist. Resolution happens against
/// the resolver *before* the new values are visible to each other, so a
/// `context` node cannot reference a sibling key it is itself defining.
pub fn execute(config: &Value, resolver: &VariableResolver) -> RuntimeResult<Vec<(String, Value)>> {
    let variables = config
        .get("variables")
        .and_then(Value::as_object)
        .ok_or_else(|| RuntimeError::Validation("context requires 'variables'".into()))?;

    Ok(variables
        .iter()
        .map(|(key, value)| (key.clone(), resolver.resolve_value(value)))
        .collect())
}
