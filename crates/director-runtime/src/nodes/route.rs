//! `route`: an ordered list of `{name, condition, branch}`, first truthy
//! condition wins (no multi-match support).

use crate::error::{RuntimeError, RuntimeResult};
use crate::route_expr;
use crate::template::VariableResolver;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct RouteBranch {
    pub name: String,
    pub condition: String,
    pub branch: Vec<i64>,
}

fn positions_of(value: &Value) -> Vec<i64> {
    match value {
        Value::Number(n) => n.as_i64().into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    }
}

pub fn parse_config(config: &Value) -> RuntimeResult<Vec<RouteBranch>> {
    let entries = config
        .as_array()
        .ok_or_else(|| RuntimeError::Validation("route config must be an array of branches".into()))?;

    entries
        .iter()
        .map(|entry| {
            let name = entry.get("name").and_then(Value::as_str).unwrap_or("").to_string();
            let condition = entry
                .get("condition")
                .and_then(Value::as_str)
                .ok_or_else(|| RuntimeError::Validation("route branch requires 'condition'".into()))?
                .to_string();
            let branch = positions_of(entry.get("branch").unwrap_or(&Value::Null));
            Ok(RouteBranch { name, condition, branch })
        })
        .collect()
}

/// Resolves variable references in each condition and evaluates in order,
/// returning the first truthy branch.
pub fn select<'a>(branches: &'a [RouteBranch], resolver: &VariableResolver) -> Option<&'a RouteBranch> {
    branches.iter().find(|b| route_expr::evaluate(&resolver.resolve_template(&b.condition)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn first_truthy_branch_wins() {
        let config = json!([
            { "name": "a", "condition": "false", "branch": [2] },
            { "name": "b", "condition": "true", "branch": [3] },
            { "name": "default", "condition": "true", "branch": [4] },
        ]);
        let branches = parse_config(&config).unwrap();
        let resolver = VariableResolver::new(HashMap::new());
        let chosen = select(&branches, &resolver).unwrap();
        assert_eq!(chosen.name, "b");
    }

    #[test]
    fn no_match_returns_none() {
        let config = json!([{ "name": "a", "condition": "false", "branch": [2] }]);
        let branches = parse_config(&config).unwrap();
        let resolver = VariableResolver::new(HashMap::new());
        assert!(select(&branches, &resolver).is_none());
    }
}
