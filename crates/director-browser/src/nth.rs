//! `nth` resolution: a non-negative integer, a negative
//! integer counted from the end, `"first"`/`"last"`, or a template string
//! already resolved by the runtime before it reaches the facade.

use director_core::{DirectorError, DirectorResult};
use serde_json::Value;

/// Resolve an `nth` value against a known candidate count, returning a
/// 0-based index into that count.
pub fn resolve_nth(nth: &Value, candidate_count: usize) -> DirectorResult<usize> {
    if candidate_count == 0 {
        return Err(DirectorError::ElementNotFound("no candidates for nth resolution".into()));
    }

    let as_index = match nth {
        Value::Null => 0,
        Value::String(s) => match s.as_str() {
            "first" => 0,
            "last" => candidate_count as i64 - 1,
            other => other
                .parse::<i64>()
                .map_err(|_| DirectorError::Validation(format!("invalid nth string: {other}")))?,
        },
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| DirectorError::Validation("nth must be an integer".into()))?,
        _ => return Err(DirectorError::Validation("nth must be a string or integer".into())),
    };

    let resolved = if as_index < 0 {
        candidate_count as i64 + as_index
    } else {
        as_index
    };

    if resolved < 0 || resolved as usize >= candidate_count {
        return Err(DirectorError::Validation(format!(
            "nth {as_index} out of range for {candidate_count} candidates"
        )));
    }

    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_non_negative_integer() {
        assert_eq!(resolve_nth(&json!(2), 5).unwrap(), 2);
    }

    #[test]
    fn resolves_negative_from_end() {
        assert_eq!(resolve_nth(&json!(-1), 5).unwrap(), 4);
    }

    #[test]
    fn resolves_first_and_last() {
        assert_eq!(resolve_nth(&json!("first"), 5).unwrap(), 0);
        assert_eq!(resolve_nth(&json!("last"), 5).unwrap(), 4);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(resolve_nth(&json!(10), 5).is_err());
    }

    #[test]
    fn null_defaults_to_first() {
        assert_eq!(resolve_nth(&Value::Null, 3).unwrap(), 0);
    }
}
