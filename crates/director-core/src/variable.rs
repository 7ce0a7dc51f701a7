//! Variable keys and iteration scoping.

/// Build the iteration-scoped key for a variable inside an `iterate` node,
/// e.g. `row@iter:3:0` for the first iteration of the iterate at position 3.
pub fn iteration_key(variable: &str, iterate_position: i64, index: usize) -> String {
    format!("{variable}@iter:{iterate_position}:{index}")
}

/// Build the glob-style prefix used to clear all iteration variables for a
/// given iterate node position (`clearIterationFor`).
pub fn iteration_prefix(iterate_position: i64) -> String {
    format!("@iter:{iterate_position}:")
}

/// Whether `key` belongs to the iteration scope of `iterate_position`.
pub fn key_matches_iteration(key: &str, iterate_position: i64) -> bool {
    key.contains(&iteration_prefix(iterate_position))
}

/// Parsed components of an iteration-scoped key, if it is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationKey {
    pub variable: String,
    pub iterate_position: i64,
    pub index: usize,
}

pub fn parse_iteration_key(key: &str) -> Option<IterationKey> {
    let (variable, rest) = key.split_once("@iter:")?;
    let (pos_str, idx_str) = rest.split_once(':')?;
    Some(IterationKey {
        variable: variable.to_string(),
        iterate_position: pos_str.parse().ok()?,
        index: idx_str.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_key_round_trips() {
        let key = iteration_key("row", 3, 2);
        assert_eq!(key, "row@iter:3:2");
        let parsed = parse_iteration_key(&key).unwrap();
        assert_eq!(parsed.variable, "row");
        assert_eq!(parsed.iterate_position, 3);
        assert_eq!(parsed.index, 2);
    }

    #[test]
    fn key_matches_iteration_is_scoped_to_position() {
        assert!(key_matches_iteration("row@iter:3:0", 3));
        assert!(!key_matches_iteration("row@iter:4:0", 3));
        assert!(!key_matches_iteration("row", 3));
    }
}
