//! Execution selection parsing: `"5"`, `"3-5"`,
//! `"1-3,10,15-17"`, or `"all"`.

use crate::error::{RuntimeError, RuntimeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Isolated,
    Flow,
}

impl ExecutionMode {
    pub fn from_str(s: &str) -> RuntimeResult<Self> {
        match s {
            "isolated" => Ok(Self::Isolated),
            "flow" => Ok(Self::Flow),
            other => Err(RuntimeError::InvalidSelection(format!("unknown execution mode '{other}'"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Isolated => "isolated",
            Self::Flow => "flow",
        }
    }
}

/// A selection is either "all nodes" or an explicit, ordered, deduplicated
/// set of positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Positions(Vec<i64>),
}

pub fn parse_selection(input: &str, total_nodes: i64) -> RuntimeResult<Selection> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(Selection::All);
    }

    let mut positions = Vec::new();
    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(RuntimeError::InvalidSelection(format!("empty segment in selection '{input}'")));
        }
        if let Some((lo, hi)) = part.split_once('-') {
            let lo: i64 = lo.trim().parse().map_err(|_| invalid(input))?;
            let hi: i64 = hi.trim().parse().map_err(|_| invalid(input))?;
            if lo > hi {
                return Err(RuntimeError::InvalidSelection(format!("range '{part}' is backwards in '{input}'")));
            }
            positions.extend(lo..=hi);
        } else {
            positions.push(part.parse::<i64>().map_err(|_| invalid(input))?);
        }
    }

    for &p in &positions {
        if p < 1 || p > total_nodes {
            return Err(RuntimeError::InvalidSelection(format!(
                "position {p} out of range (workflow has {total_nodes} nodes)"
            )));
        }
    }

    positions.sort_unstable();
    positions.dedup();
    Ok(Selection::Positions(positions))
}

fn invalid(input: &str) -> RuntimeError {
    RuntimeError::InvalidSelection(format!("could not parse selection '{input}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_position() {
        assert_eq!(parse_selection("5", 10).unwrap(), Selection::Positions(vec![5]));
    }

    #[test]
    fn parses_range() {
        assert_eq!(parse_selection("3-5", 10).unwrap(), Selection::Positions(vec![3, 4, 5]));
    }

    #[test]
    fn parses_mixed_list() {
        assert_eq!(
            parse_selection("1-3,10,15-17", 20).unwrap(),
            Selection::Positions(vec![1, 2, 3, 10, 15, 16, 17])
        );
    }

    #[test]
    fn parses_all() {
        assert_eq!(parse_selection("all", 5).unwrap(), Selection::All);
        assert_eq!(parse_selection("ALL", 5).unwrap(), Selection::All);
    }

    #[test]
    fn deduplicates_and_sorts() {
        assert_eq!(parse_selection("5,1,1,3", 10).unwrap(), Selection::Positions(vec![1, 3, 5]));
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(parse_selection("99", 5).is_err());
    }

    #[test]
    fn rejects_backwards_range() {
        assert!(parse_selection("5-3", 10).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_selection("abc", 10).is_err());
    }
}
