//! Terminal output formatting.

use colored::Colorize;
use director_db::queries::nodes::NodeRow;
use director_runtime::NodeExecutionRecord;
use serde_json::Value;

/// Print a workflow's node list as a table.
pub fn print_nodes(nodes: &[NodeRow]) {
    if nodes.is_empty() {
        println!("{}", "No nodes defined.".dimmed());
        return;
    }

    println!("{:<5} {:<20} {:<12} {:<10}", "POS", "ALIAS", "TYPE", "STATUS");
    println!("{}", "-".repeat(55));

    for node in nodes {
        let status_colored = match node.status.as_str() {
            "success" => node.status.green(),
            "failed" => node.status.red(),
            "running" => node.status.yellow(),
            _ => node.status.dimmed(),
        };

        println!(
            "{:<5} {:<20} {:<12} {:<10}",
            node.position,
            truncate(&node.alias, 18),
            node.r#type,
            status_colored
        );
    }
}

/// Print the description/plan/variables/browser-state snapshot for a workflow.
pub fn print_workflow_snapshot(
    description: &Option<Value>,
    plan: &Option<Value>,
    nodes: &[NodeRow],
    variables: &Value,
) {
    println!("{}", "Description".bold());
    match description {
        Some(d) => println!("{}", serde_json::to_string_pretty(d).unwrap_or_default()),
        None => println!("{}", "(none)".dimmed()),
    }
    println!();

    println!("{}", "Plan".bold());
    match plan {
        Some(p) => println!("{}", serde_json::to_string_pretty(p).unwrap_or_default()),
        None => println!("{}", "(none)".dimmed()),
    }
    println!();

    println!("{}", "Nodes".bold());
    print_nodes(nodes);
    println!();

    println!("{}", "Variables".bold());
    match variables.as_object() {
        Some(obj) if !obj.is_empty() => {
            for (key, value) in obj {
                println!("  {} = {}", key.cyan(), truncate(&value.to_string(), 60));
            }
        }
        _ => println!("{}", "(none)".dimmed()),
    }
}

/// Print the result of a direct node-execution run.
pub fn print_execution_records(records: &[NodeExecutionRecord]) {
    if records.is_empty() {
        println!("{}", "No nodes executed.".dimmed());
        return;
    }

    for record in records {
        let status_colored = match record.status {
            "success" => record.status.green(),
            "failed" => record.status.red(),
            _ => record.status.dimmed(),
        };

        println!("  {} {} ({}) {}", "●".cyan(), record.position, record.alias, status_colored);

        if let Some(failure) = &record.failure {
            println!("    {}", failure.message.dimmed());
        }
    }
}

/// Truncate a string to a maximum length.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_pass_through_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn long_strings_are_cut_with_an_ellipsis() {
        assert_eq!(truncate("abcdefghij", 5), "ab...");
    }

    #[test]
    fn exact_length_strings_pass_through_unchanged() {
        assert_eq!(truncate("abcde", 5), "abcde");
    }
}
