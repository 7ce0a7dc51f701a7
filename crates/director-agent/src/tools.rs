//! The Director's tool surface: mutation tools that change
//! workflow state, and perception tools that read it. Each entry is a
//! `{name, description, input_schema}` advertised to the LLM provider;
//! `dispatch::execute_tool` matches on `name` the way
//! `cwa_mcp::server::handle_tool_call` matched on its own tool set.

use director_core::llm::ToolSchema;
use serde_json::json;

fn tool(name: &str, description: &str, input_schema: serde_json::Value) -> ToolSchema {
    ToolSchema { name: name.to_string(), description: description.to_string(), input_schema }
}

/// Mutation tools: `add_or_replace_nodes`, `delete_nodes`, `update_plan`,
/// `update_workflow_description`, `set_variable`, `clear_variable`,
/// `clear_all_variables`, `execute_nodes`.
fn mutation_tools() -> Vec<ToolSchema> {
    vec![
        tool(
            "add_or_replace_nodes",
            "Insert or replace one or more workflow nodes. Each node is placed at an explicit position, \
             appended to the end, or replaces an existing node by alias or id.",
            json!({
                "type": "object",
                "properties": {
                    "nodes": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "position": {"type": "integer", "description": "1-based position; omit to append"},
                                "replace_alias": {"type": "string"},
                                "replace_id": {"type": "string"},
                                "type": {"type": "string", "enum": [
                                    "browser_action", "browser_ai_extract", "browser_ai_action", "browser_query",
                                    "cognition", "context", "iterate", "route", "transform", "handle"
                                ]},
                                "alias": {"type": "string"},
                                "config": {"type": "object"},
                                "description": {"type": "string"},
                                "store_variable": {"type": "boolean"}
                            },
                            "required": ["type", "alias", "config"]
                        }
                    }
                },
                "required": ["nodes"]
            }),
        ),
        tool(
            "delete_nodes",
            "Delete workflow nodes by id. When delete_children is true, nodes whose config references a \
             deleted node's alias are removed too.",
            json!({
                "type": "object",
                "properties": {
                    "ids": {"type": "array", "items": {"type": "string"}},
                    "delete_children": {"type": "boolean", "default": false}
                },
                "required": ["ids"]
            }),
        ),
        tool(
            "update_plan",
            "Replace the workflow's current plan with a new version, recording why it changed.",
            json!({
                "type": "object",
                "properties": {"plan": {"type": "object"}, "reason": {"type": "string"}},
                "required": ["plan"]
            }),
        ),
        tool(
            "update_workflow_description",
            "Append a new version of the workflow description.",
            json!({
                "type": "object",
                "properties": {"description": {"type": "object"}, "reason": {"type": "string"}},
                "required": ["description"]
            }),
        ),
        tool(
            "set_variable",
            "Set (insert or overwrite) one workflow variable.",
            json!({
                "type": "object",
                "properties": {"key": {"type": "string"}, "value": {}},
                "required": ["key", "value"]
            }),
        ),
        tool(
            "clear_variable",
            "Delete one workflow variable by key.",
            json!({"type": "object", "properties": {"key": {"type": "string"}}, "required": ["key"]}),
        ),
        tool("clear_all_variables", "Delete every variable in the workflow.", json!({"type": "object", "properties": {}})),
        tool(
            "execute_nodes",
            "Run a selection of nodes in isolated or flow mode and return per-node results.",
            json!({
                "type": "object",
                "properties": {
                    "selection": {"type": "string", "description": "e.g. \"5\", \"3-5\", \"1-3,10,15-17\", or \"all\""},
                    "mode": {"type": "string", "enum": ["isolated", "flow"], "default": "isolated"}
                },
                "required": ["selection"]
            }),
        ),
    ]
}

/// Perception tools: `get_workflow_variables`, `get_current_plan`,
/// `get_workflow_nodes`, `get_workflow_description`, `get_browser_state`,
/// `browser_action`, `get_screenshot`, plus the DOM toolkit functions.
fn perception_tools() -> Vec<ToolSchema> {
    vec![
        tool(
            "get_workflow_variables",
            "Fetch workflow variables. With no keys, returns the recent/small variables already in context \
             plus the list of keys that were chunked out; pass keys to fetch specific values in full.",
            json!({"type": "object", "properties": {"keys": {"type": "array", "items": {"type": "string"}}}}),
        ),
        tool("get_current_plan", "Fetch the workflow's current plan.", json!({"type": "object", "properties": {}})),
        tool(
            "get_workflow_nodes",
            "Fetch the workflow's node list, optionally restricted to a position range.",
            json!({
                "type": "object",
                "properties": {
                    "from_position": {"type": "integer"},
                    "to_position": {"type": "integer"}
                }
            }),
        ),
        tool(
            "get_workflow_description",
            "Fetch the latest version of the workflow description.",
            json!({"type": "object", "properties": {}}),
        ),
        tool("get_browser_state", "Fetch the current tabs, active tab, and last snapshot id.", json!({"type": "object", "properties": {}})),
        tool(
            "browser_action",
            "Perform a single deterministic browser action immediately (navigate, click, type, keypress, \
             scroll, wait) without creating a workflow node.",
            json!({
                "type": "object",
                "properties": {
                    "action": {"type": "string", "enum": [
                        "navigate", "back", "forward", "refresh", "click", "type", "keypress",
                        "scrollIntoView", "scrollToRow", "wait"
                    ]},
                    "tab": {"type": "string"},
                    "url": {"type": "string"},
                    "selector": {"type": "string"},
                    "text": {"type": "string"},
                    "key": {"type": "string"},
                    "modifiers": {"type": "array", "items": {"type": "string"}},
                    "nth": {},
                    "ms": {"type": "integer"},
                    "index": {"type": "integer"},
                    "rowHeight": {"type": "number"}
                },
                "required": ["action"]
            }),
        ),
        tool(
            "get_screenshot",
            "Capture a screenshot of the current page.",
            json!({"type": "object", "properties": {"tab": {"type": "string"}, "full_page": {"type": "boolean"}}}),
        ),
        tool(
            "dom_overview",
            "Token-efficient summary of the page's interactive surface.",
            json!({"type": "object", "properties": {"tab": {"type": "string"}, "filters": {"type": "object"}}}),
        ),
        tool(
            "dom_structure",
            "Shallow structural tree of the page up to a given depth.",
            json!({"type": "object", "properties": {"tab": {"type": "string"}, "depth": {"type": "integer", "default": 2}}}),
        ),
        tool(
            "dom_search",
            "Search the current DOM snapshot by tag, attribute, text, or role.",
            json!({
                "type": "object",
                "properties": {
                    "tab": {"type": "string"},
                    "tag": {"type": "string"},
                    "text": {"type": "string"},
                    "role": {"type": "string"}
                }
            }),
        ),
        tool(
            "dom_inspect",
            "Inspect one element by selector in detail.",
            json!({
                "type": "object",
                "properties": {"tab": {"type": "string"}, "selector": {"type": "string"}, "include": {"type": "object"}},
                "required": ["selector"]
            }),
        ),
        tool(
            "dom_click_inspect",
            "Identify the element at a page coordinate, for disambiguating click targets.",
            json!({
                "type": "object",
                "properties": {"tab": {"type": "string"}, "x": {"type": "number"}, "y": {"type": "number"}},
                "required": ["x", "y"]
            }),
        ),
    ]
}

pub fn registry() -> Vec<ToolSchema> {
    let mut tools = mutation_tools();
    tools.extend(perception_tools());
    tools
}

pub fn is_mutation(name: &str) -> bool {
    mutation_tools().iter().any(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_are_unique() {
        let names: Vec<&str> = registry().iter().map(|t| t.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names.len(), sorted.len());
    }

    #[test]
    fn is_mutation_matches_the_mutation_tool_set() {
        assert!(is_mutation("add_or_replace_nodes"));
        assert!(is_mutation("execute_nodes"));
        assert!(!is_mutation("get_workflow_variables"));
        assert!(!is_mutation("nonexistent_tool"));
    }

    #[test]
    fn every_tool_has_an_object_input_schema() {
        for schema in registry() {
            assert_eq!(
                schema.input_schema.get("type").and_then(serde_json::Value::as_str),
                Some("object"),
                "{} has no object schema",
                schema.name
            );
        }
    }
}
