//! Context assembly for one Director turn: workflow
//! description, plan, node list, browser state, recent variables (chunked
//! to budget, with `get_workflow_variables` as the on-demand fetch), and
//! recent conversation history, turned into a `Vec<ChatMessage>` plus the
//! token breakdown that produced it.

use director_browser::BrowserFacade;
use director_core::llm::ChatMessage;
use director_db::queries::nodes as node_queries;
use director_db::queries::{conversation, descriptions, plans, variables as variable_queries};
use director_db::DbPool;
use director_token::{analyze_context_assembly, partition_variables_for_context, ContextSection, TokenCount};
use serde_json::Value;

use crate::error::AgentResult;

const VARIABLE_BUDGET_TOKENS: usize = 4_000;
const RECENT_MESSAGE_COUNT: usize = 20;

pub struct AssembledContext {
    pub messages: Vec<ChatMessage>,
    pub sections: Vec<TokenCount>,
    pub chunked_variable_keys: Vec<String>,
    pub prior_reasoning_encrypted: Option<String>,
}

pub fn assemble(pool: &DbPool, workflow_id: &str, browser: &BrowserFacade, user_message: &str) -> AgentResult<AssembledContext> {
    let description = descriptions::get_latest(pool, workflow_id)?.map(|(_, data)| data);
    let plan = plans::get_latest(pool, workflow_id)?;
    let nodes = node_queries::list_nodes(pool, workflow_id)?;
    let state = browser.state();

    let all_variables = variable_queries::get_all(pool, workflow_id)?;
    let partition = partition_variables_for_context(&all_variables, VARIABLE_BUDGET_TOKENS);
    let included: Value = Value::Object(
        all_variables
            .iter()
            .filter(|(name, _)| partition.included.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
    );

    let history = conversation::list(pool, workflow_id)?;
    let recent: Vec<_> = history.iter().rev().take(RECENT_MESSAGE_COUNT).collect();
    let prior_reasoning_encrypted = recent.first().and_then(|m| m.reasoning_encrypted.clone());

    let description_text = description.map(|d| d.to_string()).unwrap_or_else(|| "(none)".to_string());
    let plan_text = plan.map(|p| p.to_string()).unwrap_or_else(|| "(none)".to_string());
    let nodes_text = serde_json::to_string_pretty(&nodes)?;
    let state_text = serde_json::to_string_pretty(&state)?;
    let variables_text = serde_json::to_string_pretty(&included)?;

    let sections = analyze_context_assembly(&[
        ContextSection { name: "workflow_description", content: description_text.clone() },
        ContextSection { name: "plan", content: plan_text.clone() },
        ContextSection { name: "nodes", content: nodes_text.clone() },
        ContextSection { name: "browser_state", content: state_text.clone() },
        ContextSection { name: "variables", content: variables_text.clone() },
    ])?;

    let system_content = format!(
        "Workflow description:\n{description_text}\n\n\
         Current plan:\n{plan_text}\n\n\
         Nodes:\n{nodes_text}\n\n\
         Browser state:\n{state_text}\n\n\
         Variables (chunked out of context, fetch via get_workflow_variables if needed: {:?}):\n{variables_text}",
        partition.chunked,
    );

    let mut messages = vec![ChatMessage { role: "system".to_string(), content: system_content }];
    messages.extend(recent.into_iter().rev().map(|m| ChatMessage { role: m.role.clone(), content: m.content.clone() }));
    messages.push(ChatMessage { role: "user".to_string(), content: user_message.to_string() });

    Ok(AssembledContext { messages, sections, chunked_variable_keys: partition.chunked, prior_reasoning_encrypted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_browser::MockDriver;
    use director_db::queries::{conversation, variables as variable_queries, workflows};
    use director_db::DbPool;
    use serde_json::json;

    fn test_pool() -> (DbPool, String) {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        let workflow_id = workflows::create(&pool, "test").unwrap();
        (pool, workflow_id)
    }

    #[test]
    fn assembles_a_system_message_and_appends_the_user_message_last() {
        let (pool, workflow_id) = test_pool();
        let browser = BrowserFacade::new(Box::new(MockDriver::new()));

        let assembled = assemble(&pool, &workflow_id, &browser, "what's on the page?").unwrap();

        assert_eq!(assembled.messages.first().unwrap().role, "system");
        let last = assembled.messages.last().unwrap();
        assert_eq!(last.role, "user");
        assert_eq!(last.content, "what's on the page?");
        assert_eq!(assembled.sections.len(), 5);
    }

    #[test]
    fn includes_prior_conversation_history_between_system_and_user() {
        let (pool, workflow_id) = test_pool();
        let browser = BrowserFacade::new(Box::new(MockDriver::new()));
        conversation::append(&pool, &workflow_id, "user", "first message", None, None, None).unwrap();
        conversation::append(&pool, &workflow_id, "assistant", "first reply", None, None, None).unwrap();

        let assembled = assemble(&pool, &workflow_id, &browser, "second message").unwrap();

        assert_eq!(assembled.messages.len(), 4);
        assert_eq!(assembled.messages[1].content, "first message");
        assert_eq!(assembled.messages[2].content, "first reply");
    }

    #[test]
    fn small_variables_are_inlined_not_chunked() {
        let (pool, workflow_id) = test_pool();
        let browser = BrowserFacade::new(Box::new(MockDriver::new()));
        variable_queries::set(&pool, &workflow_id, "city", &json!("Lisbon")).unwrap();

        let assembled = assemble(&pool, &workflow_id, &browser, "hi").unwrap();

        assert!(assembled.chunked_variable_keys.is_empty());
        assert!(assembled.messages[0].content.contains("Lisbon"));
    }
}
