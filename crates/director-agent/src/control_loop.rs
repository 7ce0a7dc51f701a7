//! The Director control loop: one blocking LLM call per
//! turn step, tool calls dispatched strictly serially, cooperative
//! cancellation checked at each tool-call boundary, reasoning carried
//! forward across recursive calls within a turn and into the next.

use std::time::{Duration, Instant};

use chrono::Utc;
use director_browser::BrowserFacade;
use director_core::conversation::TokenUsage;
use director_core::llm::{ChatMessage, ChatRequest, ChatResponse, LlmProvider};
use director_db::broadcast::{BroadcastSender, ToolEvent};
use director_db::queries::{conversation, execution};
use director_db::DbPool;
use director_token::TurnUsageReport;
use serde_json::json;

use crate::cancellation::CancellationFlag;
use crate::context;
use crate::dispatch;
use crate::error::{AgentError, AgentResult};
use crate::tools;

const DEFAULT_MAX_DEPTH: usize = 8;
const DEFAULT_MAX_WALL_CLOCK: Duration = Duration::from_secs(120);

pub struct ProcessResult {
    pub reply: String,
    pub usage: TokenUsage,
    pub report: TurnUsageReport,
    pub tool_calls: usize,
}

/// One workflow's Director. Callers own the per-workflow serialization
/// (one in-flight turn at a time) — this struct just runs
/// a single turn to completion or to its depth/wall-clock/cancellation
/// limit.
pub struct Director<'a> {
    pool: &'a DbPool,
    workflow_id: String,
    browser: &'a BrowserFacade,
    llm: &'a (dyn LlmProvider + Send + Sync),
    events: BroadcastSender,
    max_depth: usize,
    max_wall_clock: Duration,
}

impl<'a> Director<'a> {
    pub fn new(
        pool: &'a DbPool,
        workflow_id: impl Into<String>,
        browser: &'a BrowserFacade,
        llm: &'a (dyn LlmProvider + Send + Sync),
        events: BroadcastSender,
    ) -> Self {
        Self {
            pool,
            workflow_id: workflow_id.into(),
            browser,
            llm,
            events,
            max_depth: DEFAULT_MAX_DEPTH,
            max_wall_clock: DEFAULT_MAX_WALL_CLOCK,
        }
    }

    pub fn with_limits(mut self, max_depth: usize, max_wall_clock: Duration) -> Self {
        self.max_depth = max_depth;
        self.max_wall_clock = max_wall_clock;
        self
    }

    pub async fn process(&self, message: &str, cancel: &CancellationFlag) -> AgentResult<ProcessResult> {
        let turn_seq = conversation::append(self.pool, &self.workflow_id, "user", message, None, None, None)?;
        let assembled = context::assemble(self.pool, &self.workflow_id, self.browser, message)?;

        let mut reasoning_encrypted = assembled.prior_reasoning_encrypted.clone();
        let mut chat_messages = assembled.messages.clone();
        let registry = tools::registry();

        let mut usage = TokenUsage::default();
        let mut tool_call_count = 0usize;
        let started = Instant::now();
        let final_text;

        let mut depth = 0usize;
        loop {
            if depth >= self.max_depth {
                return Err(AgentError::MaxDepthExceeded(self.max_depth));
            }
            if started.elapsed() >= self.max_wall_clock {
                return Err(AgentError::Provider("turn exceeded its wall-clock budget".to_string()));
            }
            depth += 1;

            let request = ChatRequest {
                messages: chat_messages.clone(),
                tools: registry.clone(),
                response_schema: None,
                reasoning_encrypted: reasoning_encrypted.clone(),
            };

            let response: ChatResponse = self.llm.complete(request).await.map_err(AgentError::Director)?;

            usage.input += response.usage.input;
            usage.output += response.usage.output;
            usage.reasoning += response.usage.reasoning;
            usage.total += response.usage.total;
            usage.cost += response.usage.cost;
            reasoning_encrypted = response.reasoning_encrypted.clone();

            if response.tool_calls.is_empty() {
                final_text = response.text.clone();
                chat_messages.push(ChatMessage { role: "assistant".to_string(), content: final_text.clone() });
                break;
            }

            chat_messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: if response.text.is_empty() { "(tool calls)".to_string() } else { response.text.clone() },
            });

            for call in &response.tool_calls {
                if cancel.is_cancelled() {
                    return Err(AgentError::Provider("turn cancelled".to_string()));
                }

                let started_at = Utc::now().to_rfc3339();
                self.publish(ToolEvent::Start {
                    workflow_id: self.workflow_id.clone(),
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                    at: started_at,
                });

                let outcome = dispatch::execute_tool(self.pool, &self.workflow_id, self.browser, &call.name, &call.arguments).await;
                tool_call_count += 1;
                let finished_at = Utc::now().to_rfc3339();

                let result_value = match &outcome {
                    Ok(value) => {
                        self.publish(ToolEvent::Result {
                            workflow_id: self.workflow_id.clone(),
                            name: call.name.clone(),
                            result: value.clone(),
                            at: finished_at,
                        });
                        execution::log_tool_call(self.pool, &self.workflow_id, turn_seq, &call.name, &call.arguments, Some(value), None)?;
                        value.clone()
                    }
                    Err(err) => {
                        let message = err.to_string();
                        self.publish(ToolEvent::Error {
                            workflow_id: self.workflow_id.clone(),
                            name: call.name.clone(),
                            error: message.clone(),
                            at: finished_at,
                        });
                        execution::log_tool_call(self.pool, &self.workflow_id, turn_seq, &call.name, &call.arguments, None, Some(&message))?;
                        json!({ "error": message })
                    }
                };

                chat_messages.push(ChatMessage {
                    role: "tool".to_string(),
                    content: json!({ "tool_call_id": call.id, "name": call.name, "result": result_value }).to_string(),
                });
            }
        }

        let tokens_value = serde_json::to_value(usage)?;
        conversation::append(self.pool, &self.workflow_id, "assistant", &final_text, None, reasoning_encrypted.as_deref(), Some(&tokens_value))?;

        let report = TurnUsageReport::new(usage.input, usage.output, usage.reasoning, usage.cost, assembled.sections);
        Ok(ProcessResult { reply: final_text, usage, report, tool_calls: tool_call_count })
    }

    fn publish(&self, event: ToolEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use director_browser::{BrowserFacade, MockDriver};
    use director_core::llm::ToolCallRequest;
    use director_db::queries::workflows;
    use serde_json::json;

    fn test_pool() -> (DbPool, String) {
        let pool = DbPool::in_memory().unwrap();
        director_db::run_migrations(&pool).unwrap();
        let workflow_id = workflows::create(&pool, "test").unwrap();
        (pool, workflow_id)
    }

    fn response(text: &str, tool_calls: Vec<ToolCallRequest>) -> ChatResponse {
        ChatResponse { text: text.to_string(), tool_calls, reasoning_encrypted: None, reasoning_summary: None, usage: TokenUsage::default() }
    }

    #[tokio::test]
    async fn a_turn_with_no_tool_calls_returns_the_reply_directly() {
        let (pool, workflow_id) = test_pool();
        let browser = BrowserFacade::new(Box::new(MockDriver::new()));
        let llm = MockProvider::new();
        llm.seed(response("hello there", Vec::new()));
        let events = director_db::create_broadcast_channel();
        let cancel = CancellationFlag::new();

        let director = Director::new(&pool, workflow_id.clone(), &browser, &llm, events);
        let result = director.process("hi", &cancel).await.unwrap();

        assert_eq!(result.reply, "hello there");
        assert_eq!(result.tool_calls, 0);

        let history = conversation::list(&pool, &workflow_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");
    }

    #[tokio::test]
    async fn a_tool_call_is_dispatched_and_its_result_fed_back_to_the_next_turn() {
        let (pool, workflow_id) = test_pool();
        let browser = BrowserFacade::new(Box::new(MockDriver::new()));
        let llm = MockProvider::new();
        llm.seed(response(
            "",
            vec![ToolCallRequest { id: "call_1".to_string(), name: "set_variable".to_string(), arguments: json!({"key": "city", "value": "Lisbon"}) }],
        ));
        llm.seed(response("done", Vec::new()));
        let events = director_db::create_broadcast_channel();
        let cancel = CancellationFlag::new();

        let director = Director::new(&pool, workflow_id.clone(), &browser, &llm, events);
        let result = director.process("set the city", &cancel).await.unwrap();

        assert_eq!(result.reply, "done");
        assert_eq!(result.tool_calls, 1);

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        let second_request_content = &requests[1].messages.last().unwrap().content;
        assert!(second_request_content.contains("set"));
    }

    #[tokio::test]
    async fn exceeding_max_depth_returns_an_error_without_panicking() {
        let (pool, workflow_id) = test_pool();
        let browser = BrowserFacade::new(Box::new(MockDriver::new()));
        let llm = MockProvider::new();
        for _ in 0..3 {
            llm.seed(response(
                "",
                vec![ToolCallRequest { id: "call".to_string(), name: "get_current_plan".to_string(), arguments: json!({}) }],
            ));
        }
        let events = director_db::create_broadcast_channel();
        let cancel = CancellationFlag::new();

        let director = Director::new(&pool, workflow_id, &browser, &llm, events).with_limits(2, Duration::from_secs(60));
        let err = director.process("loop forever", &cancel).await.unwrap_err();

        assert!(matches!(err, AgentError::MaxDepthExceeded(2)));
    }

    #[tokio::test]
    async fn cancelling_before_a_tool_call_stops_the_turn() {
        let (pool, workflow_id) = test_pool();
        let browser = BrowserFacade::new(Box::new(MockDriver::new()));
        let llm = MockProvider::new();
        llm.seed(response(
            "",
            vec![ToolCallRequest { id: "call".to_string(), name: "get_current_plan".to_string(), arguments: json!({}) }],
        ));
        let events = director_db::create_broadcast_channel();
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let director = Director::new(&pool, workflow_id, &browser, &llm, events);
        let err = director.process("do something", &cancel).await.unwrap_err();

        assert!(matches!(err, AgentError::Provider(_)));
    }
}
