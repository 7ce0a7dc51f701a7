//! # Director Token
//!
//! Token counting and context-budget accounting for the Director control
//! loop. Before each turn the agent assembles context out of
//! the workflow description, plan, node list, browser state, recent
//! variables, and conversation history; this crate counts what that
//! assembly costs, decides which variables need chunking to stay under
//! budget, and renders the per-turn usage breakdown alongside the live
//! `{input, output, reasoning, total, cost}` figures reported by the LLM
//! provider.

pub mod analyzer;
pub mod optimizer;
pub mod reporter;

pub use analyzer::{
    analyze_context_assembly, analyze_text, count_tokens, partition_variables_for_context, ContextSection, TokenCount,
    VariablePartition,
};
pub use optimizer::{suggest_chunking, Suggestion, SuggestionPriority};
pub use reporter::TurnUsageReport;
