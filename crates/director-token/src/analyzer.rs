//! Token counting for assembled turn context.
//!
//! Uses tiktoken-rs with cl100k_base encoding as a stand-in for the
//! provider's own tokenizer — close enough to budget against, not an exact
//! match for every model.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Token count for one named piece of assembled context.
#[derive(Debug, Clone, Serialize)]
pub struct TokenCount {
    pub source: String,
    pub tokens: usize,
    pub characters: usize,
    pub lines: usize,
}

/// Count tokens using cl100k_base encoding.
pub fn count_tokens(text: &str) -> Result<usize> {
    let bpe = tiktoken_rs::cl100k_base().context("failed to load cl100k_base tokenizer")?;
    Ok(bpe.encode_with_special_tokens(text).len())
}

/// Analyze a single named section (e.g. "plan", "browser_state") of the
/// context the Director assembles before a turn.
pub fn analyze_text(source: &str, content: &str) -> Result<TokenCount> {
    Ok(TokenCount {
        source: source.to_string(),
        tokens: count_tokens(content)?,
        characters: content.len(),
        lines: content.lines().count(),
    })
}

/// One named section of assembled turn context, already serialized.
pub struct ContextSection<'a> {
    pub name: &'a str,
    pub content: String,
}

/// Analyze every section of a turn's assembled context in one pass.
pub fn analyze_context_assembly(sections: &[ContextSection<'_>]) -> Result<Vec<TokenCount>> {
    sections.iter().map(|s| analyze_text(s.name, &s.content)).collect()
}

/// Result of deciding which recent variables fit in a turn's context
/// verbatim versus which must be left out (and fetched on demand via
/// `get_workflow_variables` if the agent actually needs them).
#[derive(Debug, Clone, Serialize)]
pub struct VariablePartition {
    pub included: Vec<String>,
    pub chunked: Vec<String>,
    pub included_tokens: usize,
}

/// Greedily fit the smallest variables into `budget_tokens`, newest first,
/// and push the rest into `chunked` rather than truncating any single
/// variable's value.
pub fn partition_variables_for_context(variables: &[(String, Value)], budget_tokens: usize) -> VariablePartition {
    let mut sized: Vec<(&String, usize)> = variables
        .iter()
        .map(|(name, value)| {
            let text = value.to_string();
            let tokens = count_tokens(&text).unwrap_or_else(|_| text.len() / 4);
            (name, tokens)
        })
        .collect();

    let mut included = Vec::new();
    let mut chunked = Vec::new();
    let mut included_tokens = 0usize;

    // Preserve original (most-recent-last) order in the candidate list but
    // decide admission smallest-first so a handful of small variables don't
    // get crowded out by one large one.
    let mut by_size = sized.clone();
    by_size.sort_by_key(|(_, tokens)| *tokens);
    let mut admitted: std::collections::HashSet<&String> = std::collections::HashSet::new();
    for (name, tokens) in &by_size {
        if included_tokens + tokens <= budget_tokens {
            admitted.insert(name);
            included_tokens += tokens;
        }
    }

    for (name, _) in &sized {
        if admitted.contains(name) {
            included.push((*name).clone());
        } else {
            chunked.push((*name).clone());
        }
    }

    VariablePartition { included, chunked, included_tokens }
}
