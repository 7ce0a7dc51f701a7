//! Context-budget suggestions.
//!
//! Given the per-section token breakdown of an assembled turn, suggests
//! where to cut to stay under budget — which sections to chunk, and
//! whether older conversation history should be summarized rather than
//! replayed in full.

use anyhow::Result;
use serde::Serialize;

use crate::analyzer::TokenCount;

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub source: String,
    pub action: String,
    pub estimated_savings: usize,
    pub priority: SuggestionPriority,
}

#[derive(Debug, Clone, Serialize)]
pub enum SuggestionPriority {
    High,
    Medium,
    Low,
}

/// Generate suggestions for bringing an assembled context back under
/// `budget_tokens`, largest offenders first.
pub fn suggest_chunking(sections: &[TokenCount], budget_tokens: usize) -> Result<Vec<Suggestion>> {
    let total: usize = sections.iter().map(|s| s.tokens).sum();
    if total <= budget_tokens {
        return Ok(Vec::new());
    }

    let excess = total - budget_tokens;
    let mut sorted: Vec<&TokenCount> = sections.iter().collect();
    sorted.sort_by(|a, b| b.tokens.cmp(&a.tokens));

    let mut suggestions = Vec::new();
    for section in &sorted {
        match section.source.as_str() {
            "variables" if section.tokens > budget_tokens / 4 => suggestions.push(Suggestion {
                source: section.source.clone(),
                action: format!(
                    "chunk older variables and fetch on demand ({} tokens, ~{} recoverable)",
                    section.tokens,
                    section.tokens / 2
                ),
                estimated_savings: section.tokens / 2,
                priority: SuggestionPriority::High,
            }),
            "conversation" if section.tokens > budget_tokens / 3 => suggestions.push(Suggestion {
                source: section.source.clone(),
                action: format!("summarize turns older than the last few exchanges ({} tokens)", section.tokens),
                estimated_savings: section.tokens / 3,
                priority: SuggestionPriority::Medium,
            }),
            _ if section.tokens > budget_tokens / 2 => suggestions.push(Suggestion {
                source: section.source.clone(),
                action: format!("{} is unusually large ({} tokens) for a single section", section.source, section.tokens),
                estimated_savings: section.tokens / 4,
                priority: SuggestionPriority::Low,
            }),
            _ => {}
        }
    }

    suggestions.sort_by(|a, b| b.estimated_savings.cmp(&a.estimated_savings));
    let mut cumulative = 0;
    suggestions.retain(|s| {
        if cumulative >= excess {
            false
        } else {
            cumulative += s.estimated_savings;
            true
        }
    });

    Ok(suggestions)
}
