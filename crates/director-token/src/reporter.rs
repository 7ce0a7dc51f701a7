//! Per-turn token usage reporting.
//!
//! Mirrors `director_core::conversation::TokenUsage` so a turn's live
//! provider-reported usage and its pre-flight context-assembly estimate can
//! be displayed side by side.

use serde::Serialize;

use crate::analyzer::TokenCount;
use crate::optimizer::Suggestion;

/// `{input, output, reasoning, total, cost}` for one Director turn, plus the
/// context-assembly breakdown that produced the input side of it.
#[derive(Debug, Clone, Serialize)]
pub struct TurnUsageReport {
    pub input: u64,
    pub output: u64,
    pub reasoning: u64,
    pub total: u64,
    pub cost: f64,
    pub context_sections: Vec<TokenCount>,
    pub suggestions: Vec<Suggestion>,
}

impl TurnUsageReport {
    pub fn new(input: u64, output: u64, reasoning: u64, cost: f64, context_sections: Vec<TokenCount>) -> Self {
        Self {
            input,
            output,
            reasoning,
            total: input + output + reasoning,
            cost,
            context_sections,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Format the report as a human-readable breakdown for logs or a CLI.
    pub fn to_display_string(&self) -> String {
        let mut output = String::new();

        output.push_str("Turn token usage\n");
        output.push_str(&format!("{}\n", "─".repeat(50)));
        output.push_str(&format!("Input:     {:>8}\n", self.input));
        output.push_str(&format!("Output:    {:>8}\n", self.output));
        output.push_str(&format!("Reasoning: {:>8}\n", self.reasoning));
        output.push_str(&format!("Total:     {:>8}\n", self.total));
        output.push_str(&format!("Cost:      ${:>8.4}\n", self.cost));
        output.push_str(&format!("{}\n\n", "─".repeat(50)));

        if !self.context_sections.is_empty() {
            output.push_str("Context assembly:\n");
            let mut sorted = self.context_sections.clone();
            sorted.sort_by(|a, b| b.tokens.cmp(&a.tokens));
            let section_total: usize = sorted.iter().map(|s| s.tokens).sum();

            for section in &sorted {
                let pct = if section_total > 0 { section.tokens * 100 / section_total } else { 0 };
                let bar = "█".repeat((pct / 2).max(1));
                output.push_str(&format!("  {:>6} ({:>2}%) {} {}\n", section.tokens, pct, bar, section.source));
            }
        }

        if !self.suggestions.is_empty() {
            output.push_str("\nChunking suggestions:\n");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!(
                    "  {}. [~{} tokens] {}: {}\n",
                    i + 1,
                    suggestion.estimated_savings,
                    suggestion.source,
                    suggestion.action
                ));
            }
        }

        output
    }
}
