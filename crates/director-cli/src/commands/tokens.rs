//! Token analysis commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Count and analyze tokens in a single file
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// File to analyze
    pub path: PathBuf,

    /// Token budget to check the file against
    #[arg(long, default_value = "8000")]
    pub budget: usize,
}

pub async fn execute(cmd: TokenCommands, _project_dir: &Path) -> Result<()> {
    match cmd {
        TokenCommands::Analyze(args) => analyze(args),
    }
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.path)?;
    let count = director_token::analyze_text(&args.path.display().to_string(), &content)?;

    println!("{}", "Token Analysis".bold());
    println!("{}", "-".repeat(40));
    println!("  File:       {}", count.source);
    println!("  Tokens:     {}", count.tokens.to_string().cyan());
    println!("  Characters: {}", count.characters);
    println!("  Lines:      {}", count.lines);

    let suggestions = director_token::suggest_chunking(&[count], args.budget)?;

    if !suggestions.is_empty() {
        println!();
        println!("{}", "Suggestions:".bold());
        for s in &suggestions {
            let priority = match s.priority {
                director_token::SuggestionPriority::High => "[HIGH]".red(),
                director_token::SuggestionPriority::Medium => "[MED]".yellow(),
                director_token::SuggestionPriority::Low => "[LOW]".dimmed(),
            };
            println!("  {} ~{} tokens: {}", priority, s.estimated_savings, s.action);
        }
    }

    Ok(())
}
