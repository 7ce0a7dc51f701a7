//! Workflow database initialization.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Path to the workflow database (defaults to ./.director/workflow.db)
    #[arg(short, long)]
    pub db: Option<PathBuf>,
}

pub async fn execute(args: InitArgs, project_dir: &std::path::Path) -> Result<()> {
    let db_path = args.db.unwrap_or_else(|| project_dir.join(".director/workflow.db"));

    println!("{} Initializing workflow database at {}", "→".blue().bold(), db_path.display());

    director_db::init_pool(&db_path)?;

    println!("{} Database ready: {}", "✓".green().bold(), db_path.display());
    println!();
    println!("{}", "Next steps:".bold());
    println!("  director serve                       # start the HTTP API");
    println!("  director workflow process <id> \"...\"  # send the Director a message");

    Ok(())
}
