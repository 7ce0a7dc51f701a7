//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "3030")]
    pub port: u16,

    /// Path to the workflow database
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, project_dir: &Path) -> Result<()> {
    let db_path = args.db.unwrap_or_else(|| project_dir.join(".director/workflow.db"));
    let pool = Arc::new(director_db::init_pool(&db_path)?);

    println!("{} Starting Director server on 127.0.0.1:{}", "→".blue().bold(), args.port);
    println!();
    println!("  API: http://127.0.0.1:{}", args.port);
    println!();
    println!("{}", "Press Ctrl+C to stop".dimmed());

    director_web::run_server(pool, args.port).await?;

    Ok(())
}
