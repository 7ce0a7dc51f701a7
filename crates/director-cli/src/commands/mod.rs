//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod init;
pub mod node;
pub mod serve;
pub mod tokens;
pub mod workflow;

/// Director - LLM-driven browser-automation orchestrator
#[derive(Parser)]
#[command(name = "director")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the workflow database
    Init(init::InitArgs),

    /// Start the HTTP API server
    Serve(serve::ServeArgs),

    /// Inspect and drive a workflow
    #[command(subcommand)]
    Workflow(workflow::WorkflowCommands),

    /// Execute nodes directly, outside a Director turn
    #[command(subcommand)]
    Node(node::NodeCommands),

    /// Token analysis commands
    #[command(subcommand)]
    Tokens(tokens::TokenCommands),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let project_dir = self.project.unwrap_or_else(|| std::env::current_dir().unwrap());

        match self.command {
            Commands::Init(args) => init::execute(args, &project_dir).await,
            Commands::Serve(args) => serve::execute(args, &project_dir).await,
            Commands::Workflow(cmd) => workflow::execute(cmd, &project_dir).await,
            Commands::Node(cmd) => node::execute(cmd, &project_dir).await,
            Commands::Tokens(cmd) => tokens::execute(cmd, &project_dir).await,
        }
    }
}
