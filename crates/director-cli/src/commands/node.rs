//! Direct node-execution command (bypasses the Director control loop).

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use director_browser::{BrowserFacade, MockDriver};
use director_runtime::{ExecutionMode, Interpreter};

use crate::output;

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Execute a selection of nodes directly, outside a Director turn
    Execute(ExecuteArgs),
}

#[derive(Args)]
pub struct ExecuteArgs {
    /// Workflow id
    pub workflow_id: String,

    /// Node selection: "5", "3-5", "1-3,10,15-17", or "all"
    pub selection: String,

    /// Execution mode
    #[arg(long, default_value = "isolated")]
    pub mode: String,

    /// Path to the workflow database
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub async fn execute(cmd: NodeCommands, project_dir: &Path) -> Result<()> {
    match cmd {
        NodeCommands::Execute(args) => run(args, project_dir).await,
    }
}

async fn run(args: ExecuteArgs, project_dir: &Path) -> Result<()> {
    let db_path = args.db.unwrap_or_else(|| project_dir.join(".director/workflow.db"));
    let pool = director_db::init_pool(&db_path)?;
    let mode = ExecutionMode::from_str(&args.mode)?;

    let browser = BrowserFacade::new(Box::new(MockDriver::new()));
    let interpreter = Interpreter::new(&pool, args.workflow_id.clone(), &browser, None);
    let records = interpreter.run(&args.selection, mode).await?;

    output::print_execution_records(&records);

    Ok(())
}
