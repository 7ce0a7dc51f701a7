//! Workflow inspection and turn-processing commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use director_agent::{CancellationFlag, Director, MockProvider};
use director_browser::{BrowserFacade, MockDriver};
use director_db::queries::{descriptions, plans, variables as variable_queries};
use director_db::queries::nodes;
use serde_json::Value;

use crate::output;

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Print the current description, plan, nodes, and variables
    Show(ShowArgs),

    /// Send the Director a message and run one turn
    Process(ProcessArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Workflow id
    pub workflow_id: String,

    /// Path to the workflow database
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Workflow id
    pub workflow_id: String,

    /// Message to send
    pub message: String,

    /// Path to the workflow database
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub async fn execute(cmd: WorkflowCommands, project_dir: &Path) -> Result<()> {
    match cmd {
        WorkflowCommands::Show(args) => show(args, project_dir).await,
        WorkflowCommands::Process(args) => process(args, project_dir).await,
    }
}

async fn show(args: ShowArgs, project_dir: &Path) -> Result<()> {
    let db_path = args.db.unwrap_or_else(|| project_dir.join(".director/workflow.db"));
    let pool = director_db::init_pool(&db_path)?;

    let description = descriptions::get_latest(&pool, &args.workflow_id)?.map(|(_, data)| data);
    let plan = plans::get_latest(&pool, &args.workflow_id)?;
    let node_rows = nodes::list_nodes(&pool, &args.workflow_id)?;
    let variables: Value = Value::Object(variable_queries::get_all(&pool, &args.workflow_id)?.into_iter().collect());

    output::print_workflow_snapshot(&description, &plan, &node_rows, &variables);

    Ok(())
}

async fn process(args: ProcessArgs, project_dir: &Path) -> Result<()> {
    let db_path = args.db.unwrap_or_else(|| project_dir.join(".director/workflow.db"));
    let pool = director_db::init_pool(&db_path)?;

    let browser = BrowserFacade::new(Box::new(MockDriver::new()));
    let llm = MockProvider::new();
    let events = director_db::create_broadcast_channel();
    let cancel = CancellationFlag::new();

    println!(
        "{} No live model is wired up yet — this runs against a scripted stand-in provider.",
        "note:".yellow().bold()
    );

    let director = Director::new(&pool, args.workflow_id.clone(), &browser, &llm, events);
    let result = director.process(&args.message, &cancel).await?;

    println!("{}", result.reply);
    println!();
    println!(
        "{} tool calls, {} input / {} output / {} reasoning tokens",
        result.tool_calls, result.usage.input, result.usage.output, result.usage.reasoning
    );

    Ok(())
}
