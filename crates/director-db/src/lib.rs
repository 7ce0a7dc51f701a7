//! Director Database Layer
//!
//! SQLite-backed persistence for the workflow state store: nodes,
//! variables, plans, descriptions, the conversation log, and the
//! execution/tool-call history.

pub mod broadcast;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use broadcast::{create_broadcast_channel, BroadcastReceiver, BroadcastSender, ToolEvent};
pub use migrations::run_migrations;
pub use pool::{init_pool, DbError, DbPool, DbResult};
