//! Director control loop
//!
//! Tool dispatch, context assembly, and per-turn bookkeeping for the
//! Workflow Runtime's conversational driver.

pub mod cancellation;
pub mod context;
pub mod control_loop;
pub mod dispatch;
pub mod error;
pub mod provider;
pub mod tools;

pub use cancellation::CancellationFlag;
pub use control_loop::{Director, ProcessResult};
pub use error::{AgentError, AgentResult};
pub use provider::MockProvider;
pub use tools::registry as tool_registry;
