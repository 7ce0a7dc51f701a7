//! Workflow Runtime: variable templating, schema validation/coercion, the
//! route expression evaluator, execution selection, and the ten node-type
//! semantics that make up the Director's execution engine.

pub mod error;
pub mod interpreter;
pub mod nodes;
pub mod route_expr;
pub mod schema;
pub mod selection;
pub mod template;

pub use error::{RuntimeError, RuntimeResult};
pub use interpreter::{Interpreter, NodeExecutionRecord};
pub use selection::{parse_selection, ExecutionMode, Selection};
pub use template::VariableResolver;
