//! Control-loop errors, composing the lower layers' error types the way
//! `director_runtime::RuntimeError` composes `director_core::DirectorError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Director(#[from] director_core::DirectorError),

    #[error(transparent)]
    Storage(#[from] director_db::DbError),

    #[error(transparent)]
    Runtime(#[from] director_runtime::RuntimeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token accounting error: {0}")]
    TokenAccounting(#[from] anyhow::Error),

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("turn exceeded the maximum tool-call recursion depth ({0})")]
    MaxDepthExceeded(usize),

    #[error("provider error: {0}")]
    Provider(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
