//! Runtime-specific errors, composing into `director_core::DirectorError`
//! at the crate boundary the way `cwa_core::CwaError` composes
//! `#[from] cwa_db::DbError`.

use director_core::DirectorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("schema validation failed: expected {expected}, received {received}")]
    SchemaValidation { expected: String, received: String },

    #[error("expected an array for iteration variable '{variable}', got {actual_type}")]
    NotArray { variable: String, actual_type: String },

    #[error("route had no matching branch")]
    RouteNoMatch,

    #[error("invalid execution selection: {0}")]
    InvalidSelection(String),

    #[error(transparent)]
    Director(#[from] DirectorError),

    #[error(transparent)]
    Storage(#[from] director_db::DbError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl From<&RuntimeError> for director_core::NodeFailure {
    fn from(err: &RuntimeError) -> Self {
        let failure_type = match err {
            RuntimeError::Validation(_) => "UserError.Validation",
            RuntimeError::SchemaValidation { .. } => "ValidationError",
            RuntimeError::NotArray { .. } => "IterationError.NotArray",
            RuntimeError::RouteNoMatch => "ExecutionError.RouteNoMatch",
            RuntimeError::InvalidSelection(_) => "UserError.InvalidSelection",
            RuntimeError::Director(inner) => return director_core::NodeFailure::from(inner),
            RuntimeError::Storage(_) => "StorageError",
        };
        director_core::NodeFailure::new("", failure_type, err.to_string())
    }
}
