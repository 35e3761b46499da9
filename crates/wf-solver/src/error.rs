//! Error types for solver operations.

use thiserror::Error;
use wf_core::error::WfError;

/// Hard solver failures. Exhausted iteration caps are not errors; they are
/// reported through the `converged` flag of each result type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Singular linear system: {what}")]
    Singular { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Numeric error: {0}")]
    Numeric(#[from] WfError),
}

pub type SolverResult<T> = Result<T, SolverError>;
