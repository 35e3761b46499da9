//! Error types for reservoir operations.

use thiserror::Error;
use wf_solver::SolverError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReservoirError {
    #[error("Invalid parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("History error: {what}")]
    History { what: &'static str },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

pub type ReservoirResult<T> = Result<T, ReservoirError>;

pub(crate) fn check_positive(value: f64, what: &'static str) -> ReservoirResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ReservoirError::InvalidParameter { what, value })
    }
}

pub(crate) fn check_fraction(value: f64, what: &'static str) -> ReservoirResult<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ReservoirError::InvalidParameter { what, value })
    }
}
