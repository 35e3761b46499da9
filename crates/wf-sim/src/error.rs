//! Error types for coupled simulation runs.

use thiserror::Error;
use wf_flow::FlowError;
use wf_fluids::FluidError;
use wf_reservoir::ReservoirError;

/// Errors encountered while running the coupled model.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Reservoir error: {0}")]
    Reservoir(#[from] ReservoirError),

    #[error("Flow network error: {0}")]
    Flow(#[from] FlowError),

    #[error("Fluid property error: {0}")]
    Fluid(#[from] FluidError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
