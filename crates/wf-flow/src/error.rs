//! Error types for pipe-flow operations.

use thiserror::Error;
use wf_core::WfError;
use wf_fluids::FluidError;
use wf_solver::SolverError;

/// Errors raised while building or solving flow paths.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Invalid parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Missing precondition: {what}")]
    MissingPrecondition { what: &'static str },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    /// The inflow relation could not be evaluated.
    #[error("Inflow relation error: {message}")]
    Inflow { message: String },

    #[error("Fluid property error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

pub type FlowResult<T> = Result<T, FlowError>;

impl FlowError {
    /// True for failures caused by the operating conditions rather than by
    /// the model setup: a port pressure below the floor or fluid properties
    /// out of their physical range.
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            FlowError::NonPhysical { .. } | FlowError::Fluid(FluidError::NonPhysical { .. })
        )
    }
}

impl From<FlowError> for WfError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::InvalidParameter { what, .. } => WfError::InvalidArg { what },
            FlowError::MissingPrecondition { what } => WfError::InvalidArg { what },
            FlowError::NonPhysical { what } => WfError::InvalidArg { what },
            FlowError::Inflow { .. } => WfError::InvalidArg {
                what: "inflow relation error",
            },
            FlowError::Fluid(inner) => inner.into(),
            FlowError::Solver(_) => WfError::InvalidArg {
                what: "flow solver error",
            },
        }
    }
}
