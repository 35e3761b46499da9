//! Fluid property errors.

use thiserror::Error;
use wf_core::WfError;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors raised by the fluid property evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// A physical input outside its valid range. Raised by the setter, never clamped.
    #[error("Invalid parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    /// A query or compute call issued before the value it depends on exists.
    #[error("Missing precondition: {what} has not been computed")]
    MissingPrecondition { what: &'static str },

    /// A correlation produced a value outside its physical range.
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },
}

impl From<FluidError> for WfError {
    fn from(err: FluidError) -> Self {
        match err {
            FluidError::InvalidParameter { what, .. } => WfError::InvalidArg { what },
            FluidError::MissingPrecondition { what } => WfError::InvalidArg { what },
            FluidError::NonPhysical { what, value } => WfError::NonFinite { what, value },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_quantity() {
        let err = FluidError::MissingPrecondition {
            what: "bubble point pressure",
        };
        assert!(err.to_string().contains("bubble point pressure"));

        let err = FluidError::InvalidParameter {
            what: "API gravity",
            value: 150.0,
        };
        assert!(err.to_string().contains("API gravity"));
        assert!(err.to_string().contains("150"));
    }

    #[test]
    fn error_to_wf_error() {
        let err: WfError = FluidError::InvalidParameter {
            what: "water fraction",
            value: 2.0,
        }
        .into();
        assert!(matches!(
            err,
            WfError::InvalidArg {
                what: "water fraction"
            }
        ));
    }
}
