//! Common checks shared by the flow elements.

use crate::error::{FlowError, FlowResult};
use wf_core::numeric::ensure_finite;

/// Lowest pressure any port may reach [bar].
pub const MIN_PRESSURE_BAR: f64 = 0.01;

/// Ensure a value is finite, returning `NonPhysical` if not.
pub fn check_finite(value: f64, what: &'static str) -> FlowResult<f64> {
    ensure_finite(value, what).map_err(|_| FlowError::NonPhysical { what })
}

/// Ensure a parameter is finite and strictly positive.
pub fn check_positive(value: f64, what: &'static str) -> FlowResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FlowError::InvalidParameter { what, value });
    }
    Ok(value)
}

/// Ensure a computed port pressure stays above the physical floor.
pub fn check_pressure(p_bar: f64, what: &'static str) -> FlowResult<f64> {
    let p = check_finite(p_bar, what)?;
    if p < MIN_PRESSURE_BAR {
        return Err(FlowError::NonPhysical { what });
    }
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_finite() {
        assert!(check_finite(1.0, "test").is_ok());
        assert!(check_finite(f64::INFINITY, "test").is_err());
        assert!(check_finite(f64::NAN, "test").is_err());
    }

    #[test]
    fn test_check_positive() {
        assert_eq!(check_positive(2.5, "length").unwrap(), 2.5);
        assert!(matches!(
            check_positive(0.0, "length"),
            Err(FlowError::InvalidParameter { what: "length", .. })
        ));
        assert!(check_positive(f64::NAN, "length").is_err());
    }

    #[test]
    fn test_check_pressure() {
        assert!(check_pressure(1.0, "p").is_ok());
        assert!(check_pressure(0.001, "p").is_err());
        assert!(check_pressure(-5.0, "p").is_err());
    }
}
