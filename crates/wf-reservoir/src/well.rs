//! Wells and the Peaceman well index.

use crate::error::{ReservoirError, ReservoirResult, check_positive};
use std::f64::consts::PI;

/// Darcy unit conversion for bar, mD, cP, m and m³/d.
pub const UNIT_CONV: f64 = 0.008_527_02;

/// Producing well at the last grid cell, controlled by bottom-hole pressure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Producer {
    /// Wellbore radius [m]
    pub rw: f64,
    pub skin: f64,
}

impl Default for Producer {
    fn default() -> Self {
        Self { rw: 0.1, skin: 0.0 }
    }
}

/// Water injector at the first grid cell, controlled by rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Injector {
    /// Wellbore radius [m]
    pub rw: f64,
    pub skin: f64,
    /// Water injection rate [m³/d]
    pub rate: f64,
}

/// Peaceman well index for a well centred in a `dx × dy` cell.
///
/// Equivalent radius ro = dx·exp(−(a·π − ln a)/(1 + a²)) with a = dy/dx;
/// WI = C·2π·k·h / (ln(ro/rw) + skin).
pub fn peaceman_well_index(
    dx: f64,
    dy: f64,
    permeability: f64,
    thickness: f64,
    rw: f64,
    skin: f64,
) -> ReservoirResult<f64> {
    check_positive(rw, "wellbore radius")?;
    let a = dy / dx;
    let ro = dx * (-(a * PI - a.ln()) / (1.0 + a * a)).exp();
    let denom = (ro / rw).ln() + skin;
    if !denom.is_finite() || denom <= 0.0 {
        return Err(ReservoirError::InvalidParameter {
            what: "well index denominator ln(ro/rw) + skin",
            value: denom,
        });
    }
    Ok(UNIT_CONV * 2.0 * PI * permeability * thickness / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_cell_equivalent_radius() {
        // a = 1: ro = dx·e^(−π/2) ≈ 0.208·dx
        let wi = peaceman_well_index(100.0, 100.0, 100.0, 10.0, 0.1, 0.0).unwrap();
        let ro = 100.0 * (-PI / 2.0).exp();
        let expected = UNIT_CONV * 2.0 * PI * 100.0 * 10.0 / (ro / 0.1).ln();
        assert!((wi - expected).abs() < 1e-12);
        assert!((ro / 100.0 - 0.2079).abs() < 1e-4);
    }

    #[test]
    fn skin_reduces_index() {
        let clean = peaceman_well_index(50.0, 80.0, 200.0, 15.0, 0.1, 0.0).unwrap();
        let damaged = peaceman_well_index(50.0, 80.0, 200.0, 15.0, 0.1, 5.0).unwrap();
        assert!(damaged < clean);
        assert!(peaceman_well_index(50.0, 80.0, 200.0, 15.0, 0.1, -3.0).unwrap() > clean);
    }

    #[test]
    fn wellbore_larger_than_equivalent_radius_is_rejected() {
        assert!(peaceman_well_index(1.0, 1.0, 100.0, 10.0, 0.5, 0.0).is_err());
        assert!(peaceman_well_index(1.0, 1.0, 100.0, 10.0, 0.0, 0.0).is_err());
    }
}
