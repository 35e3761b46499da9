//! Reynolds number and Darcy friction factor.
//!
//! - laminar (Re < 2300): f = 64/Re
//! - turbulent (Re > 4000): Colebrook-White, fixed point on x = 1/√f
//!   `x ← 1.14 − 2·log10(e/d + 9.35·x/Re)`, seeded from Swamee-Jain
//! - transitional: linear in Re between the two limits

use std::f64::consts::PI;
use tracing::warn;

/// Upper Reynolds number of laminar flow.
pub const LAMINAR_LIMIT: f64 = 2300.0;

/// Lower Reynolds number of fully turbulent flow.
pub const TURBULENT_LIMIT: f64 = 4000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowRegime {
    Stagnant,
    Laminar,
    Transitional,
    Turbulent,
}

pub fn regime(reynolds: f64) -> FlowRegime {
    if !reynolds.is_finite() || reynolds <= 0.0 {
        FlowRegime::Stagnant
    } else if reynolds < LAMINAR_LIMIT {
        FlowRegime::Laminar
    } else if reynolds > TURBULENT_LIMIT {
        FlowRegime::Turbulent
    } else {
        FlowRegime::Transitional
    }
}

/// Colebrook fixed-point controls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColebrookConfig {
    pub max_iterations: usize,
    /// Relative change in 1/√f that ends the iteration
    pub rel_tol: f64,
}

impl Default for ColebrookConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            rel_tol: 1e-3,
        }
    }
}

/// Reynolds number from mass rate [kg/s], viscosity [Pa·s] and diameter [m].
///
/// Re = 4|ṁ|/(μ·π·d). The sign of the flow does not matter.
pub fn reynolds(mass_rate: f64, viscosity: f64, diameter: f64) -> f64 {
    4.0 * mass_rate.abs() / (viscosity * PI * diameter)
}

pub fn laminar(reynolds: f64) -> f64 {
    64.0 / reynolds
}

/// Explicit Swamee-Jain estimate of the turbulent friction factor.
pub fn swamee_jain(reynolds: f64, relative_roughness: f64) -> f64 {
    let a = relative_roughness / 3.7;
    let b = 5.74 / reynolds.powf(0.9);
    0.25 / (a + b).log10().powi(2)
}

/// Colebrook-White friction factor. Hitting the iteration cap logs a warning
/// and returns the last iterate.
pub fn colebrook(reynolds: f64, relative_roughness: f64, config: &ColebrookConfig) -> f64 {
    let mut x = 1.0 / swamee_jain(reynolds, relative_roughness).sqrt();
    for _ in 0..config.max_iterations {
        let next = 1.14 - 2.0 * (relative_roughness + 9.35 * x / reynolds).log10();
        let change = ((next - x) / next).abs();
        x = next;
        if change < config.rel_tol {
            return 1.0 / (x * x);
        }
    }
    warn!(
        reynolds,
        relative_roughness,
        iterations = config.max_iterations,
        "Colebrook iteration did not converge; using last iterate"
    );
    1.0 / (x * x)
}

/// Darcy friction factor for any Reynolds number. Zero or non-finite Re
/// gives zero friction.
pub fn friction_factor(reynolds: f64, relative_roughness: f64, config: &ColebrookConfig) -> f64 {
    match regime(reynolds) {
        FlowRegime::Stagnant => 0.0,
        FlowRegime::Laminar => laminar(reynolds),
        FlowRegime::Turbulent => colebrook(reynolds, relative_roughness, config),
        FlowRegime::Transitional => {
            let f_lam = laminar(LAMINAR_LIMIT);
            let f_turb = colebrook(TURBULENT_LIMIT, relative_roughness, config);
            let w = (reynolds - LAMINAR_LIMIT) / (TURBULENT_LIMIT - LAMINAR_LIMIT);
            f_lam + w * (f_turb - f_lam)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn regimes() {
        assert_eq!(regime(0.0), FlowRegime::Stagnant);
        assert_eq!(regime(f64::NAN), FlowRegime::Stagnant);
        assert_eq!(regime(1000.0), FlowRegime::Laminar);
        assert_eq!(regime(2300.0), FlowRegime::Transitional);
        assert_eq!(regime(4000.0), FlowRegime::Transitional);
        assert_eq!(regime(4000.1), FlowRegime::Turbulent);
    }

    #[test]
    fn reynolds_ignores_direction() {
        let re = reynolds(2.0, 1e-3, 0.1);
        assert!((re - 8.0 / (1e-3 * PI * 0.1)).abs() < 1e-9);
        assert_eq!(reynolds(-2.0, 1e-3, 0.1), re);
    }

    #[test]
    fn smooth_pipe_turbulent() {
        let f = friction_factor(1e5, 0.0, &ColebrookConfig::default());
        assert!(f > 0.017 && f < 0.019, "f = {f}");
    }

    #[test]
    fn colebrook_close_to_swamee_jain() {
        for re in [1e4, 1e5, 1e6] {
            for rr in [0.0, 1e-4, 1e-3] {
                let f = colebrook(re, rr, &ColebrookConfig::default());
                let sj = swamee_jain(re, rr);
                assert!(((f - sj) / f).abs() < 0.03, "Re {re} e/d {rr}");
            }
        }
    }

    #[test]
    fn roughness_increases_friction() {
        let cfg = ColebrookConfig::default();
        assert!(friction_factor(1e6, 1e-3, &cfg) > friction_factor(1e6, 1e-5, &cfg));
    }

    #[test]
    fn transitional_interpolates() {
        let cfg = ColebrookConfig::default();
        let lo = friction_factor(LAMINAR_LIMIT, 1e-4, &cfg);
        let hi = friction_factor(TURBULENT_LIMIT, 1e-4, &cfg);
        let mid = friction_factor(3150.0, 1e-4, &cfg);
        assert!((lo - 64.0 / 2300.0).abs() < 1e-15);
        assert!((mid - 0.5 * (lo + hi)).abs() < 1e-12);
    }

    #[test]
    fn stagnant_flow_has_no_friction() {
        assert_eq!(friction_factor(0.0, 1e-4, &ColebrookConfig::default()), 0.0);
    }

    proptest! {
        #[test]
        fn laminar_is_exact(re in 1e-3f64..2299.999, rr in 0.0f64..0.05) {
            prop_assert_eq!(friction_factor(re, rr, &ColebrookConfig::default()), 64.0 / re);
        }

        #[test]
        fn turbulent_is_positive_and_bounded(re in 4001.0f64..1e8, rr in 0.0f64..0.05) {
            let f = friction_factor(re, rr, &ColebrookConfig::default());
            prop_assert!(f > 0.005 && f < 0.1);
        }
    }
}
