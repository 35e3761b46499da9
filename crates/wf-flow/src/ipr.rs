//! Reservoir inflow performance.

use crate::common::check_positive;
use crate::error::{FlowError, FlowResult};
use wf_core::units::{Pressure, VolumeRate, bar, m3pd, to_bar, to_m3pd};

/// Inflow relation seen by the operating-point search.
///
/// `rate` returns the standard-condition liquid rate delivered at the given
/// bottom-hole pressure. It takes `&mut self` so implementations backed by a
/// simulator may cache trial evaluations.
pub trait InflowRelation {
    fn rate(&mut self, pwf: Pressure) -> FlowResult<VolumeRate>;

    /// Pressure at which inflow stops; upper bound of the search.
    fn reservoir_pressure(&self) -> Pressure;
}

/// Straight-line IPR: q = PI·(pr − pwf).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearIpr {
    /// Productivity index [m³/d/bar]
    pub pi: f64,
    pub pr: Pressure,
}

/// Darcy constant for mD, m, cP, m³/d and bar.
const DARCY_RADIAL: f64 = 1.0 / 18.662;

impl LinearIpr {
    pub fn new(pi: f64, pr: Pressure) -> FlowResult<Self> {
        check_positive(pi, "productivity index")?;
        check_positive(to_bar(pr), "reservoir pressure")?;
        Ok(Self { pi, pr })
    }

    /// Pseudo-steady-state radial inflow:
    /// PI = k·h / (18.662·B·μ·(ln(re/rw) − 3/4 + S)).
    #[allow(clippy::too_many_arguments)]
    pub fn from_pseudo_steady_state(
        permeability: f64,
        thickness: f64,
        fvf: f64,
        viscosity: f64,
        drainage_radius: f64,
        wellbore_radius: f64,
        skin: f64,
        pr: Pressure,
    ) -> FlowResult<Self> {
        let pi = radial_pi(
            permeability,
            thickness,
            fvf,
            viscosity,
            drainage_radius,
            wellbore_radius,
            skin,
            -0.75,
        )?;
        Self::new(pi, pr)
    }

    /// Steady-state radial inflow:
    /// PI = k·h / (18.662·B·μ·(ln(re/rw) − 1/2 + S)).
    #[allow(clippy::too_many_arguments)]
    pub fn from_steady_state(
        permeability: f64,
        thickness: f64,
        fvf: f64,
        viscosity: f64,
        drainage_radius: f64,
        wellbore_radius: f64,
        skin: f64,
        pr: Pressure,
    ) -> FlowResult<Self> {
        let pi = radial_pi(
            permeability,
            thickness,
            fvf,
            viscosity,
            drainage_radius,
            wellbore_radius,
            skin,
            -0.5,
        )?;
        Self::new(pi, pr)
    }

    /// Bottom-hole pressure delivering the given standard rate.
    pub fn pwf_for_rate(&self, q: VolumeRate) -> Pressure {
        bar(to_bar(self.pr) - to_m3pd(q) / self.pi)
    }
}

#[allow(clippy::too_many_arguments)]
fn radial_pi(
    permeability: f64,
    thickness: f64,
    fvf: f64,
    viscosity: f64,
    drainage_radius: f64,
    wellbore_radius: f64,
    skin: f64,
    shape: f64,
) -> FlowResult<f64> {
    check_positive(permeability, "permeability")?;
    check_positive(thickness, "net thickness")?;
    check_positive(fvf, "formation volume factor")?;
    check_positive(viscosity, "viscosity")?;
    check_positive(wellbore_radius, "wellbore radius")?;
    check_positive(drainage_radius, "drainage radius")?;
    let denom = (drainage_radius / wellbore_radius).ln() + shape + skin;
    if !denom.is_finite() || denom <= 0.0 {
        return Err(FlowError::InvalidParameter {
            what: "inflow geometry term ln(re/rw) + shape + skin",
            value: denom,
        });
    }
    Ok(DARCY_RADIAL * permeability * thickness / (fvf * viscosity) / denom)
}

impl InflowRelation for LinearIpr {
    fn rate(&mut self, pwf: Pressure) -> FlowResult<VolumeRate> {
        Ok(m3pd(self.pi * (to_bar(self.pr) - to_bar(pwf))))
    }

    fn reservoir_pressure(&self) -> Pressure {
        self.pr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_rate() {
        let mut ipr = LinearIpr::new(10.0, bar(300.0)).unwrap();
        assert!((to_m3pd(ipr.rate(bar(250.0)).unwrap()) - 500.0).abs() < 1e-9);
        assert_eq!(to_m3pd(ipr.rate(bar(300.0)).unwrap()), 0.0);
        assert!((to_bar(ipr.pwf_for_rate(m3pd(500.0))) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn radial_productivity_index() {
        let pss = LinearIpr::from_pseudo_steady_state(100.0, 20.0, 1.2, 2.0, 300.0, 0.1, 0.0, bar(250.0))
            .unwrap();
        let expected = 100.0 * 20.0 / (18.662 * 1.2 * 2.0 * ((3000f64).ln() - 0.75));
        assert!((pss.pi - expected).abs() < 1e-12);

        let ss =
            LinearIpr::from_steady_state(100.0, 20.0, 1.2, 2.0, 300.0, 0.1, 0.0, bar(250.0)).unwrap();
        assert!(ss.pi < pss.pi);
    }

    #[test]
    fn skin_and_bad_inputs() {
        let clean =
            LinearIpr::from_pseudo_steady_state(100.0, 20.0, 1.2, 2.0, 300.0, 0.1, 0.0, bar(250.0))
                .unwrap();
        let damaged =
            LinearIpr::from_pseudo_steady_state(100.0, 20.0, 1.2, 2.0, 300.0, 0.1, 4.0, bar(250.0))
                .unwrap();
        assert!(damaged.pi < clean.pi);
        assert!(LinearIpr::new(-1.0, bar(100.0)).is_err());
        assert!(
            LinearIpr::from_pseudo_steady_state(100.0, 20.0, 1.2, 2.0, 0.2, 0.1, -1.0, bar(250.0))
                .is_err()
        );
    }
}
