//! Helpers that derive reservoir inputs from the fluid description.

use wf_core::units::{Pressure, Temperature};
use wf_fluids::BlackOilFluid;
use wf_reservoir::PhaseProperties;

use crate::error::SimResult;

/// Reservoir phase properties from black-oil PVT at reservoir conditions.
///
/// Oil formation volume factor and viscosity come from the correlations;
/// water is taken as Bw = 1 and μw = 1 cP.
pub fn phase_properties(
    fluid: &BlackOilFluid,
    pressure: Pressure,
    temperature: Temperature,
) -> SimResult<PhaseProperties> {
    let mut pvt = fluid.clone();
    pvt.set_conditions(pressure, temperature)?;
    pvt.compute_liquid()?;
    Ok(PhaseProperties {
        bo: pvt.oil_fvf()?,
        bw: 1.0,
        uo: pvt.oil_viscosity()?,
        uw: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::units::{bar, degc};

    #[test]
    fn live_oil_is_thinner_and_swells() {
        let fluid = BlackOilFluid::new(30.0, 0.7, 100.0).unwrap();
        let ph = phase_properties(&fluid, bar(300.0), degc(80.0)).unwrap();
        assert!(ph.bo > 1.0 && ph.bo < 2.0, "bo = {}", ph.bo);
        assert!(ph.uo > 0.1 && ph.uo < 10.0, "uo = {}", ph.uo);
        assert_eq!(ph.bw, 1.0);
        assert_eq!(ph.uw, 1.0);
    }

    #[test]
    fn caller_fluid_is_untouched() {
        let fluid = BlackOilFluid::new(30.0, 0.7, 100.0).unwrap();
        phase_properties(&fluid, bar(300.0), degc(80.0)).unwrap();
        assert!(fluid.pressure().is_err());
    }

    #[test]
    fn out_of_range_pressure_is_an_error() {
        let fluid = BlackOilFluid::new(30.0, 0.7, 100.0).unwrap();
        assert!(phase_properties(&fluid, bar(0.0), degc(80.0)).is_err());
    }
}
