//! Idealized pressure booster (pump / ESP).

use crate::boundary::FlowState;
use crate::common::{check_positive, check_pressure};
use crate::error::{FlowError, FlowResult};
use crate::quantity::FlowQuantity;
use crate::traits::Flowable;
use uom::si::power::watt;
use uom::si::pressure::pascal;
use wf_core::units::{Power, Pressure, Temperature, bar, to_bar, to_degc, to_m3pd};
use wf_fluids::{BlackOilFluid, FluidModel};

/// Adds a fixed pressure increment in the flow direction.
///
/// Out-flow adds `delta_p`, in-flow subtracts it. Mass is conserved through
/// the port densities. Hydraulic power is Δp·q_in/η.
#[derive(Clone, Debug)]
pub struct Booster<F: FluidModel = BlackOilFluid> {
    name: String,
    delta_p: Pressure,
    efficiency: f64,
    fluid: F,
    inlet: Option<FlowState>,
    outlet: Option<FlowState>,
}

impl<F: FluidModel> Booster<F> {
    pub fn new(
        name: impl Into<String>,
        delta_p: Pressure,
        efficiency: f64,
        fluid: F,
    ) -> FlowResult<Self> {
        if !delta_p.value.is_finite() || delta_p.value < 0.0 {
            return Err(FlowError::InvalidParameter {
                what: "booster pressure increment",
                value: to_bar(delta_p),
            });
        }
        check_positive(efficiency, "booster efficiency")?;
        if efficiency > 1.0 {
            return Err(FlowError::InvalidParameter {
                what: "booster efficiency",
                value: efficiency,
            });
        }
        Ok(Self {
            name: name.into(),
            delta_p,
            efficiency,
            fluid,
            inlet: None,
            outlet: None,
        })
    }

    pub fn delta_p(&self) -> Pressure {
        self.delta_p
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn fluid(&self) -> &F {
        &self.fluid
    }

    pub fn set_fluid(&mut self, fluid: F) {
        self.fluid = fluid;
    }

    /// Shaft power drawn at the last solved rate, `None` before any solve.
    pub fn hydraulic_power(&self) -> Option<Power> {
        let inlet = self.inlet?;
        let w = self.delta_p.get::<pascal>() * inlet.rate.value.abs() / self.efficiency;
        Some(Power::new::<watt>(w))
    }

    fn density(&self, p: Pressure, t: Temperature) -> FlowResult<f64> {
        let rho = self.fluid.properties(p, t)?.density.value;
        check_positive(rho, "fluid density")
    }

    fn value(&self, quantity: FlowQuantity) -> f64 {
        let (Some(inlet), Some(outlet)) = (self.inlet, self.outlet) else {
            return f64::NAN;
        };
        match quantity {
            FlowQuantity::PressureIn => to_bar(inlet.pressure),
            FlowQuantity::PressureOut => to_bar(outlet.pressure),
            FlowQuantity::PressureMean => 0.5 * (to_bar(inlet.pressure) + to_bar(outlet.pressure)),
            FlowQuantity::TemperatureIn | FlowQuantity::TemperatureMean => {
                to_degc(inlet.temperature)
            }
            FlowQuantity::TemperatureOut => to_degc(outlet.temperature),
            FlowQuantity::RateIn => to_m3pd(inlet.rate),
            FlowQuantity::RateOut => to_m3pd(outlet.rate),
            _ => f64::NAN,
        }
    }
}

impl<F: FluidModel> Flowable for Booster<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve_out_flow(&mut self, inlet: &FlowState) -> FlowResult<FlowState> {
        let p_out = inlet.pressure + self.delta_p;
        let rho_in = self.density(inlet.pressure, inlet.temperature)?;
        let rho_out = self.density(p_out, inlet.temperature)?;
        let outlet = FlowState {
            pressure: p_out,
            temperature: inlet.temperature,
            rate: inlet.rate * (rho_in / rho_out),
        };
        self.inlet = Some(*inlet);
        self.outlet = Some(outlet);
        Ok(outlet)
    }

    fn solve_in_flow(&mut self, outlet: &FlowState) -> FlowResult<FlowState> {
        let p_in = bar(check_pressure(
            to_bar(outlet.pressure - self.delta_p),
            "booster suction pressure",
        )?);
        let rho_out = self.density(outlet.pressure, outlet.temperature)?;
        let rho_in = self.density(p_in, outlet.temperature)?;
        let inlet = FlowState {
            pressure: p_in,
            temperature: outlet.temperature,
            rate: outlet.rate * (rho_out / rho_in),
        };
        self.inlet = Some(inlet);
        self.outlet = Some(*outlet);
        Ok(inlet)
    }

    fn inlet(&self) -> Option<FlowState> {
        self.inlet
    }

    fn outlet(&self) -> Option<FlowState> {
        self.outlet
    }

    fn profile(&self, quantity: FlowQuantity) -> Vec<f64> {
        vec![self.value(quantity)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::units::{degc, m3pd};

    fn esp() -> Booster {
        Booster::new(
            "esp",
            bar(50.0),
            0.5,
            BlackOilFluid::new(30.0, 0.7, 100.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn adds_and_removes_increment() {
        let mut b = esp();
        let inlet = FlowState::new(bar(100.0), degc(60.0), m3pd(1000.0));
        let out = b.solve_out_flow(&inlet).unwrap();
        assert!((to_bar(out.pressure) - 150.0).abs() < 1e-9);
        // compressed liquid occupies less volume
        assert!(to_m3pd(out.rate) < 1000.0);
        let back = b.solve_in_flow(&out).unwrap();
        assert!((to_bar(back.pressure) - 100.0).abs() < 1e-9);
        assert!((to_m3pd(back.rate) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn hydraulic_power() {
        let mut b = esp();
        assert!(b.hydraulic_power().is_none());
        b.solve_out_flow(&FlowState::new(bar(100.0), degc(60.0), m3pd(864.0)))
            .unwrap();
        // 50 bar · 0.01 m³/s / 0.5 = 100 kW
        let p = b.hydraulic_power().unwrap().get::<watt>();
        assert!((p - 1.0e5).abs() < 1e-6);
    }

    #[test]
    fn suction_pressure_floor() {
        let mut b = esp();
        let outlet = FlowState::new(bar(30.0), degc(60.0), m3pd(100.0));
        assert!(matches!(
            b.solve_in_flow(&outlet),
            Err(FlowError::NonPhysical { .. })
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        let fluid = BlackOilFluid::water();
        assert!(Booster::new("b", bar(-1.0), 0.5, fluid.clone()).is_err());
        assert!(Booster::new("b", bar(10.0), 0.0, fluid.clone()).is_err());
        assert!(Booster::new("b", bar(10.0), 1.2, fluid).is_err());
    }
}
