//! Single homogeneous pipe segment.
//!
//! The segment solves the steady mechanical-energy balance
//! `Δp = −1e-5·ρ·g·(Δz + hl + Δ(v²)/(2g))` [bar] by fixed-point iteration on the
//! unknown port pressure. Fluid properties are evaluated at the mean segment
//! conditions; port velocities use the port densities. Temperature is carried
//! through unchanged.

use crate::boundary::{FlowState, PortConditions};
use crate::common::{check_finite, check_positive, check_pressure};
use crate::error::{FlowError, FlowResult};
use crate::friction::{self, ColebrookConfig};
use crate::quantity::FlowQuantity;
use crate::traits::Flowable;
use std::f64::consts::PI;
use tracing::warn;
use uom::si::volume_rate::cubic_meter_per_second;
use wf_core::numeric::relative_change;
use wf_core::units::constants::{G_MPS2, PA_TO_BAR};
use wf_core::units::{Length, Temperature, VolumeRate, bar, to_bar, to_degc, to_kelvin, to_m3pd};
use wf_fluids::{BlackOilFluid, FluidModel};

/// Pipe geometry. Elevations are positive upward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipeGeometry {
    pub length: Length,
    /// Inner diameter
    pub diameter: Length,
    /// Absolute wall roughness
    pub roughness: Length,
    pub z_in: Length,
    pub z_out: Length,
}

impl PipeGeometry {
    pub fn validate(&self) -> FlowResult<()> {
        check_positive(self.length.value, "pipe length")?;
        check_positive(self.diameter.value, "pipe diameter")?;
        let e = self.roughness.value;
        if !e.is_finite() || e < 0.0 || e >= self.diameter.value {
            return Err(FlowError::InvalidParameter {
                what: "pipe roughness",
                value: e,
            });
        }
        for z in [self.z_in.value, self.z_out.value] {
            if !z.is_finite() {
                return Err(FlowError::InvalidParameter {
                    what: "pipe elevation",
                    value: z,
                });
            }
        }
        let rise = self.elevation_change();
        if rise.abs() > self.length.value * (1.0 + 1e-9) {
            return Err(FlowError::InvalidParameter {
                what: "elevation change longer than pipe",
                value: rise,
            });
        }
        Ok(())
    }

    /// Flow area [m²].
    pub fn area(&self) -> f64 {
        PI * self.diameter.value.powi(2) / 4.0
    }

    /// z_out − z_in [m].
    pub fn elevation_change(&self) -> f64 {
        self.z_out.value - self.z_in.value
    }

    pub fn relative_roughness(&self) -> f64 {
        self.roughness.value / self.diameter.value
    }
}

/// Segment balance controls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentSolverConfig {
    pub max_iterations: usize,
    /// Relative change of mean pressure and mean absolute temperature that
    /// ends the iteration
    pub epsilon: f64,
    pub colebrook: ColebrookConfig,
}

impl Default for SegmentSolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            epsilon: 1e-6,
            colebrook: ColebrookConfig::default(),
        }
    }
}

/// Solved state of a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentResults {
    pub inlet: FlowState,
    pub outlet: FlowState,
    /// bar
    pub pressure_mean: f64,
    pub temperature_mean: Temperature,
    /// m/s, signed with the flow
    pub velocity_in: f64,
    pub velocity_out: f64,
    pub velocity_mean: f64,
    /// kg/s
    pub mass_rate: f64,
    pub reynolds: f64,
    pub friction_factor: f64,
    /// m, signed with the flow
    pub head_loss: f64,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    /// Inlet known, outlet produced
    Out,
    /// Outlet known, inlet produced
    In,
}

impl Direction {
    /// (p_in, p_out) from the known and produced pressures.
    fn order(self, known: f64, other: f64) -> (f64, f64) {
        match self {
            Direction::Out => (known, other),
            Direction::In => (other, known),
        }
    }
}

/// One pipe segment with its own fluid evaluator.
#[derive(Clone, Debug)]
pub struct PipeSegment<F: FluidModel = BlackOilFluid> {
    name: String,
    geometry: PipeGeometry,
    fluid: F,
    config: SegmentSolverConfig,
    inlet: PortConditions,
    outlet: PortConditions,
    results: Option<SegmentResults>,
}

impl<F: FluidModel> PipeSegment<F> {
    pub fn new(name: impl Into<String>, geometry: PipeGeometry, fluid: F) -> FlowResult<Self> {
        geometry.validate()?;
        Ok(Self {
            name: name.into(),
            geometry,
            fluid,
            config: SegmentSolverConfig::default(),
            inlet: PortConditions::default(),
            outlet: PortConditions::default(),
            results: None,
        })
    }

    pub fn with_config(mut self, config: SegmentSolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn geometry(&self) -> &PipeGeometry {
        &self.geometry
    }

    pub fn fluid(&self) -> &F {
        &self.fluid
    }

    /// Replace the fluid. Previous results are discarded.
    pub fn set_fluid(&mut self, fluid: F) {
        self.fluid = fluid;
        self.results = None;
    }

    pub fn config(&self) -> &SegmentSolverConfig {
        &self.config
    }

    pub fn inlet_conditions(&self) -> &PortConditions {
        &self.inlet
    }

    pub fn outlet_conditions(&self) -> &PortConditions {
        &self.outlet
    }

    pub fn set_inlet(&mut self, inlet: PortConditions) {
        self.inlet = inlet;
    }

    pub fn set_outlet(&mut self, outlet: PortConditions) {
        self.outlet = outlet;
    }

    pub fn results(&self) -> Option<&SegmentResults> {
        self.results.as_ref()
    }

    /// Solve from whichever port is fully known, inlet first.
    pub fn solve(&mut self) -> FlowResult<FlowState> {
        if let Ok(inlet) = self.inlet.resolve() {
            return self.solve_out_flow(&inlet);
        }
        match self.outlet.resolve() {
            Ok(outlet) => self.solve_in_flow(&outlet),
            Err(_) => Err(FlowError::MissingPrecondition {
                what: "segment inlet or outlet state",
            }),
        }
    }

    /// Value of one quantity, `None` until solved (elevations are always
    /// available).
    pub fn value(&self, quantity: FlowQuantity) -> Option<f64> {
        let solved = self.results.as_ref();
        match quantity {
            FlowQuantity::ElevationIn => Some(self.geometry.z_in.value),
            FlowQuantity::ElevationOut => Some(self.geometry.z_out.value),
            FlowQuantity::PressureIn => solved.map(|r| to_bar(r.inlet.pressure)),
            FlowQuantity::PressureOut => solved.map(|r| to_bar(r.outlet.pressure)),
            FlowQuantity::PressureMean => solved.map(|r| r.pressure_mean),
            FlowQuantity::TemperatureIn => solved.map(|r| to_degc(r.inlet.temperature)),
            FlowQuantity::TemperatureOut => solved.map(|r| to_degc(r.outlet.temperature)),
            FlowQuantity::TemperatureMean => solved.map(|r| to_degc(r.temperature_mean)),
            FlowQuantity::RateIn => solved.map(|r| to_m3pd(r.inlet.rate)),
            FlowQuantity::RateOut => solved.map(|r| to_m3pd(r.outlet.rate)),
            FlowQuantity::VelocityIn => solved.map(|r| r.velocity_in),
            FlowQuantity::VelocityOut => solved.map(|r| r.velocity_out),
            FlowQuantity::VelocityMean => solved.map(|r| r.velocity_mean),
            FlowQuantity::MassRate => solved.map(|r| r.mass_rate),
            FlowQuantity::Reynolds => solved.map(|r| r.reynolds),
            FlowQuantity::FrictionFactor => solved.map(|r| r.friction_factor),
            FlowQuantity::HeadLoss => solved.map(|r| r.head_loss),
        }
    }

    fn density(&self, p_bar: f64, t: Temperature) -> FlowResult<f64> {
        let rho = self.fluid.properties(bar(p_bar), t)?.density.value;
        check_positive(rho, "fluid density")
    }

    fn balance(&mut self, known: &FlowState, direction: Direction) -> FlowResult<FlowState> {
        let geometry = self.geometry;
        let config = self.config;
        let d = geometry.diameter.value;
        let area = geometry.area();
        let dz = geometry.elevation_change();
        let relative_roughness = geometry.relative_roughness();

        let p_known = check_pressure(to_bar(known.pressure), "known port pressure")?;
        let t = known.temperature;
        let rho_known = self.density(p_known, t)?;
        let mass_rate = check_finite(rho_known * known.rate.value, "segment mass rate")?;

        let mut p_other = p_known;
        let mut p_mean = p_known;
        let t_mean = to_kelvin(t);
        let mut reynolds = 0.0;
        let mut friction_factor = 0.0;
        let mut head_loss = 0.0;
        let mut converged = false;
        let mut iterations = 0;

        for iter in 1..=config.max_iterations {
            iterations = iter;
            let (p_in, p_out) = direction.order(p_known, p_other);
            let mean = self.fluid.properties(bar(p_mean), t)?;
            let rho_mean = check_positive(mean.density.value, "fluid density")?;
            let v_in = mass_rate / (self.density(p_in, t)? * area);
            let v_out = mass_rate / (self.density(p_out, t)? * area);
            let v_mean = 0.5 * (v_in + v_out);

            reynolds = friction::reynolds(mass_rate, mean.viscosity.value, d);
            friction_factor = friction::friction_factor(reynolds, relative_roughness, &config.colebrook);
            head_loss = friction_factor * geometry.length.value * v_mean * v_mean.abs() / (2.0 * G_MPS2 * d);
            let kinetic = (v_out * v_out - v_in * v_in) / (2.0 * G_MPS2);
            let dp = -PA_TO_BAR * rho_mean * G_MPS2 * (dz + head_loss + kinetic);

            p_other = match direction {
                Direction::Out => p_known + dp,
                Direction::In => p_known - dp,
            };
            p_other = check_pressure(p_other, "segment port pressure")?;

            // Temperature transport is a no-op, so only the pressure can move.
            let p_mean_next = 0.5 * (p_known + p_other);
            let change_p = relative_change(p_mean, p_mean_next);
            let change_t = relative_change(t_mean, to_kelvin(t));
            p_mean = p_mean_next;
            if change_p < config.epsilon && change_t < config.epsilon {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                segment = %self.name,
                iterations,
                p_mean,
                "segment balance did not converge; using last iterate"
            );
        }

        let rho_other = self.density(p_other, t)?;
        let other = FlowState {
            pressure: bar(p_other),
            temperature: t,
            rate: VolumeRate::new::<cubic_meter_per_second>(mass_rate / rho_other),
        };
        let (inlet, outlet) = match direction {
            Direction::Out => (*known, other),
            Direction::In => (other, *known),
        };
        let v_in = mass_rate / (self.density(to_bar(inlet.pressure), t)? * area);
        let v_out = mass_rate / (self.density(to_bar(outlet.pressure), t)? * area);

        self.inlet = PortConditions::known(inlet);
        self.outlet = PortConditions::known(outlet);
        self.results = Some(SegmentResults {
            inlet,
            outlet,
            pressure_mean: p_mean,
            temperature_mean: t,
            velocity_in: v_in,
            velocity_out: v_out,
            velocity_mean: 0.5 * (v_in + v_out),
            mass_rate,
            reynolds,
            friction_factor,
            head_loss,
            iterations,
            converged,
        });
        Ok(other)
    }
}

impl<F: FluidModel> Flowable for PipeSegment<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve_out_flow(&mut self, inlet: &FlowState) -> FlowResult<FlowState> {
        self.inlet = PortConditions::known(*inlet);
        self.outlet = PortConditions::default();
        self.balance(inlet, Direction::Out)
    }

    fn solve_in_flow(&mut self, outlet: &FlowState) -> FlowResult<FlowState> {
        self.outlet = PortConditions::known(*outlet);
        self.inlet = PortConditions::default();
        self.balance(outlet, Direction::In)
    }

    fn inlet(&self) -> Option<FlowState> {
        self.results.map(|r| r.inlet)
    }

    fn outlet(&self) -> Option<FlowState> {
        self.results.map(|r| r.outlet)
    }

    fn profile(&self, quantity: FlowQuantity) -> Vec<f64> {
        vec![self.value(quantity).unwrap_or(f64::NAN)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::units::{degc, m, m3pd};

    fn oil() -> BlackOilFluid {
        BlackOilFluid::new(30.0, 0.7, 100.0).unwrap()
    }

    fn geometry(length: f64, z_in: f64, z_out: f64) -> PipeGeometry {
        PipeGeometry {
            length: m(length),
            diameter: m(0.1524),
            roughness: m(4.5e-5),
            z_in: m(z_in),
            z_out: m(z_out),
        }
    }

    fn inlet(p: f64, q: f64) -> FlowState {
        FlowState::new(bar(p), degc(60.0), m3pd(q))
    }

    #[test]
    fn no_flow_horizontal_keeps_pressure() {
        let mut seg = PipeSegment::new("s", geometry(500.0, 0.0, 0.0), oil()).unwrap();
        let out = seg.solve_out_flow(&inlet(150.0, 0.0)).unwrap();
        assert_eq!(to_bar(out.pressure), 150.0);
        let r = seg.results().unwrap();
        assert!(r.converged);
        assert_eq!(r.friction_factor, 0.0);
        assert_eq!(r.head_loss, 0.0);
    }

    #[test]
    fn static_column_is_hydrostatic() {
        let mut seg = PipeSegment::new("riser", geometry(100.0, 0.0, 100.0), oil()).unwrap();
        let out = seg.solve_out_flow(&inlet(150.0, 0.0)).unwrap();
        let r = *seg.results().unwrap();
        let rho = oil()
            .properties(bar(r.pressure_mean), degc(60.0))
            .unwrap()
            .density
            .value;
        let expected = 150.0 - PA_TO_BAR * rho * G_MPS2 * 100.0;
        assert!((to_bar(out.pressure) - expected).abs() < 1e-4);
    }

    #[test]
    fn friction_drops_pressure_and_conserves_mass() {
        let mut seg = PipeSegment::new("s", geometry(1000.0, 0.0, 0.0), oil()).unwrap();
        let out = seg.solve_out_flow(&inlet(200.0, 1500.0)).unwrap();
        assert!(to_bar(out.pressure) < 200.0);
        let r = seg.results().unwrap();
        assert!(r.converged);
        assert!(r.reynolds > 4000.0);
        assert!(r.head_loss > 0.0);

        let rho_in = oil().properties(bar(200.0), degc(60.0)).unwrap().density.value;
        let rho_out = oil().properties(out.pressure, degc(60.0)).unwrap().density.value;
        let m_in = rho_in * m3pd(1500.0).value;
        let m_out = rho_out * out.rate.value;
        assert!((m_in - m_out).abs() < 1e-9 * m_in);
    }

    #[test]
    fn reverse_flow_raises_outlet_pressure() {
        let mut seg = PipeSegment::new("s", geometry(1000.0, 0.0, 0.0), oil()).unwrap();
        let out = seg.solve_out_flow(&inlet(200.0, -1500.0)).unwrap();
        assert!(to_bar(out.pressure) > 200.0);
        assert!(seg.results().unwrap().head_loss < 0.0);
    }

    #[test]
    fn in_flow_reproduces_inlet() {
        let mut seg = PipeSegment::new("s", geometry(800.0, -800.0, 0.0), oil()).unwrap();
        let start = inlet(250.0, 800.0);
        let out = seg.solve_out_flow(&start).unwrap();
        let back = seg.solve_in_flow(&out).unwrap();
        assert!((to_bar(back.pressure) - 250.0).abs() < 1e-3);
        assert!((to_m3pd(back.rate) - 800.0).abs() < 1e-6);
        assert_eq!(seg.outlet(), Some(out));
    }

    #[test]
    fn solve_uses_known_port() {
        let mut seg = PipeSegment::new("s", geometry(300.0, 0.0, 0.0), oil()).unwrap();
        assert!(matches!(
            seg.solve(),
            Err(FlowError::MissingPrecondition { .. })
        ));
        seg.set_outlet(PortConditions::known(inlet(100.0, 300.0)));
        let produced = seg.solve().unwrap();
        assert!(to_bar(produced.pressure) > 100.0);
        assert!(seg.inlet_conditions().is_complete());
    }

    #[test]
    fn segment_cap_returns_last_iterate() {
        let config = SegmentSolverConfig {
            max_iterations: 1,
            ..SegmentSolverConfig::default()
        };
        let mut seg = PipeSegment::new("s", geometry(1000.0, 0.0, 0.0), oil())
            .unwrap()
            .with_config(config);
        let out = seg.solve_out_flow(&inlet(200.0, 1500.0)).unwrap();
        let r = *seg.results().unwrap();
        assert!(!r.converged);
        assert_eq!(r.iterations, 1);
        let p_out = to_bar(out.pressure);
        assert!(p_out.is_finite() && p_out < 200.0);
        assert_eq!(r.outlet, out);

        let mut full = PipeSegment::new("s", geometry(1000.0, 0.0, 0.0), oil()).unwrap();
        full.solve_out_flow(&inlet(200.0, 1500.0)).unwrap();
        assert!(full.results().unwrap().iterations > 1);
    }

    #[test]
    fn pressure_floor_is_enforced() {
        let mut seg = PipeSegment::new("s", geometry(1000.0, 0.0, 1000.0), oil()).unwrap();
        assert!(matches!(
            seg.solve_out_flow(&inlet(5.0, 100.0)),
            Err(FlowError::NonPhysical { .. })
        ));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let mut g = geometry(100.0, 0.0, 0.0);
        g.diameter = m(0.0);
        assert!(PipeSegment::new("s", g, oil()).is_err());
        let g = geometry(100.0, 0.0, 150.0);
        assert!(PipeSegment::new("s", g, oil()).is_err());
        let mut g = geometry(100.0, 0.0, 0.0);
        g.roughness = m(-1e-5);
        assert!(PipeSegment::new("s", g, oil()).is_err());
    }

    #[test]
    fn profile_before_solve() {
        let seg = PipeSegment::new("s", geometry(100.0, -50.0, 0.0), oil()).unwrap();
        assert!(seg.profile(FlowQuantity::PressureOut)[0].is_nan());
        assert_eq!(seg.profile(FlowQuantity::ElevationIn), vec![-50.0]);
        assert!(seg.inlet().is_none());
    }
}
