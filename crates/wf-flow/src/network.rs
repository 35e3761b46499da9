//! Composite flow path (well tubing, boosters, flowline) and the
//! operating-point search against an inflow relation.

use crate::booster::Booster;
use crate::boundary::{FlowState, PortConditions};
use crate::common::check_positive;
use crate::element::{FlowElement, PipeDefaults};
use crate::error::{FlowError, FlowResult};
use crate::ipr::{InflowRelation, LinearIpr};
use crate::quantity::FlowQuantity;
use crate::segment::SegmentSolverConfig;
use crate::traits::Flowable;
use tracing::debug;
use uom::si::power::watt;
use wf_core::units::{Power, Pressure, Temperature, VolumeRate, bar, to_bar, to_m3pd};
use wf_fluids::{BlackOilFluid, FluidModel};
use wf_solver::{SecantConfig, secant_solve};

/// One stage of a network.
#[derive(Clone, Debug)]
pub enum NetworkElement<F: FluidModel = BlackOilFluid> {
    Pipe(FlowElement<F>),
    Booster(Booster<F>),
}

impl<F: FluidModel> NetworkElement<F> {
    fn as_flowable(&self) -> &dyn Flowable {
        match self {
            NetworkElement::Pipe(p) => p,
            NetworkElement::Booster(b) => b,
        }
    }

    fn as_flowable_mut(&mut self) -> &mut dyn Flowable {
        match self {
            NetworkElement::Pipe(p) => p,
            NetworkElement::Booster(b) => b,
        }
    }

    fn set_fluid(&mut self, fluid: F) {
        match self {
            NetworkElement::Pipe(p) => p.set_fluid(fluid),
            NetworkElement::Booster(b) => b.set_fluid(fluid),
        }
    }
}

impl<F: FluidModel> Flowable for NetworkElement<F> {
    fn name(&self) -> &str {
        self.as_flowable().name()
    }

    fn solve_out_flow(&mut self, inlet: &FlowState) -> FlowResult<FlowState> {
        self.as_flowable_mut().solve_out_flow(inlet)
    }

    fn solve_in_flow(&mut self, outlet: &FlowState) -> FlowResult<FlowState> {
        self.as_flowable_mut().solve_in_flow(outlet)
    }

    fn inlet(&self) -> Option<FlowState> {
        self.as_flowable().inlet()
    }

    fn outlet(&self) -> Option<FlowState> {
        self.as_flowable().outlet()
    }

    fn profile(&self, quantity: FlowQuantity) -> Vec<f64> {
        self.as_flowable().profile(quantity)
    }
}

/// Operating-point search controls.
#[derive(Clone, Debug)]
pub struct OperatingPointConfig {
    /// Secant controls; tolerances in bar. Bounds are set per search.
    pub secant: SecantConfig,
    /// Seeds as fractions of reservoir pressure when no estimate is given
    pub seed_fractions: (f64, f64),
    /// Relative offset of the second seed from a caller estimate
    pub perturbation: f64,
    /// Lowest bottom-hole pressure the search may try
    pub min_pwf: Pressure,
}

impl Default for OperatingPointConfig {
    fn default() -> Self {
        Self {
            secant: SecantConfig {
                max_iterations: 50,
                abs_tol: 1e-3,
                step_tol: 1e-6,
                bounds: None,
                max_backtracks: 30,
            },
            seed_fractions: (0.8, 0.6),
            perturbation: 0.05,
            min_pwf: bar(1.0),
        }
    }
}

/// Bottom-hole pressure and standard rate where inflow and lift agree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OperatingPoint {
    pub pwf: Pressure,
    pub q_std: VolumeRate,
    /// pwf − VLP(q_std) [bar]
    pub residual: f64,
    pub evaluations: usize,
    pub converged: bool,
}

/// Ordered chain of pipes and boosters from the sandface (inlet) to the
/// wellhead (outlet).
///
/// Pipes appended with [`Network::add_pipe`] inherit the network's diameter,
/// roughness and subdivision defaults unless overridden on the returned
/// element. Every element holds its own clone of the network fluid.
#[derive(Clone, Debug)]
pub struct Network<F: FluidModel = BlackOilFluid> {
    name: String,
    fluid: F,
    defaults: PipeDefaults,
    segment_config: SegmentSolverConfig,
    elements: Vec<NetworkElement<F>>,
    outlet: PortConditions,
    ipr: Option<LinearIpr>,
    config: OperatingPointConfig,
    operating_point: Option<OperatingPoint>,
}

impl<F: FluidModel> Network<F> {
    pub fn new(name: impl Into<String>, fluid: F) -> Self {
        Self {
            name: name.into(),
            fluid,
            defaults: PipeDefaults::default(),
            segment_config: SegmentSolverConfig::default(),
            elements: Vec::new(),
            outlet: PortConditions::default(),
            ipr: None,
            config: OperatingPointConfig::default(),
            operating_point: None,
        }
    }

    pub fn defaults(&self) -> &PipeDefaults {
        &self.defaults
    }

    /// Set the inherited pipe geometry. Applies to pipes already added too.
    pub fn set_defaults(&mut self, defaults: PipeDefaults) -> FlowResult<()> {
        if defaults.divisions == 0 {
            return Err(FlowError::InvalidParameter {
                what: "default divisions",
                value: 0.0,
            });
        }
        check_positive(defaults.diameter.value, "default diameter")?;
        self.defaults = defaults;
        for el in &mut self.elements {
            if let NetworkElement::Pipe(p) = el {
                p.set_defaults(defaults);
            }
        }
        Ok(())
    }

    pub fn set_segment_config(&mut self, config: SegmentSolverConfig) {
        self.segment_config = config;
        for el in &mut self.elements {
            if let NetworkElement::Pipe(p) = el {
                p.set_solver_config(config);
            }
        }
    }

    pub fn config(&self) -> &OperatingPointConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OperatingPointConfig) {
        self.config = config;
    }

    /// Append a pipe and return it for configuration.
    pub fn add_pipe(&mut self, name: impl Into<String>) -> &mut FlowElement<F> {
        let mut pipe = FlowElement::new(name, self.fluid.clone()).with_defaults(self.defaults);
        pipe.set_solver_config(self.segment_config);
        self.elements.push(NetworkElement::Pipe(pipe));
        match self.elements.last_mut() {
            Some(NetworkElement::Pipe(p)) => p,
            _ => unreachable!("a pipe was just appended"),
        }
    }

    /// Append a booster and return it.
    pub fn add_booster(
        &mut self,
        name: impl Into<String>,
        delta_p: Pressure,
        efficiency: f64,
    ) -> FlowResult<&mut Booster<F>> {
        let booster = Booster::new(name, delta_p, efficiency, self.fluid.clone())?;
        self.elements.push(NetworkElement::Booster(booster));
        match self.elements.last_mut() {
            Some(NetworkElement::Booster(b)) => Ok(b),
            _ => unreachable!("a booster was just appended"),
        }
    }

    pub fn elements(&self) -> &[NetworkElement<F>] {
        &self.elements
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut NetworkElement<F>> {
        self.elements.get_mut(index)
    }

    pub fn fluid(&self) -> &F {
        &self.fluid
    }

    /// Replace the network fluid; every element receives its own clone.
    pub fn set_fluid(&mut self, fluid: F) {
        for el in &mut self.elements {
            el.set_fluid(fluid.clone());
        }
        self.fluid = fluid;
    }

    pub fn outlet_conditions(&self) -> &PortConditions {
        &self.outlet
    }

    pub fn set_outlet(&mut self, outlet: PortConditions) {
        self.outlet = outlet;
    }

    /// Fix wellhead pressure and temperature; the rate is left to the solve.
    pub fn set_wellhead(&mut self, pressure: Pressure, temperature: Temperature) {
        self.outlet = PortConditions::fixed(pressure, temperature);
    }

    pub fn ipr(&self) -> Option<&LinearIpr> {
        self.ipr.as_ref()
    }

    pub fn set_ipr(&mut self, ipr: LinearIpr) {
        self.ipr = Some(ipr);
    }

    pub fn operating_point(&self) -> Option<&OperatingPoint> {
        self.operating_point.as_ref()
    }

    /// True once solved and every pipe segment balance converged.
    pub fn converged(&self) -> bool {
        !self.elements.is_empty()
            && self.elements.iter().all(|el| match el {
                NetworkElement::Pipe(p) => p.converged(),
                NetworkElement::Booster(b) => b.inlet().is_some(),
            })
    }

    /// Total shaft power of all boosters at the last solved rate.
    pub fn booster_power(&self) -> Power {
        let w = self
            .elements
            .iter()
            .filter_map(|el| match el {
                NetworkElement::Booster(b) => b.hydraulic_power(),
                NetworkElement::Pipe(_) => None,
            })
            .map(|p| p.get::<watt>())
            .sum();
        Power::new::<watt>(w)
    }

    /// Vertical lift performance: sandface pressure needed to deliver the
    /// standard rate `q_std` against the fixed wellhead conditions.
    pub fn vlp(&mut self, q_std: VolumeRate) -> FlowResult<Pressure> {
        let p_wh = self.outlet.pressure.require("wellhead pressure")?;
        let t_wh = self.outlet.temperature.require("wellhead temperature")?;
        let fvf = self.fluid.properties(p_wh, t_wh)?.fvf;
        let wellhead = FlowState::new(p_wh, t_wh, q_std * fvf);
        Ok(self.solve_in_flow(&wellhead)?.pressure)
    }

    /// Operating point against the network's own linear IPR.
    pub fn solve_operating_point(
        &mut self,
        estimate: Option<Pressure>,
    ) -> FlowResult<OperatingPoint> {
        let mut ipr = self.ipr.ok_or(FlowError::MissingPrecondition {
            what: "inflow relation",
        })?;
        self.solve_operating_point_with(&mut ipr, estimate)
    }

    /// Find pwf with r(pwf) = pwf − VLP(IPR(pwf)) = 0 by a secant search
    /// bounded to [min_pwf, pr].
    ///
    /// Seeds are fractions of pr, or `estimate` and a small perturbation of it.
    /// The best candidate is returned even when the search does not reach its
    /// tolerance; `converged` reports which. Trials whose lift traverse leaves
    /// the physical range are skipped rather than failing the search. Only
    /// when no trial in the interval is feasible is `NonPhysical` returned.
    pub fn solve_operating_point_with<I: InflowRelation>(
        &mut self,
        inflow: &mut I,
        estimate: Option<Pressure>,
    ) -> FlowResult<OperatingPoint> {
        let pr = to_bar(inflow.reservoir_pressure());
        let p_min = to_bar(self.config.min_pwf);
        if !pr.is_finite() || pr <= p_min {
            return Err(FlowError::InvalidParameter {
                what: "reservoir pressure at or below minimum bottom-hole pressure",
                value: pr,
            });
        }

        let (x0, x1) = match estimate {
            Some(p) => {
                let p = to_bar(p).clamp(p_min, pr);
                let step = self.config.perturbation * p;
                if p - step >= p_min {
                    (p, p - step)
                } else {
                    (p, p + step)
                }
            }
            None => (
                self.config.seed_fractions.0 * pr,
                self.config.seed_fractions.1 * pr,
            ),
        };
        let secant = SecantConfig {
            bounds: Some((p_min, pr)),
            ..self.config.secant.clone()
        };

        let mut trials: Vec<(f64, VolumeRate)> = Vec::new();
        let result = secant_solve(
            x0,
            x1,
            |pwf| -> FlowResult<f64> {
                let q = inflow.rate(bar(pwf))?;
                match self.vlp(q) {
                    Ok(lift) => {
                        trials.push((pwf, q));
                        Ok(pwf - to_bar(lift))
                    }
                    Err(e) if e.is_infeasible() => {
                        debug!(network = %self.name, pwf, error = %e, "lift traverse infeasible");
                        Ok(f64::NAN)
                    }
                    Err(e) => Err(e),
                }
            },
            &secant,
        )?;
        if !result.residual.is_finite() {
            return Err(FlowError::NonPhysical {
                what: "no feasible operating point between minimum bottom-hole and reservoir pressure",
            });
        }

        let q_std = trials
            .iter()
            .rev()
            .find(|(pwf, _)| *pwf == result.x)
            .map(|(_, q)| *q)
            .ok_or(FlowError::MissingPrecondition {
                what: "inflow rate at the selected bottom-hole pressure",
            })?;

        // Leave the element states at the selected point.
        self.vlp(q_std)?;

        let point = OperatingPoint {
            pwf: bar(result.x),
            q_std,
            residual: result.residual,
            evaluations: result.evaluations,
            converged: result.converged,
        };
        debug!(
            network = %self.name,
            pwf = result.x,
            q = to_m3pd(q_std),
            residual = result.residual,
            "operating point"
        );
        self.operating_point = Some(point);
        Ok(point)
    }
}

impl<F: FluidModel> Flowable for Network<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve_out_flow(&mut self, inlet: &FlowState) -> FlowResult<FlowState> {
        if self.elements.is_empty() {
            return Err(FlowError::MissingPrecondition {
                what: "network elements",
            });
        }
        let mut state = *inlet;
        for el in &mut self.elements {
            state = el.solve_out_flow(&state)?;
        }
        Ok(state)
    }

    fn solve_in_flow(&mut self, outlet: &FlowState) -> FlowResult<FlowState> {
        if self.elements.is_empty() {
            return Err(FlowError::MissingPrecondition {
                what: "network elements",
            });
        }
        let mut state = *outlet;
        for el in self.elements.iter_mut().rev() {
            state = el.solve_in_flow(&state)?;
        }
        Ok(state)
    }

    fn inlet(&self) -> Option<FlowState> {
        self.elements.first().and_then(|el| el.inlet())
    }

    fn outlet(&self) -> Option<FlowState> {
        self.elements.last().and_then(|el| el.outlet())
    }

    fn profile(&self, quantity: FlowQuantity) -> Vec<f64> {
        self.elements
            .iter()
            .flat_map(|el| el.profile(quantity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::units::{degc, m, m3pd};

    fn oil() -> BlackOilFluid {
        BlackOilFluid::new(30.0, 0.7, 100.0).unwrap()
    }

    fn well() -> Network {
        let mut net = Network::new("producer", oil());
        net.add_pipe("tubing")
            .set_length(m(1000.0))
            .unwrap()
            .set_elevations(m(-1000.0), m(0.0))
            .unwrap()
            .set_divisions(5)
            .unwrap();
        net.set_wellhead(bar(20.0), degc(50.0));
        net
    }

    #[test]
    fn pipes_inherit_network_defaults() {
        let mut net = well();
        net.set_defaults(PipeDefaults {
            diameter: m(0.1),
            roughness: m(1e-5),
            divisions: 2,
        })
        .unwrap();
        net.add_pipe("flowline").set_length(m(200.0)).unwrap();
        let NetworkElement::Pipe(tubing) = &net.elements()[0] else {
            panic!("tubing should be a pipe");
        };
        let NetworkElement::Pipe(flowline) = &net.elements()[1] else {
            panic!("flowline should be a pipe");
        };
        assert_eq!(tubing.geometry().unwrap().diameter, m(0.1));
        assert_eq!(tubing.divisions(), 5);
        assert_eq!(flowline.divisions(), 2);
    }

    #[test]
    fn empty_network_cannot_be_solved() {
        let mut net: Network = Network::new("empty", oil());
        let state = FlowState::new(bar(100.0), degc(50.0), m3pd(100.0));
        assert!(matches!(
            net.solve_in_flow(&state),
            Err(FlowError::MissingPrecondition { .. })
        ));
    }

    #[test]
    fn lift_pressure_grows_with_rate() {
        let mut net = well();
        let low = to_bar(net.vlp(m3pd(200.0)).unwrap());
        let high = to_bar(net.vlp(m3pd(2000.0)).unwrap());
        assert!(low > 20.0 + 50.0);
        assert!(high > low);
        assert!(net.converged());
    }

    #[test]
    fn booster_lowers_required_sandface_pressure() {
        let mut plain = well();
        let mut boosted = Network::new("boosted", oil());
        boosted
            .add_pipe("lower tubing")
            .set_length(m(500.0))
            .unwrap()
            .set_elevations(m(-1000.0), m(-500.0))
            .unwrap();
        boosted.add_booster("esp", bar(30.0), 0.6).unwrap();
        boosted
            .add_pipe("upper tubing")
            .set_length(m(500.0))
            .unwrap()
            .set_elevations(m(-500.0), m(0.0))
            .unwrap();
        boosted.set_wellhead(bar(20.0), degc(50.0));

        let q = m3pd(800.0);
        let p_plain = to_bar(plain.vlp(q).unwrap());
        let p_boosted = to_bar(boosted.vlp(q).unwrap());
        assert!((p_plain - p_boosted - 30.0).abs() < 3.0);
        assert!(boosted.booster_power().get::<watt>() > 0.0);
        assert_eq!(plain.booster_power().get::<watt>(), 0.0);
        // one value per segment, one per booster
        assert_eq!(boosted.profile(FlowQuantity::PressureIn).len(), 3);
    }

    #[test]
    fn operating_point_needs_inflow_and_wellhead() {
        let mut net = well();
        assert!(matches!(
            net.solve_operating_point(None),
            Err(FlowError::MissingPrecondition {
                what: "inflow relation"
            })
        ));
        net.set_outlet(PortConditions::default());
        let mut ipr = LinearIpr::new(10.0, bar(300.0)).unwrap();
        assert!(matches!(
            net.solve_operating_point_with(&mut ipr, None),
            Err(FlowError::MissingPrecondition {
                what: "wellhead pressure"
            })
        ));
    }

    #[test]
    fn fluid_is_cloned_into_every_element() {
        let mut net = well();
        net.add_booster("esp", bar(10.0), 0.5).unwrap();
        let watered = oil().with_water_fraction(0.3).unwrap();
        net.set_fluid(watered.clone());
        for el in net.elements() {
            match el {
                NetworkElement::Pipe(p) => assert_eq!(p.fluid(), &watered),
                NetworkElement::Booster(b) => assert_eq!(b.fluid(), &watered),
            }
        }
    }
}
