//! Reservoir / network coupling loop.
//!
//! Every timestep resolves the producer's operating point against the
//! network, advances the reservoir with the resulting bottom-hole pressure
//! and tests the outcome. A rejected step is cut and redone from the
//! operating-point search on, since the reservoir inflow depends on dt.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};
use uom::si::power::megawatt;
use wf_core::units::{Pressure, Temperature, VolumeRate, bar, m3pd, to_bar};
use wf_flow::{FlowError, FlowResult, FlowState, Flowable, InflowRelation, LinearIpr, Network};
use wf_fluids::{BlackOilFluid, FluidModel};
use wf_reservoir::{
    Corey, RelativePermeability, ReservoirError, ReservoirSimulator, StepOutcome,
};

use crate::acceptance::{AcceptanceCriterion, ChangeLimits};
use crate::error::{SimError, SimResult};
use crate::record::{CouplingProgress, CouplingRecord, RunStatus};

/// Remaining time below which a run counts as complete [d].
const TIME_EPS: f64 = 1e-9;

/// How the producer inflow is represented during the operating-point search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InflowMode {
    /// Every trial bottom-hole pressure runs a trial reservoir step at the
    /// current dt.
    #[default]
    Implicit,
    /// Straight-line inflow from the well-cell mobility and pressure of the
    /// last accepted state.
    Linearized,
}

/// Timestep control for a coupled run. Times in days.
#[derive(Clone, Debug)]
pub struct CouplingOptions {
    /// Initial timestep
    pub dt: f64,
    pub min_dt: f64,
    pub max_dt: f64,
    /// Applied to dt after every accepted step
    pub grow_factor: f64,
    /// Applied to dt after every rejected step
    pub cutback_factor: f64,
    pub t_end: f64,
    /// Maximum number of accepted steps (safety limit)
    pub max_steps: usize,
    pub inflow: InflowMode,
}

impl Default for CouplingOptions {
    fn default() -> Self {
        Self {
            dt: 1.0,
            min_dt: 0.01,
            max_dt: 30.0,
            grow_factor: 1.2,
            cutback_factor: 0.5,
            t_end: 365.0,
            max_steps: 100_000,
            inflow: InflowMode::default(),
        }
    }
}

impl CouplingOptions {
    pub fn validate(&self) -> SimResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.min_dt) {
            return Err(SimError::InvalidArg {
                what: "min_dt must be positive",
            });
        }
        if !positive(self.max_dt) || self.max_dt < self.min_dt {
            return Err(SimError::InvalidArg {
                what: "max_dt must be at least min_dt",
            });
        }
        if !positive(self.dt) || self.dt < self.min_dt || self.dt > self.max_dt {
            return Err(SimError::InvalidArg {
                what: "dt must lie within [min_dt, max_dt]",
            });
        }
        if !self.grow_factor.is_finite() || self.grow_factor < 1.0 {
            return Err(SimError::InvalidArg {
                what: "grow_factor must be at least 1",
            });
        }
        if !positive(self.cutback_factor) || self.cutback_factor >= 1.0 {
            return Err(SimError::InvalidArg {
                what: "cutback_factor must lie in (0, 1)",
            });
        }
        if !positive(self.t_end) {
            return Err(SimError::InvalidArg {
                what: "t_end must be positive",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        Ok(())
    }
}

/// Inflow evaluated by trial reservoir steps. Outcomes are kept so the
/// selected operating point does not need another step.
struct TrialInflow<'a, R: RelativePermeability> {
    reservoir: &'a ReservoirSimulator<R>,
    dt: f64,
    upper: Pressure,
    trials: Vec<StepOutcome>,
    failure: Option<ReservoirError>,
}

impl<'a, R: RelativePermeability> TrialInflow<'a, R> {
    fn new(reservoir: &'a ReservoirSimulator<R>, dt: f64) -> Self {
        let state = reservoir.current();
        let cells = (0..state.n_cells())
            .map(|c| state.pressure(c))
            .fold(f64::NEG_INFINITY, f64::max);
        let upper = reservoir.injector_bhp(state).map_or(cells, |p| p.max(cells));
        Self {
            reservoir,
            dt,
            upper: bar(upper),
            trials: Vec::new(),
            failure: None,
        }
    }

    fn take_outcome(&mut self, pwf: f64) -> Option<StepOutcome> {
        let pos = self.trials.iter().rposition(|o| o.state.pwf == pwf)?;
        Some(self.trials.swap_remove(pos))
    }
}

impl<R: RelativePermeability> InflowRelation for TrialInflow<'_, R> {
    fn rate(&mut self, pwf: Pressure) -> FlowResult<VolumeRate> {
        match self.reservoir.step(self.dt, to_bar(pwf)) {
            Ok(outcome) => {
                let q = self.reservoir.well_rates(&outcome.state).liquid();
                self.trials.push(outcome);
                Ok(m3pd(q))
            }
            Err(err) => {
                let message = err.to_string();
                self.failure = Some(err);
                Err(FlowError::Inflow { message })
            }
        }
    }

    fn reservoir_pressure(&self) -> Pressure {
        self.upper
    }
}

/// One attempt at a timestep: the operating point and the trial reservoir
/// outcome it produces.
struct Attempt {
    pwf: Pressure,
    operating_point_converged: bool,
    outcome: StepOutcome,
}

/// Drives a reservoir and its production network through time.
pub struct CouplingLoop<R: RelativePermeability = Corey> {
    reservoir: ReservoirSimulator<R>,
    production: Network<BlackOilFluid>,
    injection: Option<Network<BlackOilFluid>>,
    reservoir_temperature: Temperature,
    options: CouplingOptions,
    criterion: Box<dyn AcceptanceCriterion>,
    dt: f64,
    last_pwf: Option<Pressure>,
    records: Vec<CouplingRecord>,
}

impl<R: RelativePermeability> CouplingLoop<R> {
    /// The production network carries fluid from the producer sandface
    /// (first element inlet) to the wellhead, whose pressure and temperature
    /// must be set. The acceptance test defaults to [`ChangeLimits`].
    pub fn new(
        reservoir: ReservoirSimulator<R>,
        production: Network<BlackOilFluid>,
        reservoir_temperature: Temperature,
        options: CouplingOptions,
    ) -> SimResult<Self> {
        options.validate()?;
        if !production.outlet_conditions().pressure.is_known()
            || !production.outlet_conditions().temperature.is_known()
        {
            return Err(SimError::InvalidArg {
                what: "production network needs wellhead pressure and temperature",
            });
        }
        if production.elements().is_empty() {
            return Err(SimError::InvalidArg {
                what: "production network has no elements",
            });
        }
        let dt = options.dt;
        Ok(Self {
            reservoir,
            production,
            injection: None,
            reservoir_temperature,
            options,
            criterion: Box::new(ChangeLimits::default()),
            dt,
            last_pwf: None,
            records: Vec::new(),
        })
    }

    /// Add a water injection line, running from the injection wellhead
    /// (inlet) down to the injector sandface (outlet). Its fluid is switched
    /// to water.
    pub fn with_injection(mut self, mut injection: Network<BlackOilFluid>) -> SimResult<Self> {
        if self.reservoir.config().injector.is_none() {
            return Err(SimError::InvalidArg {
                what: "injection line requires a reservoir injector",
            });
        }
        let mut water = injection.fluid().clone();
        water.set_water_fraction(1.0)?;
        injection.set_fluid(water);
        self.injection = Some(injection);
        Ok(self)
    }

    pub fn with_criterion(mut self, criterion: impl AcceptanceCriterion + 'static) -> Self {
        self.criterion = Box::new(criterion);
        self
    }

    pub fn reservoir(&self) -> &ReservoirSimulator<R> {
        &self.reservoir
    }

    pub fn production(&self) -> &Network<BlackOilFluid> {
        &self.production
    }

    pub fn injection(&self) -> Option<&Network<BlackOilFluid>> {
        self.injection.as_ref()
    }

    pub fn options(&self) -> &CouplingOptions {
        &self.options
    }

    pub fn records(&self) -> &[CouplingRecord] {
        &self.records
    }

    pub fn time(&self) -> f64 {
        self.reservoir.time()
    }

    /// Timestep the next step will try first.
    pub fn next_dt(&self) -> f64 {
        self.dt
    }

    pub fn is_finished(&self) -> bool {
        self.options.t_end - self.time() <= TIME_EPS
    }

    /// Run to `t_end`.
    pub fn run(&mut self) -> SimResult<RunStatus> {
        self.run_with(&AtomicBool::new(false), |_| {})
    }

    /// Run to `t_end`, checking `cancel` before every step and reporting
    /// progress after it.
    pub fn run_with(
        &mut self,
        cancel: &AtomicBool,
        mut progress: impl FnMut(&CouplingProgress),
    ) -> SimResult<RunStatus> {
        while !self.is_finished() {
            if cancel.load(Ordering::Relaxed) {
                info!(time = self.time(), "coupled run cancelled");
                return Ok(RunStatus::Cancelled);
            }
            if self.records.len() >= self.options.max_steps {
                warn!(
                    time = self.time(),
                    steps = self.records.len(),
                    "step limit reached before t_end"
                );
                return Ok(RunStatus::StepLimit);
            }
            let record = self.advance()?;
            let update = CouplingProgress {
                time: record.time,
                t_end: self.options.t_end,
                fraction_complete: (record.time / self.options.t_end).min(1.0),
                step: self.records.len(),
                dt: record.dt,
                cutbacks: record.cutbacks,
            };
            progress(&update);
        }
        Ok(RunStatus::Completed)
    }

    /// Take one accepted step and return its record.
    pub fn advance(&mut self) -> SimResult<CouplingRecord> {
        let remaining = self.options.t_end - self.time();
        if remaining <= TIME_EPS {
            return Err(SimError::InvalidArg {
                what: "simulation already reached t_end",
            });
        }
        self.update_water_fraction()?;

        let mut dt = self.dt.min(remaining);
        let mut cutbacks = 0;
        let attempt = loop {
            let attempt = self.attempt(dt)?;
            if self.criterion.accept(self.reservoir.current(), &attempt.outcome) {
                break attempt;
            }
            if dt <= self.options.min_dt {
                warn!(
                    time = self.time(),
                    dt, "step rejected at the minimum timestep; accepting it"
                );
                break attempt;
            }
            dt = (dt * self.options.cutback_factor).max(self.options.min_dt);
            cutbacks += 1;
            info!(time = self.time(), dt, "timestep cut");
        };

        let Attempt {
            pwf,
            operating_point_converged,
            outcome,
        } = attempt;
        let rates = self.reservoir.well_rates(&outcome.state);
        let injector_bhp = self.reservoir.injector_bhp(&outcome.state);
        let picard_converged = outcome.converged;
        let picard_iterations = outcome.iterations;
        self.reservoir.accept(outcome.state)?;
        self.last_pwf = Some(pwf);

        let injection_wellhead_pressure = injector_bhp.and_then(|bhp| self.solve_injection(bhp));
        let record = CouplingRecord {
            time: self.time(),
            dt,
            pwf: to_bar(pwf),
            qo: rates.oil,
            qw: rates.water,
            qwi: self.reservoir.injection_rate(),
            water_cut: rates.water_cut(),
            injector_bhp,
            wellhead_pressure: self.production.outlet().map(|s| to_bar(s.pressure)),
            injection_wellhead_pressure,
            booster_power: self.production.booster_power().get::<megawatt>(),
            picard_converged,
            picard_iterations,
            operating_point_converged,
            cutbacks,
        };
        info!(
            time = record.time,
            dt,
            pwf = record.pwf,
            qo = record.qo,
            qw = record.qw,
            cutbacks,
            "step accepted"
        );

        self.dt = (dt * self.options.grow_factor).min(self.options.max_dt);
        self.records.push(record.clone());
        Ok(record)
    }

    /// Operating-point search plus the matching trial reservoir step.
    fn attempt(&mut self, dt: f64) -> SimResult<Attempt> {
        match self.options.inflow {
            InflowMode::Implicit => {
                let mut inflow = TrialInflow::new(&self.reservoir, dt);
                let op = match self
                    .production
                    .solve_operating_point_with(&mut inflow, self.last_pwf)
                {
                    Ok(op) => op,
                    Err(err) => {
                        return Err(match inflow.failure.take() {
                            Some(reservoir) => reservoir.into(),
                            None => err.into(),
                        });
                    }
                };
                let outcome = match inflow.take_outcome(to_bar(op.pwf)) {
                    Some(outcome) => outcome,
                    None => self.reservoir.step(dt, to_bar(op.pwf))?,
                };
                Ok(Attempt {
                    pwf: op.pwf,
                    operating_point_converged: op.converged,
                    outcome,
                })
            }
            InflowMode::Linearized => {
                let (pi, pr) = self.reservoir.linearized_inflow(self.reservoir.current());
                let mut ipr = LinearIpr::new(pi, bar(pr))?;
                let op = self
                    .production
                    .solve_operating_point_with(&mut ipr, self.last_pwf)?;
                let outcome = self.reservoir.step(dt, to_bar(op.pwf))?;
                Ok(Attempt {
                    pwf: op.pwf,
                    operating_point_converged: op.converged,
                    outcome,
                })
            }
        }
    }

    /// Carry the last accepted water cut into the production fluid.
    fn update_water_fraction(&mut self) -> SimResult<()> {
        let wc = self.reservoir.well_rates(self.reservoir.current()).water_cut();
        let wc = wc.clamp(0.0, 1.0);
        if (self.production.fluid().water_fraction() - wc).abs() > f64::EPSILON {
            let mut fluid = self.production.fluid().clone();
            fluid.set_water_fraction(wc)?;
            self.production.set_fluid(fluid);
        }
        Ok(())
    }

    /// Injection wellhead pressure for the current injection rate delivered
    /// at `bhp` [bar]. Failures are logged and reported as `None`.
    fn solve_injection(&mut self, bhp: f64) -> Option<f64> {
        let t_res = self.reservoir_temperature;
        let qwi = self.reservoir.injection_rate();
        let network = self.injection.as_mut()?;
        let result = network
            .fluid()
            .properties(bar(bhp), t_res)
            .map_err(FlowError::from)
            .and_then(|props| {
                let sandface = FlowState::new(bar(bhp), t_res, m3pd(qwi) * props.fvf);
                network.solve_in_flow(&sandface)
            });
        match result {
            Ok(wellhead) => Some(to_bar(wellhead.pressure)),
            Err(err) => {
                warn!(bhp, error = %err, "injection line could not be solved");
                None
            }
        }
    }
}
