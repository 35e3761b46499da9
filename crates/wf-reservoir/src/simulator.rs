//! Implicit pressure / implicit saturation reservoir stepper.
//!
//! Each timestep runs a bounded Picard iteration. Every inner iteration
//! assembles a dense `2N × 2N` system (oil equation in row 2·c, water equation
//! in row 2·c + 1) from two-point fluxes with upstream-weighted relative
//! permeability, a pore-volume accumulation term against the previous accepted
//! saturation, and the producer's well equation, then solves it by LU.

use crate::error::{ReservoirError, ReservoirResult, check_positive};
use crate::grid::ReservoirGrid;
use crate::relperm::{Corey, RelativePermeability};
use crate::well::{Injector, Producer, UNIT_CONV, peaceman_well_index};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};
use wf_solver::solve_dense;

/// Phase formation volume factors [rm³/sm³] and viscosities [cP].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseProperties {
    pub bo: f64,
    pub bw: f64,
    pub uo: f64,
    pub uw: f64,
}

impl Default for PhaseProperties {
    fn default() -> Self {
        Self {
            bo: 1.2,
            bw: 1.0,
            uo: 2.0,
            uw: 1.0,
        }
    }
}

/// Inner fixed-point iteration controls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PicardConfig {
    pub max_iterations: usize,
    /// Converged when ‖x_k − x_{k−1}‖₂ drops below this
    pub tolerance: f64,
}

impl Default for PicardConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReservoirConfig {
    /// Initial reservoir pressure [bar]
    pub initial_pressure: f64,
    pub phases: PhaseProperties,
    pub producer: Producer,
    pub injector: Option<Injector>,
    pub picard: PicardConfig,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            initial_pressure: 300.0,
            phases: PhaseProperties::default(),
            producer: Producer::default(),
            injector: None,
            picard: PicardConfig::default(),
        }
    }
}

/// Snapshot of the grid unknowns at one time.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    /// Simulated time [d]
    pub time: f64,
    /// Step length that produced this state [d]
    pub dt: f64,
    /// Producer bottom-hole pressure used for the step [bar]
    pub pwf: f64,
    /// Interleaved (pressure, saturation) per cell
    pub unknowns: DVector<f64>,
}

impl SimulationState {
    pub fn n_cells(&self) -> usize {
        self.unknowns.len() / 2
    }

    pub fn pressure(&self, cell: usize) -> f64 {
        self.unknowns[2 * cell]
    }

    pub fn saturation(&self, cell: usize) -> f64 {
        self.unknowns[2 * cell + 1]
    }

    /// Largest per-cell pressure change against `other` [bar].
    pub fn max_pressure_change(&self, other: &SimulationState) -> f64 {
        (0..self.n_cells())
            .map(|c| (self.pressure(c) - other.pressure(c)).abs())
            .fold(0.0, f64::max)
    }

    /// Largest per-cell saturation change against `other`.
    pub fn max_saturation_change(&self, other: &SimulationState) -> f64 {
        (0..self.n_cells())
            .map(|c| (self.saturation(c) - other.saturation(c)).abs())
            .fold(0.0, f64::max)
    }
}

/// Result of one timestep attempt. Not yet part of the history.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub state: SimulationState,
    pub iterations: usize,
    pub converged: bool,
    /// Norm of the last Picard update
    pub change_norm: f64,
}

/// Producer surface rates [sm³/d].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WellRates {
    pub oil: f64,
    pub water: f64,
}

impl WellRates {
    pub fn liquid(&self) -> f64 {
        self.oil + self.water
    }

    /// Water fraction of the liquid rate; 0 when nothing flows.
    pub fn water_cut(&self) -> f64 {
        let q = self.liquid();
        if q.abs() > 0.0 { self.water / q } else { 0.0 }
    }
}

/// Oil/water reservoir with one producer at the last cell and an optional
/// water injector at the first cell.
#[derive(Clone, Debug)]
pub struct ReservoirSimulator<R: RelativePermeability = Corey> {
    grid: ReservoirGrid,
    relperm: R,
    config: ReservoirConfig,
    well_index: f64,
    injector_well_index: Option<f64>,
    history: Vec<SimulationState>,
}

impl<R: RelativePermeability> ReservoirSimulator<R> {
    /// Validate inputs, compute well indices and record the initial state at
    /// t = 0 (initial pressure, connate water saturation).
    pub fn new(grid: ReservoirGrid, relperm: R, config: ReservoirConfig) -> ReservoirResult<Self> {
        check_positive(config.initial_pressure, "initial reservoir pressure")?;
        check_positive(config.phases.bo, "oil formation volume factor")?;
        check_positive(config.phases.bw, "water formation volume factor")?;
        check_positive(config.phases.uo, "oil viscosity")?;
        check_positive(config.phases.uw, "water viscosity")?;
        check_positive(config.picard.tolerance, "Picard tolerance")?;
        if config.picard.max_iterations == 0 {
            return Err(ReservoirError::InvalidParameter {
                what: "Picard iteration cap",
                value: 0.0,
            });
        }

        let last = grid.len() - 1;
        let well_index = peaceman_well_index(
            grid.dx(),
            grid.dy(),
            grid.cell(last).permeability,
            grid.thickness(),
            config.producer.rw,
            config.producer.skin,
        )?;
        let injector_well_index = match &config.injector {
            Some(inj) => {
                if !inj.rate.is_finite() || inj.rate < 0.0 {
                    return Err(ReservoirError::InvalidParameter {
                        what: "water injection rate",
                        value: inj.rate,
                    });
                }
                Some(peaceman_well_index(
                    grid.dx(),
                    grid.dy(),
                    grid.cell(0).permeability,
                    grid.thickness(),
                    inj.rw,
                    inj.skin,
                )?)
            }
            None => None,
        };

        let swc = relperm.saturations().swc;
        let mut unknowns = DVector::zeros(2 * grid.len());
        for c in 0..grid.len() {
            unknowns[2 * c] = config.initial_pressure;
            unknowns[2 * c + 1] = swc;
        }
        let initial = SimulationState {
            time: 0.0,
            dt: 0.0,
            pwf: config.initial_pressure,
            unknowns,
        };

        Ok(Self {
            grid,
            relperm,
            config,
            well_index,
            injector_well_index,
            history: vec![initial],
        })
    }

    pub fn grid(&self) -> &ReservoirGrid {
        &self.grid
    }

    pub fn relperm(&self) -> &R {
        &self.relperm
    }

    pub fn config(&self) -> &ReservoirConfig {
        &self.config
    }

    pub fn well_index(&self) -> f64 {
        self.well_index
    }

    pub fn injector_well_index(&self) -> Option<f64> {
        self.injector_well_index
    }

    /// Linear index of the producer cell.
    pub fn well_cell(&self) -> usize {
        self.grid.len() - 1
    }

    /// Water injection rate [m³/d], zero without an injector.
    pub fn injection_rate(&self) -> f64 {
        self.config.injector.map_or(0.0, |inj| inj.rate)
    }

    pub fn history(&self) -> &[SimulationState] {
        &self.history
    }

    /// Last accepted state.
    pub fn current(&self) -> &SimulationState {
        // history always holds the initial state
        &self.history[self.history.len() - 1]
    }

    pub fn time(&self) -> f64 {
        self.current().time
    }

    fn oil_mobility(&self, sw: f64) -> f64 {
        let ph = &self.config.phases;
        self.relperm.kro(sw) / (ph.bo * ph.uo)
    }

    fn water_mobility(&self, sw: f64) -> f64 {
        let ph = &self.config.phases;
        self.relperm.krw(sw) / (ph.bw * ph.uw)
    }

    /// Assemble the coefficient matrix and right-hand side around `iterate`.
    fn assemble(
        &self,
        iterate: &DVector<f64>,
        previous: &DVector<f64>,
        dt: f64,
        pwf: f64,
    ) -> (DMatrix<f64>, DVector<f64>) {
        let n = self.grid.len();
        let ph = &self.config.phases;
        let mut k = DMatrix::zeros(2 * n, 2 * n);
        let mut f = DVector::zeros(2 * n);

        for c in 0..n {
            let (o, w) = (2 * c, 2 * c + 1);
            for nb in self.grid.neighbors(c) {
                // upstream cell: higher pressure in the current iterate
                let up = if iterate[2 * nb] > iterate[2 * c] { nb } else { c };
                let sw_up = iterate[2 * up + 1];
                let tr = UNIT_CONV * self.grid.transmissibility(c, nb);
                let tro = tr * self.oil_mobility(sw_up);
                let trw = tr * self.water_mobility(sw_up);
                k[(o, o)] -= tro;
                k[(w, o)] -= trw;
                k[(o, 2 * nb)] += tro;
                k[(w, 2 * nb)] += trw;
            }

            let vp_dt = self.grid.pore_volume(c) / dt;
            k[(o, w)] = vp_dt / ph.bo;
            k[(w, w)] = -vp_dt / ph.bw;
            f[o] = vp_dt / ph.bo * previous[w];
            f[w] = -vp_dt / ph.bw * previous[w];
        }

        if let Some(inj) = &self.config.injector {
            f[1] -= inj.rate;
        }

        let wc = self.well_cell();
        let sw_well = iterate[2 * wc + 1];
        let lo = self.well_index * self.oil_mobility(sw_well);
        let lw = self.well_index * self.water_mobility(sw_well);
        k[(2 * wc, 2 * wc)] -= lo;
        k[(2 * wc + 1, 2 * wc)] -= lw;
        f[2 * wc] -= lo * pwf;
        f[2 * wc + 1] -= lw * pwf;

        (k, f)
    }

    /// Advance from the last accepted state by `dt` [d] with the producer at
    /// bottom-hole pressure `pwf` [bar].
    ///
    /// The simulator is not modified; pass the outcome's state to
    /// [`accept`](Self::accept) once the caller's acceptance test passes.
    /// Exhausting the Picard cap is not an error: the last iterate is returned
    /// with `converged = false`.
    pub fn step(&self, dt: f64, pwf: f64) -> ReservoirResult<StepOutcome> {
        check_positive(dt, "timestep")?;
        check_positive(pwf, "bottom-hole pressure")?;

        let previous = &self.current().unknowns;
        let mut x = previous.clone();
        let mut change_norm = f64::INFINITY;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.picard.max_iterations {
            iterations += 1;
            let (k, f) = self.assemble(&x, previous, dt, pwf);
            let next = solve_dense(k, &f)?;
            change_norm = (&next - &x).norm();
            x = next;
            debug!(iteration = iterations, change_norm, "Picard iteration");
            if change_norm < self.config.picard.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                iterations,
                change_norm,
                dt,
                pwf,
                "reservoir Picard iteration did not converge; accepting last iterate"
            );
        }

        Ok(StepOutcome {
            state: SimulationState {
                time: self.time() + dt,
                dt,
                pwf,
                unknowns: x,
            },
            iterations,
            converged,
            change_norm,
        })
    }

    /// Append an accepted state to the history.
    pub fn accept(&mut self, state: SimulationState) -> ReservoirResult<()> {
        if state.unknowns.len() != 2 * self.grid.len() {
            return Err(ReservoirError::History {
                what: "state size does not match the grid",
            });
        }
        if state.time <= self.time() {
            return Err(ReservoirError::History {
                what: "accepted state must advance time",
            });
        }
        self.history.push(state);
        Ok(())
    }

    /// Producer rates for a state at its own bottom-hole pressure.
    pub fn well_rates(&self, state: &SimulationState) -> WellRates {
        self.well_rates_at(state, state.pwf)
    }

    /// Producer rates for a state at an arbitrary bottom-hole pressure:
    /// q = WI·kr(sw)/(B·μ)·(p − pwf), evaluated at the well cell.
    pub fn well_rates_at(&self, state: &SimulationState, pwf: f64) -> WellRates {
        let ph = &self.config.phases;
        let wc = self.well_cell();
        let p = state.pressure(wc);
        let sw = state.saturation(wc);
        WellRates {
            oil: self.well_index * self.relperm.kro(sw) / (ph.bo * ph.uo) * (p - pwf),
            water: self.well_index * self.relperm.krw(sw) / (ph.bw * ph.uw) * (p - pwf),
        }
    }

    /// Linearized producer inflow around a state: (liquid productivity index
    /// [m³/d/bar], well-cell pressure [bar]).
    pub fn linearized_inflow(&self, state: &SimulationState) -> (f64, f64) {
        let wc = self.well_cell();
        let sw = state.saturation(wc);
        let pi = self.well_index * (self.oil_mobility(sw) + self.water_mobility(sw));
        (pi, state.pressure(wc))
    }

    /// Injector bottom-hole pressure [bar] implied by the injection rate and
    /// the total mobility of the injector cell.
    pub fn injector_bhp(&self, state: &SimulationState) -> Option<f64> {
        let inj = self.config.injector?;
        let wi = self.injector_well_index?;
        let sw = state.saturation(0);
        let mobility = self.oil_mobility(sw) + self.water_mobility(sw);
        Some(state.pressure(0) + inj.rate / (wi * mobility))
    }

    pub fn times(&self) -> Vec<f64> {
        self.history.iter().map(|s| s.time).collect()
    }

    /// Producer rates for every accepted state.
    pub fn well_rate_history(&self) -> Vec<WellRates> {
        self.history.iter().map(|s| self.well_rates(s)).collect()
    }

    pub fn pressure_history(&self, i: usize, j: usize) -> ReservoirResult<Vec<f64>> {
        let c = self.grid.index(i, j)?;
        Ok(self.history.iter().map(|s| s.pressure(c)).collect())
    }

    pub fn saturation_history(&self, i: usize, j: usize) -> ReservoirResult<Vec<f64>> {
        let c = self.grid.index(i, j)?;
        Ok(self.history.iter().map(|s| s.saturation(c)).collect())
    }

    fn state_at(&self, k: usize) -> ReservoirResult<&SimulationState> {
        self.history.get(k).ok_or(ReservoirError::IndexOob {
            what: "history step",
            index: k,
            len: self.history.len(),
        })
    }

    /// `ni × nj` pressure map of history entry `k`.
    pub fn pressure_map(&self, k: usize) -> ReservoirResult<DMatrix<f64>> {
        let state = self.state_at(k)?;
        Ok(DMatrix::from_fn(self.grid.ni(), self.grid.nj(), |i, j| {
            state.pressure(i + j * self.grid.ni())
        }))
    }

    /// `ni × nj` water saturation map of history entry `k`.
    pub fn saturation_map(&self, k: usize) -> ReservoirResult<DMatrix<f64>> {
        let state = self.state_at(k)?;
        Ok(DMatrix::from_fn(self.grid.ni(), self.grid.nj(), |i, j| {
            state.saturation(i + j * self.grid.ni())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_cell(injector: Option<Injector>) -> ReservoirSimulator {
        let grid = ReservoirGrid::uniform(1, 1, 200.0, 200.0, 10.0, 0.2, 150.0).unwrap();
        let config = ReservoirConfig {
            initial_pressure: 250.0,
            injector,
            ..ReservoirConfig::default()
        };
        ReservoirSimulator::new(grid, Corey::default(), config).unwrap()
    }

    #[test]
    fn picard_cap_returns_last_iterate() {
        let grid = ReservoirGrid::uniform(3, 3, 300.0, 300.0, 10.0, 0.2, 200.0).unwrap();
        let config = ReservoirConfig {
            injector: Some(Injector {
                rw: 0.1,
                skin: 0.0,
                rate: 200.0,
            }),
            picard: PicardConfig {
                max_iterations: 1,
                tolerance: 1e-12,
            },
            ..ReservoirConfig::default()
        };
        let sim = ReservoirSimulator::new(grid, Corey::default(), config).unwrap();
        let outcome = sim.step(5.0, 250.0).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.change_norm.is_finite() && outcome.change_norm > 1e-12);
        assert_eq!(outcome.state.unknowns.len(), 18);
        assert!(outcome.state.unknowns.iter().all(|v| v.is_finite()));
        assert_eq!(outcome.state.time, 5.0);
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn initial_state_is_recorded() {
        let sim = single_cell(None);
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.current().pressure(0), 250.0);
        assert_eq!(sim.current().saturation(0), 0.2);
        let expected =
            peaceman_well_index(200.0, 200.0, 150.0, 10.0, 0.1, 0.0).unwrap();
        assert_eq!(sim.well_index(), expected);
    }

    #[test]
    fn well_rate_formula() {
        let sim = single_cell(None);
        let state = SimulationState {
            time: 1.0,
            dt: 1.0,
            pwf: 120.0,
            unknowns: DVector::from_vec(vec![250.0, 0.35]),
        };
        let ph = PhaseProperties::default();
        let corey = Corey::default();
        let rates = sim.well_rates(&state);
        let expected_oil =
            sim.well_index() * corey.kro(0.35) / (ph.bo * ph.uo) * (250.0 - 120.0);
        let expected_water =
            sim.well_index() * corey.krw(0.35) / (ph.bw * ph.uw) * (250.0 - 120.0);
        assert_eq!(rates.oil, expected_oil);
        assert_eq!(rates.water, expected_water);
        assert!(rates.water_cut() > 0.0 && rates.water_cut() < 1.0);
    }

    #[test]
    fn closed_cell_relaxes_to_well_pressure() {
        // Incompressible and water immobile at connate saturation: the cell
        // cannot deliver fluid, so its pressure equals pwf after one step.
        let sim = single_cell(None);
        let outcome = sim.step(1.0, 100.0).unwrap();
        assert!(outcome.converged);
        assert!((outcome.state.pressure(0) - 100.0).abs() < 1e-9);
        assert!((outcome.state.saturation(0) - 0.2).abs() < 1e-12);
        assert_eq!(sim.history().len(), 1, "step must not touch history");
    }

    #[test]
    fn injected_water_raises_saturation() {
        let sim = single_cell(Some(Injector {
            rw: 0.1,
            skin: 0.0,
            rate: 100.0,
        }));
        let outcome = sim.step(1.0, 150.0).unwrap();
        let sw = outcome.state.saturation(0);
        assert!(sw > 0.2);
        assert!(outcome.state.pressure(0) > 150.0);
        let rates = sim.well_rates(&outcome.state);
        assert!(rates.liquid() > 0.0);
    }

    #[test]
    fn accept_requires_advancing_time() {
        let mut sim = single_cell(None);
        let outcome = sim.step(2.0, 100.0).unwrap();
        let state = outcome.state.clone();
        sim.accept(outcome.state).unwrap();
        assert_eq!(sim.time(), 2.0);
        assert!(matches!(
            sim.accept(state),
            Err(ReservoirError::History { .. })
        ));
    }

    #[test]
    fn step_validates_inputs() {
        let sim = single_cell(None);
        assert!(sim.step(0.0, 100.0).is_err());
        assert!(sim.step(1.0, -5.0).is_err());
        assert!(sim.step(f64::NAN, 100.0).is_err());
    }

    #[test]
    fn maps_and_histories() {
        let grid = ReservoirGrid::uniform(3, 2, 300.0, 200.0, 10.0, 0.2, 100.0).unwrap();
        let mut sim = ReservoirSimulator::new(grid, Corey::default(), ReservoirConfig::default())
            .unwrap();
        let outcome = sim.step(1.0, 200.0).unwrap();
        sim.accept(outcome.state).unwrap();

        let map = sim.pressure_map(1).unwrap();
        assert_eq!(map.shape(), (3, 2));
        assert_eq!(map[(2, 1)], sim.current().pressure(5));
        assert_eq!(sim.saturation_map(0).unwrap()[(1, 1)], 0.2);
        assert!(sim.pressure_map(2).is_err());
        assert_eq!(sim.pressure_history(2, 1).unwrap().len(), 2);
        let sw = sim.saturation_history(0, 0).unwrap();
        assert_eq!(sw.len(), 2);
        assert!(sw.iter().all(|s| (s - 0.2).abs() < 1e-12));
        assert_eq!(sim.times(), vec![0.0, 1.0]);
        assert_eq!(sim.well_rate_history().len(), 2);
        assert!(sim.pressure_history(3, 0).is_err());
    }
}
