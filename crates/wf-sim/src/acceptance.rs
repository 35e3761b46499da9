//! Timestep acceptance tests.
//!
//! A criterion sees the last accepted reservoir state and the trial outcome
//! of one step. Rejecting it makes the coupling loop cut the timestep and
//! redo the whole step, operating point included.

use wf_reservoir::{SimulationState, StepOutcome};

pub trait AcceptanceCriterion {
    fn accept(&self, previous: &SimulationState, outcome: &StepOutcome) -> bool;
}

impl<F> AcceptanceCriterion for F
where
    F: Fn(&SimulationState, &StepOutcome) -> bool,
{
    fn accept(&self, previous: &SimulationState, outcome: &StepOutcome) -> bool {
        self(previous, outcome)
    }
}

/// Bounds on the per-step change of the grid unknowns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChangeLimits {
    /// Largest water saturation change in any cell
    pub max_dsw: f64,
    /// Largest pressure change in any cell [bar]
    pub max_dp: f64,
    /// Reject steps whose Picard iteration hit its cap
    pub require_converged: bool,
}

impl Default for ChangeLimits {
    fn default() -> Self {
        Self {
            max_dsw: 0.1,
            max_dp: f64::INFINITY,
            require_converged: true,
        }
    }
}

impl AcceptanceCriterion for ChangeLimits {
    fn accept(&self, previous: &SimulationState, outcome: &StepOutcome) -> bool {
        if self.require_converged && !outcome.converged {
            return false;
        }
        let dsw = outcome.state.max_saturation_change(previous);
        let dp = outcome.state.max_pressure_change(previous);
        dsw.is_finite() && dp.is_finite() && dsw <= self.max_dsw && dp <= self.max_dp
    }
}
