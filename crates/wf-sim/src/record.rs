//! Per-step results and run progress.

/// Results of one accepted coupled step. Pressures in bar, rates in sm³/d,
/// time in days.
#[derive(Clone, Debug, PartialEq)]
pub struct CouplingRecord {
    /// Simulated time at the end of the step
    pub time: f64,
    /// Accepted timestep
    pub dt: f64,
    /// Producer bottom-hole pressure
    pub pwf: f64,
    /// Oil production rate
    pub qo: f64,
    /// Water production rate
    pub qw: f64,
    /// Water injection rate
    pub qwi: f64,
    pub water_cut: f64,
    pub injector_bhp: Option<f64>,
    /// Producer wellhead pressure
    pub wellhead_pressure: Option<f64>,
    /// Injection wellhead pressure, when an injection line is modeled
    pub injection_wellhead_pressure: Option<f64>,
    /// Total hydraulic power of the production boosters [MW]
    pub booster_power: f64,
    pub picard_converged: bool,
    pub picard_iterations: usize,
    pub operating_point_converged: bool,
    /// Timestep cuts taken before this step was accepted
    pub cutbacks: usize,
}

#[derive(Clone, Debug, Default)]
pub struct CouplingProgress {
    pub time: f64,
    pub t_end: f64,
    pub fraction_complete: f64,
    pub step: usize,
    pub dt: f64,
    /// Cuts taken on the step just accepted
    pub cutbacks: usize,
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Simulated time reached `t_end`
    Completed,
    /// The cancellation flag was raised between steps
    Cancelled,
    /// `max_steps` accepted steps were taken before `t_end`
    StepLimit,
}
