//! wf-sim: coupled reservoir / production network simulation for wellflow.
//!
//! Provides:
//! - `CouplingLoop`: per-timestep operating-point search, reservoir step,
//!   acceptance test and adaptive timestep control
//! - `AcceptanceCriterion` with the `ChangeLimits` default
//! - Optional water injection line solved after every accepted step
//! - Cooperative cancellation and progress reporting between steps
//! - Plain-text tabular export of the run records

pub mod acceptance;
pub mod coupling;
pub mod error;
pub mod record;
pub mod report;
pub mod setup;

pub use acceptance::{AcceptanceCriterion, ChangeLimits};
pub use coupling::{CouplingLoop, CouplingOptions, InflowMode};
pub use error::{SimError, SimResult};
pub use record::{CouplingProgress, CouplingRecord, RunStatus};
pub use report::write_table;
pub use setup::phase_properties;
