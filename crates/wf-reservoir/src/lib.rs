//! Two-phase (oil/water) 2-D finite-difference reservoir model.
//!
//! Units are oilfield-metric throughout: pressure in bar, permeability in mD,
//! viscosity in cP, lengths in m, rates in m³/d, time in days.
//!
//! - `relperm`: Corey relative permeability and saturation endpoints
//! - `grid`: structured grid, cell indexing and transmissibility geometry
//! - `well`: Peaceman well index, producer and injector definitions
//! - `simulator`: implicit pressure/saturation Picard stepper and history queries

pub mod error;
pub mod grid;
pub mod relperm;
pub mod simulator;
pub mod well;

pub use error::{ReservoirError, ReservoirResult};
pub use grid::{Cell, ReservoirGrid};
pub use relperm::{Corey, RelativePermeability, Saturations};
pub use simulator::{
    PhaseProperties, PicardConfig, ReservoirConfig, ReservoirSimulator, SimulationState,
    StepOutcome, WellRates,
};
pub use well::{Injector, Producer, UNIT_CONV, peaceman_well_index};
