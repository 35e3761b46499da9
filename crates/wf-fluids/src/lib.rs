//! wf-fluids: black-oil fluid properties for wellflow.
//!
//! Provides:
//! - Standing black-oil correlations (solubility, bubble point, formation volume
//!   factor, viscosity, gas compressibility factor)
//! - `BlackOilFluid`, a stateful property evaluator with explicit compute/query
//!   ordering
//! - `FluidModel` trait for pure (p, T) → property pack evaluation
//!
//! # Value semantics
//!
//! `BlackOilFluid` is a plain value. Every owner (reservoir, pipe segment,
//! flow element, booster) keeps its own clone, so setting conditions on one
//! instance is never visible through another.
//!
//! # Example
//!
//! ```
//! use wf_core::units::{bar, degc};
//! use wf_fluids::{BlackOilFluid, FluidModel};
//!
//! let fluid = BlackOilFluid::new(30.0, 0.7, 100.0).unwrap();
//! let props = fluid.properties(bar(150.0), degc(60.0)).unwrap();
//! assert!(props.density.value > 500.0);
//! ```

pub mod black_oil;
pub mod correlations;
pub mod error;
pub mod model;

pub use black_oil::BlackOilFluid;
pub use error::{FluidError, FluidResult};
pub use model::{FluidModel, FluidProperties};
