//! Fluid property model trait.

use crate::error::FluidResult;
use wf_core::units::{Density, DynVisc, Pressure, Temperature};

/// Properties of the flowing liquid at one (p, T) point.
#[derive(Clone, Debug, PartialEq)]
pub struct FluidProperties {
    pub pressure: Pressure,
    pub temperature: Temperature,

    /// Mixture density
    pub density: Density,

    /// Mixture dynamic viscosity
    pub viscosity: DynVisc,

    /// Mixture formation volume factor [rm³/sm³]
    pub fvf: f64,

    /// Solution gas/oil ratio [sm³/sm³]
    pub solubility: f64,

    pub bubble_point: Pressure,
}

/// Pure property evaluation at given conditions.
///
/// `properties` must not mutate the model; owners hold their own clone and
/// evaluate against it.
pub trait FluidModel: Clone + Send + Sync + std::fmt::Debug {
    /// Model name (for logging).
    fn name(&self) -> &str;

    fn properties(&self, p: Pressure, t: Temperature) -> FluidResult<FluidProperties>;
}
