//! Port boundary conditions.

use crate::error::{FlowError, FlowResult};
use wf_core::units::{Pressure, Temperature, VolumeRate};

/// One boundary quantity: either given or produced by a solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Boundary<T> {
    Known(T),
    ToBeComputed,
}

impl<T> Default for Boundary<T> {
    fn default() -> Self {
        Boundary::ToBeComputed
    }
}

impl<T: Copy> Boundary<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            Boundary::Known(v) => Some(*v),
            Boundary::ToBeComputed => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Boundary::Known(_))
    }

    /// The known value, or `MissingPrecondition` naming the quantity.
    pub fn require(&self, what: &'static str) -> FlowResult<T> {
        self.known().ok_or(FlowError::MissingPrecondition { what })
    }
}

/// Fully specified state at a port. `rate` is the in-situ volumetric rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowState {
    pub pressure: Pressure,
    pub temperature: Temperature,
    pub rate: VolumeRate,
}

impl FlowState {
    pub fn new(pressure: Pressure, temperature: Temperature, rate: VolumeRate) -> Self {
        Self {
            pressure,
            temperature,
            rate,
        }
    }
}

/// Per-quantity boundary conditions of one port.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PortConditions {
    pub pressure: Boundary<Pressure>,
    pub temperature: Boundary<Temperature>,
    pub rate: Boundary<VolumeRate>,
}

impl PortConditions {
    /// All three quantities known.
    pub fn known(state: FlowState) -> Self {
        Self {
            pressure: Boundary::Known(state.pressure),
            temperature: Boundary::Known(state.temperature),
            rate: Boundary::Known(state.rate),
        }
    }

    /// Pressure and temperature known, rate left open (a wellhead).
    pub fn fixed(pressure: Pressure, temperature: Temperature) -> Self {
        Self {
            pressure: Boundary::Known(pressure),
            temperature: Boundary::Known(temperature),
            rate: Boundary::ToBeComputed,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pressure.is_known() && self.temperature.is_known() && self.rate.is_known()
    }

    pub fn resolve(&self) -> FlowResult<FlowState> {
        Ok(FlowState {
            pressure: self.pressure.require("port pressure")?,
            temperature: self.temperature.require("port temperature")?,
            rate: self.rate.require("port rate")?,
        })
    }
}
