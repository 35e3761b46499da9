//! Quantity selector for per-segment profiles.

use std::fmt;

/// Solved quantity of a segment, reported in display units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowQuantity {
    /// bar
    PressureIn,
    PressureOut,
    PressureMean,
    /// °C
    TemperatureIn,
    TemperatureOut,
    TemperatureMean,
    /// In-situ m³/d
    RateIn,
    RateOut,
    /// m/s
    VelocityIn,
    VelocityOut,
    VelocityMean,
    /// kg/s
    MassRate,
    Reynolds,
    FrictionFactor,
    /// m of fluid
    HeadLoss,
    /// m
    ElevationIn,
    ElevationOut,
}

impl FlowQuantity {
    pub const ALL: [FlowQuantity; 17] = [
        FlowQuantity::PressureIn,
        FlowQuantity::PressureOut,
        FlowQuantity::PressureMean,
        FlowQuantity::TemperatureIn,
        FlowQuantity::TemperatureOut,
        FlowQuantity::TemperatureMean,
        FlowQuantity::RateIn,
        FlowQuantity::RateOut,
        FlowQuantity::VelocityIn,
        FlowQuantity::VelocityOut,
        FlowQuantity::VelocityMean,
        FlowQuantity::MassRate,
        FlowQuantity::Reynolds,
        FlowQuantity::FrictionFactor,
        FlowQuantity::HeadLoss,
        FlowQuantity::ElevationIn,
        FlowQuantity::ElevationOut,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            FlowQuantity::PressureIn | FlowQuantity::PressureOut | FlowQuantity::PressureMean => {
                "bar"
            }
            FlowQuantity::TemperatureIn
            | FlowQuantity::TemperatureOut
            | FlowQuantity::TemperatureMean => "degC",
            FlowQuantity::RateIn | FlowQuantity::RateOut => "m3/d",
            FlowQuantity::VelocityIn | FlowQuantity::VelocityOut | FlowQuantity::VelocityMean => {
                "m/s"
            }
            FlowQuantity::MassRate => "kg/s",
            FlowQuantity::Reynolds | FlowQuantity::FrictionFactor => "-",
            FlowQuantity::HeadLoss | FlowQuantity::ElevationIn | FlowQuantity::ElevationOut => "m",
        }
    }

    /// Quantities defined by geometry alone, available before any solve.
    pub fn is_geometric(&self) -> bool {
        matches!(self, FlowQuantity::ElevationIn | FlowQuantity::ElevationOut)
    }
}

impl fmt::Display for FlowQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowQuantity::PressureIn => "PressureIn",
            FlowQuantity::PressureOut => "PressureOut",
            FlowQuantity::PressureMean => "PressureMean",
            FlowQuantity::TemperatureIn => "TemperatureIn",
            FlowQuantity::TemperatureOut => "TemperatureOut",
            FlowQuantity::TemperatureMean => "TemperatureMean",
            FlowQuantity::RateIn => "RateIn",
            FlowQuantity::RateOut => "RateOut",
            FlowQuantity::VelocityIn => "VelocityIn",
            FlowQuantity::VelocityOut => "VelocityOut",
            FlowQuantity::VelocityMean => "VelocityMean",
            FlowQuantity::MassRate => "MassRate",
            FlowQuantity::Reynolds => "Reynolds",
            FlowQuantity::FrictionFactor => "FrictionFactor",
            FlowQuantity::HeadLoss => "HeadLoss",
            FlowQuantity::ElevationIn => "ElevationIn",
            FlowQuantity::ElevationOut => "ElevationOut",
        };
        write!(f, "{name}[{}]", self.unit())
    }
}
