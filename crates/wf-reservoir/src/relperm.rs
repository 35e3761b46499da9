//! Oil/water relative permeability.

use crate::error::{ReservoirError, ReservoirResult, check_fraction, check_positive};

/// Saturation endpoints of the oil/water system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Saturations {
    /// Initial water saturation
    pub swi: f64,
    /// Connate (critical) water saturation
    pub swc: f64,
    /// Residual oil saturation to water
    pub sorw: f64,
}

impl Saturations {
    pub fn new(swi: f64, swc: f64, sorw: f64) -> ReservoirResult<Self> {
        check_fraction(swi, "initial water saturation")?;
        check_fraction(swc, "connate water saturation")?;
        check_fraction(sorw, "residual oil saturation")?;
        if sorw <= 0.0 {
            return Err(ReservoirError::InvalidParameter {
                what: "residual oil saturation",
                value: sorw,
            });
        }
        if swi + sorw >= 1.0 || swc + sorw >= 1.0 {
            return Err(ReservoirError::InvalidParameter {
                what: "movable saturation range",
                value: 1.0 - sorw - swi.max(swc),
            });
        }
        Ok(Self { swi, swc, sorw })
    }

    /// Upper bound of movable water saturation, 1 − sorw.
    pub fn max_water(&self) -> f64 {
        1.0 - self.sorw
    }

    /// Normalized water saturation against the connate value, in [0, 1].
    pub fn normalized_water(&self, sw: f64) -> f64 {
        if sw <= self.swc {
            0.0
        } else if sw > self.max_water() {
            1.0
        } else {
            (sw - self.swc) / (1.0 - self.sorw - self.swc)
        }
    }

    /// Normalized oil saturation against the initial water value, in [0, 1].
    pub fn normalized_oil(&self, sw: f64) -> f64 {
        if sw <= self.swi {
            1.0
        } else if sw >= self.max_water() {
            0.0
        } else {
            1.0 - (sw - self.swi) / (1.0 - self.sorw - self.swi)
        }
    }
}

/// Saturation-dependent relative permeability curves.
pub trait RelativePermeability: Clone + Send + Sync + std::fmt::Debug {
    fn saturations(&self) -> &Saturations;

    fn krw(&self, sw: f64) -> f64;

    fn kro(&self, sw: f64) -> f64;

    /// d krw / d sw
    fn dkrw(&self, sw: f64) -> f64;

    /// d kro / d sw
    fn dkro(&self, sw: f64) -> f64;
}

/// Corey power-law curves.
///
/// Above 1 − sorw the water curve ramps linearly from `krw_max` to 1 at sw = 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Corey {
    pub saturations: Saturations,
    /// Water exponent
    pub nw: f64,
    /// Oil exponent
    pub now: f64,
    pub krw_max: f64,
    pub kro_max: f64,
}

impl Corey {
    pub fn new(
        saturations: Saturations,
        nw: f64,
        now: f64,
        krw_max: f64,
        kro_max: f64,
    ) -> ReservoirResult<Self> {
        check_positive(nw, "Corey water exponent")?;
        check_positive(now, "Corey oil exponent")?;
        check_positive(krw_max, "water endpoint relative permeability")?;
        check_positive(kro_max, "oil endpoint relative permeability")?;
        check_fraction(krw_max, "water endpoint relative permeability")?;
        check_fraction(kro_max, "oil endpoint relative permeability")?;
        Ok(Self {
            saturations,
            nw,
            now,
            krw_max,
            kro_max,
        })
    }
}

impl Default for Corey {
    fn default() -> Self {
        Self {
            saturations: Saturations {
                swi: 0.2,
                swc: 0.2,
                sorw: 0.2,
            },
            nw: 2.0,
            now: 2.0,
            krw_max: 0.6,
            kro_max: 0.9,
        }
    }
}

impl RelativePermeability for Corey {
    fn saturations(&self) -> &Saturations {
        &self.saturations
    }

    fn krw(&self, sw: f64) -> f64 {
        let s = &self.saturations;
        if sw <= s.swc {
            0.0
        } else if sw > s.max_water() {
            self.krw_max + (1.0 - self.krw_max) * (sw - s.max_water()) / s.sorw
        } else {
            self.krw_max * s.normalized_water(sw).powf(self.nw)
        }
    }

    fn kro(&self, sw: f64) -> f64 {
        let s = &self.saturations;
        if sw <= s.swi {
            self.kro_max
        } else if sw >= s.max_water() {
            0.0
        } else {
            self.kro_max * s.normalized_oil(sw).powf(self.now)
        }
    }

    fn dkrw(&self, sw: f64) -> f64 {
        let s = &self.saturations;
        if sw <= s.swc {
            0.0
        } else if sw > s.max_water() {
            (1.0 - self.krw_max) / s.sorw
        } else {
            self.krw_max * self.nw * s.normalized_water(sw).powf(self.nw - 1.0)
                / (1.0 - s.sorw - s.swc)
        }
    }

    fn dkro(&self, sw: f64) -> f64 {
        let s = &self.saturations;
        if sw <= s.swi || sw >= s.max_water() {
            0.0
        } else {
            -self.kro_max * self.now * s.normalized_oil(sw).powf(self.now - 1.0)
                / (1.0 - s.sorw - s.swi)
        }
    }
}
