//! Stateful black-oil property evaluator.
//!
//! Usage follows a strict order: configure the fluid, call `set_conditions`,
//! then run the `compute_*` chain in dependency order (solubility, bubble
//! point, compressibility, formation volume factor, viscosity). Each query
//! fails with [`FluidError::MissingPrecondition`] until its compute step ran.

use crate::correlations as corr;
use crate::error::{FluidError, FluidResult};
use crate::model::{FluidModel, FluidProperties};
use wf_core::numeric::ensure_in_range;
use wf_core::units::{Pressure, Temperature, bar, cp, degc, kgpm3, to_bar, to_degc};

fn check_range(value: f64, lo: f64, hi: f64, what: &'static str) -> FluidResult<f64> {
    ensure_in_range(value, lo, hi, what).map_err(|_| FluidError::InvalidParameter { what, value })
}

fn require(value: Option<f64>, what: &'static str) -> FluidResult<f64> {
    value.ok_or(FluidError::MissingPrecondition { what })
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Conditions {
    p_bar: f64,
    t_c: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Computed {
    rs: Option<f64>,
    p_bubble: Option<f64>,
    co_bubble: Option<f64>,
    bo_bubble: Option<f64>,
    bo: Option<f64>,
    uo_dead: Option<f64>,
    uo: Option<f64>,
    pseudo_critical: Option<(f64, f64)>,
    z: Option<f64>,
    bg: Option<f64>,
}

/// Oil/water/gas black-oil fluid.
///
/// Clone is a deep copy; no state is shared between clones.
#[derive(Clone, Debug, PartialEq)]
pub struct BlackOilFluid {
    api: f64,
    gas_gravity: f64,
    gor: f64,
    water_fraction: f64,
    water_gravity: f64,
    water_viscosity: f64,
    water_fvf: f64,
    conditions: Option<Conditions>,
    computed: Computed,
}

impl BlackOilFluid {
    /// Create a dry (zero water cut) oil from API gravity, gas relative
    /// density and producing GOR [sm³/sm³].
    pub fn new(api: f64, gas_gravity: f64, gor: f64) -> FluidResult<Self> {
        let mut fluid = Self {
            api: 30.0,
            gas_gravity: 0.7,
            gor: 0.0,
            water_fraction: 0.0,
            water_gravity: 1.0,
            water_viscosity: 1.0,
            water_fvf: 1.0,
            conditions: None,
            computed: Computed::default(),
        };
        fluid.set_api(api)?;
        fluid.set_gas_gravity(gas_gravity)?;
        fluid.set_gor(gor)?;
        Ok(fluid)
    }

    /// Pure water (water fraction 1).
    pub fn water() -> Self {
        Self {
            api: 30.0,
            gas_gravity: 0.7,
            gor: 0.0,
            water_fraction: 1.0,
            water_gravity: 1.0,
            water_viscosity: 1.0,
            water_fvf: 1.0,
            conditions: None,
            computed: Computed::default(),
        }
    }

    /// Builder form of [`set_water_fraction`](Self::set_water_fraction).
    pub fn with_water_fraction(mut self, wfr: f64) -> FluidResult<Self> {
        self.set_water_fraction(wfr)?;
        Ok(self)
    }

    pub fn set_api(&mut self, api: f64) -> FluidResult<()> {
        self.api = check_range(api, 1.0, 100.0, "API gravity")?;
        self.invalidate();
        Ok(())
    }

    /// Set the oil by relative density instead of API gravity.
    pub fn set_oil_relative_density(&mut self, d_o: f64) -> FluidResult<()> {
        let d_o = check_range(d_o, 0.01, 10.0, "oil relative density")?;
        self.set_api(corr::api_from_relative_density(d_o))
    }

    pub fn set_gas_gravity(&mut self, dg: f64) -> FluidResult<()> {
        self.gas_gravity = check_range(dg, 0.1, 10.0, "gas relative density")?;
        self.invalidate();
        Ok(())
    }

    pub fn set_gor(&mut self, gor: f64) -> FluidResult<()> {
        self.gor = check_range(gor, 0.0, 1e5, "gas/oil ratio")?;
        self.invalidate();
        Ok(())
    }

    pub fn set_water_fraction(&mut self, wfr: f64) -> FluidResult<()> {
        self.water_fraction = check_range(wfr, 0.0, 1.0, "water fraction")?;
        Ok(())
    }

    pub fn set_water_gravity(&mut self, dw: f64) -> FluidResult<()> {
        self.water_gravity = check_range(dw, 0.01, 10.0, "water relative density")?;
        Ok(())
    }

    /// Water viscosity [cP].
    pub fn set_water_viscosity(&mut self, uw: f64) -> FluidResult<()> {
        self.water_viscosity = check_range(uw, 0.01, 1e3, "water viscosity")?;
        Ok(())
    }

    pub fn api(&self) -> f64 {
        self.api
    }

    pub fn gas_gravity(&self) -> f64 {
        self.gas_gravity
    }

    pub fn gor(&self) -> f64 {
        self.gor
    }

    pub fn water_fraction(&self) -> f64 {
        self.water_fraction
    }

    pub fn oil_relative_density(&self) -> f64 {
        corr::oil_relative_density(self.api)
    }

    /// Water viscosity [cP].
    pub fn water_viscosity(&self) -> f64 {
        self.water_viscosity
    }

    pub fn water_fvf(&self) -> f64 {
        self.water_fvf
    }

    /// Water density [kg/m³].
    pub fn water_density(&self) -> f64 {
        self.water_gravity * corr::WATER_DENSITY_STD / self.water_fvf
    }

    /// Move the evaluator to new conditions. Every computed quantity is cleared.
    pub fn set_conditions(&mut self, p: Pressure, t: Temperature) -> FluidResult<()> {
        let p_bar = check_range(to_bar(p), 0.01, 1e6, "pressure")?;
        let t_c = check_range(to_degc(t), -273.15, 1e6, "temperature")?;
        self.conditions = Some(Conditions { p_bar, t_c });
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.computed = Computed::default();
    }

    fn conditions(&self) -> FluidResult<Conditions> {
        self.conditions.ok_or(FluidError::MissingPrecondition {
            what: "pressure/temperature conditions",
        })
    }

    /// Pressure of the current conditions.
    pub fn pressure(&self) -> FluidResult<Pressure> {
        Ok(bar(self.conditions()?.p_bar))
    }

    /// Temperature of the current conditions.
    pub fn temperature(&self) -> FluidResult<Temperature> {
        Ok(degc(self.conditions()?.t_c))
    }

    pub fn compute_solubility(&mut self) -> FluidResult<f64> {
        let c = self.conditions()?;
        let rs = corr::solubility(c.p_bar, c.t_c, self.api, self.gas_gravity, self.gor);
        self.computed.rs = Some(rs);
        Ok(rs)
    }

    pub fn compute_bubble_point(&mut self) -> FluidResult<f64> {
        let c = self.conditions()?;
        require(self.computed.rs, "solution gas/oil ratio")?;
        let pb = corr::bubble_point(c.t_c, self.api, self.gas_gravity, self.gor);
        self.computed.p_bubble = Some(pb);
        Ok(pb)
    }

    pub fn compute_oil_compressibility(&mut self) -> FluidResult<f64> {
        let c = self.conditions()?;
        let pb = require(self.computed.p_bubble, "bubble point pressure")?;
        let co = corr::oil_compressibility(c.t_c, self.api, self.gas_gravity, self.gor, pb);
        self.computed.co_bubble = Some(co);
        Ok(co)
    }

    pub fn compute_bubble_point_fvf(&mut self) -> FluidResult<f64> {
        let c = self.conditions()?;
        let bob = corr::saturated_fvf(
            c.t_c,
            self.gas_gravity,
            self.oil_relative_density(),
            self.gor,
        );
        self.computed.bo_bubble = Some(bob);
        Ok(bob)
    }

    pub fn compute_oil_fvf(&mut self) -> FluidResult<f64> {
        let c = self.conditions()?;
        let pb = require(self.computed.p_bubble, "bubble point pressure")?;
        let bo = if c.p_bar > pb {
            let co = require(self.computed.co_bubble, "oil compressibility")?;
            let bob = require(self.computed.bo_bubble, "bubble point formation volume factor")?;
            corr::undersaturated_fvf(bob, co, pb, c.p_bar)
        } else {
            let rs = require(self.computed.rs, "solution gas/oil ratio")?;
            corr::saturated_fvf(c.t_c, self.gas_gravity, self.oil_relative_density(), rs)
        };
        if !(1e-3..=1e3).contains(&bo) {
            return Err(FluidError::NonPhysical {
                what: "oil formation volume factor",
                value: bo,
            });
        }
        self.computed.bo = Some(bo);
        Ok(bo)
    }

    pub fn compute_dead_oil_viscosity(&mut self) -> FluidResult<f64> {
        let c = self.conditions()?;
        let uod = corr::dead_oil_viscosity(c.t_c, self.api);
        self.computed.uo_dead = Some(uod);
        Ok(uod)
    }

    pub fn compute_oil_viscosity(&mut self) -> FluidResult<f64> {
        let rs = require(self.computed.rs, "solution gas/oil ratio")?;
        let uod = require(self.computed.uo_dead, "dead oil viscosity")?;
        let uo = corr::live_oil_viscosity(uod, rs);
        if !uo.is_finite() || uo <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "oil viscosity",
                value: uo,
            });
        }
        self.computed.uo = Some(uo);
        Ok(uo)
    }

    /// Pseudo-critical pressure [bar] and temperature [K].
    pub fn compute_pseudo_critical(&mut self) -> FluidResult<(f64, f64)> {
        self.conditions()?;
        let pc = corr::pseudo_critical(self.gas_gravity);
        self.computed.pseudo_critical = Some(pc);
        Ok(pc)
    }

    pub fn compute_z_factor(&mut self) -> FluidResult<f64> {
        let c = self.conditions()?;
        let (ppc, tpc) = self
            .computed
            .pseudo_critical
            .ok_or(FluidError::MissingPrecondition {
                what: "pseudo-critical properties",
            })?;
        let p_pr = check_range(c.p_bar / ppc, 0.0, 13.0, "pseudo-reduced pressure")?;
        let t_pr = check_range((c.t_c + 273.15) / tpc, 1.2, 2.4, "pseudo-reduced temperature")?;
        let z = corr::z_factor(p_pr, t_pr);
        if z <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "compressibility factor",
                value: z,
            });
        }
        self.computed.z = Some(z);
        Ok(z)
    }

    pub fn compute_gas_fvf(&mut self) -> FluidResult<f64> {
        let c = self.conditions()?;
        let z = require(self.computed.z, "compressibility factor")?;
        let bg = corr::gas_fvf(z, c.p_bar, c.t_c);
        self.computed.bg = Some(bg);
        Ok(bg)
    }

    /// Run the whole liquid chain in dependency order.
    pub fn compute_liquid(&mut self) -> FluidResult<()> {
        self.compute_solubility()?;
        self.compute_bubble_point()?;
        self.compute_oil_compressibility()?;
        self.compute_bubble_point_fvf()?;
        self.compute_oil_fvf()?;
        self.compute_dead_oil_viscosity()?;
        self.compute_oil_viscosity()?;
        Ok(())
    }

    /// Solution gas/oil ratio [sm³/sm³].
    pub fn solubility(&self) -> FluidResult<f64> {
        require(self.computed.rs, "solution gas/oil ratio")
    }

    /// Bubble point pressure [bar].
    pub fn bubble_point(&self) -> FluidResult<f64> {
        require(self.computed.p_bubble, "bubble point pressure")
    }

    /// Oil compressibility at the bubble point [1/bar].
    pub fn oil_compressibility(&self) -> FluidResult<f64> {
        require(self.computed.co_bubble, "oil compressibility")
    }

    pub fn bubble_point_fvf(&self) -> FluidResult<f64> {
        require(self.computed.bo_bubble, "bubble point formation volume factor")
    }

    pub fn oil_fvf(&self) -> FluidResult<f64> {
        require(self.computed.bo, "oil formation volume factor")
    }

    /// Dead oil viscosity [cP].
    pub fn dead_oil_viscosity(&self) -> FluidResult<f64> {
        require(self.computed.uo_dead, "dead oil viscosity")
    }

    /// Live oil viscosity [cP].
    pub fn oil_viscosity(&self) -> FluidResult<f64> {
        require(self.computed.uo, "oil viscosity")
    }

    pub fn z_factor(&self) -> FluidResult<f64> {
        require(self.computed.z, "compressibility factor")
    }

    pub fn gas_fvf(&self) -> FluidResult<f64> {
        require(self.computed.bg, "gas formation volume factor")
    }

    /// In-situ oil density [kg/m³].
    pub fn oil_density(&self) -> FluidResult<f64> {
        let rs = self.solubility()?;
        let bo = self.oil_fvf()?;
        Ok(corr::oil_density(
            self.oil_relative_density(),
            self.gas_gravity,
            rs,
            bo,
        ))
    }

    fn blend(&self, oil: impl FnOnce() -> FluidResult<f64>, water: f64) -> FluidResult<f64> {
        let w = self.water_fraction;
        if w >= 1.0 {
            return Ok(water);
        }
        Ok((1.0 - w) * oil()? + w * water)
    }

    /// Liquid mixture density [kg/m³].
    pub fn mixture_density(&self) -> FluidResult<f64> {
        self.blend(|| self.oil_density(), self.water_density())
    }

    /// Liquid mixture viscosity [cP].
    pub fn mixture_viscosity(&self) -> FluidResult<f64> {
        self.blend(|| self.oil_viscosity(), self.water_viscosity)
    }

    /// Liquid mixture formation volume factor [rm³/sm³].
    pub fn mixture_fvf(&self) -> FluidResult<f64> {
        self.blend(|| self.oil_fvf(), self.water_fvf)
    }
}

impl FluidModel for BlackOilFluid {
    fn name(&self) -> &str {
        "black-oil (Standing)"
    }

    fn properties(&self, p: Pressure, t: Temperature) -> FluidResult<FluidProperties> {
        let mut state = self.clone();
        state.set_conditions(p, t)?;
        state.compute_liquid()?;
        Ok(FluidProperties {
            pressure: p,
            temperature: t,
            density: kgpm3(state.mixture_density()?),
            viscosity: cp(state.mixture_viscosity()?),
            fvf: state.mixture_fvf()?,
            solubility: state.solubility()?,
            bubble_point: bar(state.bubble_point()?),
        })
    }
}
