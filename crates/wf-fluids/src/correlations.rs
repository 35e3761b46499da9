//! Standing black-oil correlations in oilfield-metric units.
//!
//! Pressures in bar, temperatures in °C, gas/oil ratios in sm³/sm³,
//! viscosities in cP. Relative densities are against water (oil) and air (gas).

/// Density of air at standard conditions [kg/m³].
pub const AIR_DENSITY_STD: f64 = 1.2;

/// Density of fresh water at standard conditions [kg/m³].
pub const WATER_DENSITY_STD: f64 = 1000.0;

/// Standard pressure [bar].
pub const P_STD_BAR: f64 = 1.013_25;

/// Standard temperature [K].
pub const T_STD_K: f64 = 288.15;

const SCF_PER_STB: f64 = 5.615;

#[inline]
fn fahrenheit(t_c: f64) -> f64 {
    1.8 * t_c + 32.0
}

/// Oil relative density from API gravity.
pub fn oil_relative_density(api: f64) -> f64 {
    141.5 / (131.5 + api)
}

/// API gravity from oil relative density.
pub fn api_from_relative_density(d_o: f64) -> f64 {
    141.5 / d_o - 131.5
}

fn standing_exponent(api: f64, t_c: f64) -> f64 {
    0.0125 * api - 0.00091 * fahrenheit(t_c)
}

/// Solution gas/oil ratio, capped at the producing GOR.
pub fn solubility(p: f64, t_c: f64, api: f64, dg: f64, gor: f64) -> f64 {
    let x = standing_exponent(api, t_c);
    let rs = 0.1373 * dg * (p * 10f64.powf(x)).powf(1.205);
    rs.min(gor)
}

/// Bubble point pressure for a given producing GOR.
pub fn bubble_point(t_c: f64, api: f64, dg: f64, gor: f64) -> f64 {
    let x = standing_exponent(api, t_c);
    (gor / dg / 0.1373).powf(1.0 / 1.205) * 10f64.powf(-x)
}

/// Isothermal oil compressibility at the bubble point [1/bar].
pub fn oil_compressibility(t_c: f64, api: f64, dg: f64, gor: f64, pb: f64) -> f64 {
    (-1433.0 + 5.0 * SCF_PER_STB * gor + 17.2 * fahrenheit(t_c) - 1180.0 * dg + 12.61 * api)
        / (1e5 * pb)
}

/// Saturated oil formation volume factor for a solution GOR `rs`.
pub fn saturated_fvf(t_c: f64, dg: f64, d_o: f64, rs: f64) -> f64 {
    let f = SCF_PER_STB * rs * (dg / d_o).sqrt() + 1.25 * fahrenheit(t_c);
    0.9759 + 12e-5 * f.powf(1.2)
}

/// Undersaturated oil formation volume factor above the bubble point.
pub fn undersaturated_fvf(bo_bubble: f64, co_bubble: f64, pb: f64, p: f64) -> f64 {
    bo_bubble * (co_bubble * (pb - p)).exp()
}

/// Dead-oil viscosity [cP].
pub fn dead_oil_viscosity(t_c: f64, api: f64) -> f64 {
    let a = 10f64.powf(0.43 + 8.33 / api);
    (0.32 + 1.8e7 / api.powf(4.53)) * (360.0 / (1.8 * t_c + 232.0)).powf(a)
}

/// Live-oil viscosity [cP] from dead-oil viscosity and solution GOR.
pub fn live_oil_viscosity(uo_dead: f64, rs: f64) -> f64 {
    let r = SCF_PER_STB * rs;
    let a = 10f64.powf(r * (2.2e-7 * r - 7.4e-4));
    let b = 0.68 / 10f64.powf(8.62e-5 * r)
        + 0.25 / 10f64.powf(1.1e-3 * r)
        + 0.062 / 10f64.powf(3.74e-3 * r);
    a * uo_dead.powf(b)
}

/// In-situ oil density [kg/m³].
pub fn oil_density(d_o: f64, dg: f64, rs: f64, bo: f64) -> f64 {
    (d_o * WATER_DENSITY_STD + rs * dg * AIR_DENSITY_STD) / bo
}

/// Sutton pseudo-critical (pressure [bar], temperature [K]) for gas gravity `dg`.
pub fn pseudo_critical(dg: f64) -> (f64, f64) {
    let ppc_psia = 756.8 - 131.0 * dg - 3.6 * dg * dg;
    let tpc_rankine = 169.2 + 349.5 * dg - 74.0 * dg * dg;
    (ppc_psia / 14.503_77, tpc_rankine / 1.8)
}

/// Papay gas compressibility factor from reduced pressure and temperature.
pub fn z_factor(p_pr: f64, t_pr: f64) -> f64 {
    1.0 - 3.53 * p_pr / 10f64.powf(0.9813 * t_pr) + 0.274 * p_pr * p_pr / 10f64.powf(0.8157 * t_pr)
}

/// Gas formation volume factor [rm³/sm³].
pub fn gas_fvf(z: f64, p: f64, t_c: f64) -> f64 {
    P_STD_BAR / p * z * (t_c + 273.15) / T_STD_K
}
