//! YAML case schema and its compilation into a coupled run.
//!
//! Units are field-metric and spelled out in the key names: bar, °C, m,
//! mD, m³/d and days.

use serde::{Deserialize, Serialize};
use std::path::Path;
use wf_core::units::{bar, degc, m};
use wf_flow::{Network, PipeDefaults};
use wf_fluids::BlackOilFluid;
use wf_reservoir::{
    Cell, Corey, Injector, PicardConfig, Producer, ReservoirConfig, ReservoirGrid,
    ReservoirSimulator, Saturations,
};
use wf_sim::{ChangeLimits, CouplingLoop, CouplingOptions, InflowMode, phase_properties};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub name: String,
    pub fluid: FluidDef,
    pub reservoir: ReservoirDef,
    pub production: NetworkDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection: Option<NetworkDef>,
    #[serde(default)]
    pub schedule: ScheduleDef,
    #[serde(default)]
    pub acceptance: AcceptanceDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluidDef {
    pub api: f64,
    pub gas_gravity: f64,
    /// Producing gas/oil ratio [sm³/sm³]
    pub gor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservoirDef {
    pub pressure_bar: f64,
    pub temperature_c: f64,
    pub grid: GridDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<CellDef>,
    #[serde(default)]
    pub relperm: RelPermDef,
    #[serde(default)]
    pub producer: WellDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injector: Option<InjectorDef>,
    #[serde(default)]
    pub picard: PicardDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridDef {
    pub ni: usize,
    pub nj: usize,
    pub length_i_m: f64,
    pub length_j_m: f64,
    pub thickness_m: f64,
    pub porosity: f64,
    pub permeability_md: f64,
}

/// Rock override for one cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellDef {
    pub i: usize,
    pub j: usize,
    pub porosity: f64,
    pub permeability_md: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelPermDef {
    pub swi: f64,
    pub swc: f64,
    pub sorw: f64,
    pub nw: f64,
    pub now: f64,
    pub krw_max: f64,
    pub kro_max: f64,
}

impl Default for RelPermDef {
    fn default() -> Self {
        let c = Corey::default();
        Self {
            swi: c.saturations.swi,
            swc: c.saturations.swc,
            sorw: c.saturations.sorw,
            nw: c.nw,
            now: c.now,
            krw_max: c.krw_max,
            kro_max: c.kro_max,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellDef {
    pub rw_m: f64,
    #[serde(default)]
    pub skin: f64,
}

impl Default for WellDef {
    fn default() -> Self {
        let p = Producer::default();
        Self {
            rw_m: p.rw,
            skin: p.skin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InjectorDef {
    pub rw_m: f64,
    #[serde(default)]
    pub skin: f64,
    pub rate_m3pd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PicardDef {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for PicardDef {
    fn default() -> Self {
        let p = PicardConfig::default();
        Self {
            max_iterations: p.max_iterations,
            tolerance: p.tolerance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkDef {
    /// Wellhead conditions; required for the production network only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wellhead: Option<WellheadDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<PipeDefaultsDef>,
    pub elements: Vec<ElementDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellheadDef {
    pub pressure_bar: f64,
    pub temperature_c: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipeDefaultsDef {
    pub diameter_m: f64,
    pub roughness_m: f64,
    pub divisions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementDef {
    Pipe {
        name: String,
        length_m: f64,
        #[serde(default)]
        z_in_m: f64,
        #[serde(default)]
        z_out_m: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        diameter_m: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        roughness_m: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        divisions: Option<usize>,
    },
    Booster {
        name: String,
        delta_p_bar: f64,
        efficiency: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InflowDef {
    #[default]
    Implicit,
    Linearized,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleDef {
    pub dt_d: f64,
    pub min_dt_d: f64,
    pub max_dt_d: f64,
    pub t_end_d: f64,
    pub grow_factor: f64,
    pub cutback_factor: f64,
    pub max_steps: usize,
    pub inflow: InflowDef,
}

impl Default for ScheduleDef {
    fn default() -> Self {
        let o = CouplingOptions::default();
        Self {
            dt_d: o.dt,
            min_dt_d: o.min_dt,
            max_dt_d: o.max_dt,
            t_end_d: o.t_end,
            grow_factor: o.grow_factor,
            cutback_factor: o.cutback_factor,
            max_steps: o.max_steps,
            inflow: InflowDef::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AcceptanceDef {
    pub max_dsw: f64,
    /// No pressure limit when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dp_bar: Option<f64>,
    pub require_converged: bool,
}

impl Default for AcceptanceDef {
    fn default() -> Self {
        let c = ChangeLimits::default();
        Self {
            max_dsw: c.max_dsw,
            max_dp_bar: None,
            require_converged: c.require_converged,
        }
    }
}

impl Case {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::CaseFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| CliError::CaseParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compile the case into a ready-to-run coupling loop. Every library
    /// validation runs here, so a case that builds is a valid case.
    pub fn build(&self) -> CliResult<CouplingLoop> {
        let fluid = BlackOilFluid::new(self.fluid.api, self.fluid.gas_gravity, self.fluid.gor)?;
        let reservoir = self.build_reservoir(&fluid)?;

        let production = build_network("production", &self.production, &fluid)?;
        if self.production.wellhead.is_none() {
            return Err(CliError::Case(
                "production network needs a wellhead".to_string(),
            ));
        }

        let options = CouplingOptions {
            dt: self.schedule.dt_d,
            min_dt: self.schedule.min_dt_d,
            max_dt: self.schedule.max_dt_d,
            grow_factor: self.schedule.grow_factor,
            cutback_factor: self.schedule.cutback_factor,
            t_end: self.schedule.t_end_d,
            max_steps: self.schedule.max_steps,
            inflow: match self.schedule.inflow {
                InflowDef::Implicit => InflowMode::Implicit,
                InflowDef::Linearized => InflowMode::Linearized,
            },
        };
        let limits = ChangeLimits {
            max_dsw: self.acceptance.max_dsw,
            max_dp: self.acceptance.max_dp_bar.unwrap_or(f64::INFINITY),
            require_converged: self.acceptance.require_converged,
        };
        let positive = |v: f64| v > 0.0;
        if !positive(limits.max_dsw) || !positive(limits.max_dp) {
            return Err(CliError::Case(
                "acceptance limits must be positive".to_string(),
            ));
        }

        let mut coupled = CouplingLoop::new(
            reservoir,
            production,
            degc(self.reservoir.temperature_c),
            options,
        )?
        .with_criterion(limits);
        if let Some(def) = &self.injection {
            let injection = build_network("injection", def, &fluid)?;
            coupled = coupled.with_injection(injection)?;
        }
        Ok(coupled)
    }

    fn build_reservoir(&self, fluid: &BlackOilFluid) -> CliResult<ReservoirSimulator> {
        let r = &self.reservoir;
        let g = &r.grid;
        let mut grid = ReservoirGrid::uniform(
            g.ni,
            g.nj,
            g.length_i_m,
            g.length_j_m,
            g.thickness_m,
            g.porosity,
            g.permeability_md,
        )?;
        for c in &r.cells {
            grid.set_cell(
                c.i,
                c.j,
                Cell {
                    porosity: c.porosity,
                    permeability: c.permeability_md,
                },
            )?;
        }

        let kr = &r.relperm;
        let relperm = Corey::new(
            Saturations::new(kr.swi, kr.swc, kr.sorw)?,
            kr.nw,
            kr.now,
            kr.krw_max,
            kr.kro_max,
        )?;

        let phases = phase_properties(fluid, bar(r.pressure_bar), degc(r.temperature_c))?;
        let config = ReservoirConfig {
            initial_pressure: r.pressure_bar,
            phases,
            producer: Producer {
                rw: r.producer.rw_m,
                skin: r.producer.skin,
            },
            injector: r.injector.as_ref().map(|inj| Injector {
                rw: inj.rw_m,
                skin: inj.skin,
                rate: inj.rate_m3pd,
            }),
            picard: PicardConfig {
                max_iterations: r.picard.max_iterations,
                tolerance: r.picard.tolerance,
            },
        };
        Ok(ReservoirSimulator::new(grid, relperm, config)?)
    }
}

fn build_network(name: &str, def: &NetworkDef, fluid: &BlackOilFluid) -> CliResult<Network> {
    if def.elements.is_empty() {
        return Err(CliError::Case(format!("{name} network has no elements")));
    }
    let mut network = Network::new(name, fluid.clone());
    if let Some(d) = &def.defaults {
        network.set_defaults(PipeDefaults {
            diameter: m(d.diameter_m),
            roughness: m(d.roughness_m),
            divisions: d.divisions,
        })?;
    }
    for el in &def.elements {
        match el {
            ElementDef::Pipe {
                name,
                length_m,
                z_in_m,
                z_out_m,
                diameter_m,
                roughness_m,
                divisions,
            } => {
                let pipe = network.add_pipe(name.as_str());
                pipe.set_length(m(*length_m))?
                    .set_elevations(m(*z_in_m), m(*z_out_m))?;
                if let Some(d) = diameter_m {
                    pipe.set_diameter(m(*d))?;
                }
                if let Some(e) = roughness_m {
                    pipe.set_roughness(m(*e))?;
                }
                if let Some(n) = divisions {
                    pipe.set_divisions(*n)?;
                }
                // Surface the geometry checks now rather than at the first solve.
                pipe.geometry()?.validate()?;
            }
            ElementDef::Booster {
                name,
                delta_p_bar,
                efficiency,
            } => {
                network.add_booster(name.as_str(), bar(*delta_p_bar), *efficiency)?;
            }
        }
    }
    if let Some(wh) = &def.wellhead {
        network.set_wellhead(bar(wh.pressure_bar), degc(wh.temperature_c));
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = include_str!("../../../demos/five_spot.yaml");

    fn demo() -> Case {
        serde_yaml::from_str(DEMO).unwrap()
    }

    #[test]
    fn demo_case_parses_and_builds() {
        let case = demo();
        assert_eq!(case.production.elements.len(), 3);
        assert!(case.injection.is_some());
        let coupled = case.build().unwrap();
        assert_eq!(coupled.reservoir().grid().len(), 25);
        assert!(coupled.injection().is_some());
        assert_eq!(coupled.options().inflow, InflowMode::Implicit);
    }

    #[test]
    fn omitted_sections_take_library_defaults() {
        let yaml = r#"
name: minimal
fluid: { api: 30, gas_gravity: 0.7, gor: 80 }
reservoir:
  pressure_bar: 250
  temperature_c: 70
  grid: { ni: 2, nj: 2, length_i_m: 200, length_j_m: 200, thickness_m: 10, porosity: 0.2, permeability_md: 50 }
production:
  wellhead: { pressure_bar: 15, temperature_c: 30 }
  elements:
    - { type: pipe, name: tubing, length_m: 500, z_in_m: -500 }
"#;
        let case: Case = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(case.schedule, ScheduleDef::default());
        assert_eq!(case.acceptance, AcceptanceDef::default());
        assert_eq!(case.reservoir.relperm, RelPermDef::default());
        assert!(case.build().is_ok());
    }

    #[test]
    fn invalid_cases_are_rejected() {
        let mut case = demo();
        case.production.wellhead = None;
        assert!(matches!(case.build(), Err(CliError::Case(_))));

        let mut case = demo();
        case.reservoir.grid.porosity = 1.5;
        assert!(case.build().is_err());

        let mut case = demo();
        case.production.elements.push(ElementDef::Pipe {
            name: "too steep".to_string(),
            length_m: 10.0,
            z_in_m: 0.0,
            z_out_m: 50.0,
            diameter_m: None,
            roughness_m: None,
            divisions: None,
        });
        assert!(case.build().is_err());

        let mut case = demo();
        case.reservoir.injector = None;
        assert!(case.build().is_err());

        let mut case = demo();
        case.schedule.dt_d = 0.0;
        assert!(case.build().is_err());
    }

    #[test]
    fn unknown_element_type_fails_to_parse() {
        let yaml = "{ type: valve, name: choke }";
        assert!(serde_yaml::from_str::<ElementDef>(yaml).is_err());
    }
}
