//! One physical pipe or riser, subdivided into a chain of segments.

use crate::boundary::FlowState;
use crate::common::check_positive;
use crate::error::{FlowError, FlowResult};
use crate::quantity::FlowQuantity;
use crate::segment::{PipeGeometry, PipeSegment, SegmentSolverConfig};
use crate::traits::Flowable;
use wf_core::units::{Length, m};
use wf_fluids::{BlackOilFluid, FluidModel};

/// Geometry an element inherits when it does not override it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipeDefaults {
    pub diameter: Length,
    pub roughness: Length,
    pub divisions: usize,
}

impl Default for PipeDefaults {
    fn default() -> Self {
        Self {
            diameter: m(0.1524),
            roughness: m(4.5e-5),
            divisions: 1,
        }
    }
}

/// Pipe of given length and elevation span, solved as `divisions` equal
/// segments. Segment elevations partition the span proportionally to length,
/// and each segment's outlet state is the next segment's inlet state.
#[derive(Clone, Debug)]
pub struct FlowElement<F: FluidModel = BlackOilFluid> {
    name: String,
    length: Option<Length>,
    z_in: Length,
    z_out: Length,
    diameter: Option<Length>,
    roughness: Option<Length>,
    divisions: Option<usize>,
    defaults: PipeDefaults,
    fluid: F,
    config: SegmentSolverConfig,
    segments: Vec<PipeSegment<F>>,
}

impl<F: FluidModel> FlowElement<F> {
    pub fn new(name: impl Into<String>, fluid: F) -> Self {
        Self {
            name: name.into(),
            length: None,
            z_in: m(0.0),
            z_out: m(0.0),
            diameter: None,
            roughness: None,
            divisions: None,
            defaults: PipeDefaults::default(),
            fluid,
            config: SegmentSolverConfig::default(),
            segments: Vec::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: PipeDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn set_length(&mut self, length: Length) -> FlowResult<&mut Self> {
        check_positive(length.value, "element length")?;
        self.length = Some(length);
        Ok(self)
    }

    /// Inlet and outlet elevations, positive upward.
    pub fn set_elevations(&mut self, z_in: Length, z_out: Length) -> FlowResult<&mut Self> {
        for z in [z_in.value, z_out.value] {
            if !z.is_finite() {
                return Err(FlowError::InvalidParameter {
                    what: "element elevation",
                    value: z,
                });
            }
        }
        self.z_in = z_in;
        self.z_out = z_out;
        Ok(self)
    }

    pub fn set_diameter(&mut self, diameter: Length) -> FlowResult<&mut Self> {
        check_positive(diameter.value, "element diameter")?;
        self.diameter = Some(diameter);
        Ok(self)
    }

    pub fn set_roughness(&mut self, roughness: Length) -> FlowResult<&mut Self> {
        if !roughness.value.is_finite() || roughness.value < 0.0 {
            return Err(FlowError::InvalidParameter {
                what: "element roughness",
                value: roughness.value,
            });
        }
        self.roughness = Some(roughness);
        Ok(self)
    }

    pub fn set_divisions(&mut self, divisions: usize) -> FlowResult<&mut Self> {
        if divisions == 0 {
            return Err(FlowError::InvalidParameter {
                what: "element divisions",
                value: 0.0,
            });
        }
        self.divisions = Some(divisions);
        Ok(self)
    }

    pub fn set_solver_config(&mut self, config: SegmentSolverConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub(crate) fn set_defaults(&mut self, defaults: PipeDefaults) {
        self.defaults = defaults;
    }

    pub fn fluid(&self) -> &F {
        &self.fluid
    }

    /// Replace the fluid of the element and of every built segment.
    pub fn set_fluid(&mut self, fluid: F) {
        for seg in &mut self.segments {
            seg.set_fluid(fluid.clone());
        }
        self.fluid = fluid;
    }

    pub fn divisions(&self) -> usize {
        self.divisions.unwrap_or(self.defaults.divisions)
    }

    /// Whole-element geometry with defaults applied.
    pub fn geometry(&self) -> FlowResult<PipeGeometry> {
        let length = self.length.ok_or(FlowError::MissingPrecondition {
            what: "element length",
        })?;
        let geometry = PipeGeometry {
            length,
            diameter: self.diameter.unwrap_or(self.defaults.diameter),
            roughness: self.roughness.unwrap_or(self.defaults.roughness),
            z_in: self.z_in,
            z_out: self.z_out,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn segments(&self) -> &[PipeSegment<F>] {
        &self.segments
    }

    /// True once solved and every segment balance converged.
    pub fn converged(&self) -> bool {
        !self.segments.is_empty()
            && self
                .segments
                .iter()
                .all(|s| s.results().is_some_and(|r| r.converged))
    }

    fn build_segments(&mut self) -> FlowResult<()> {
        let whole = self.geometry()?;
        let n = self.divisions();
        let dl = whole.length.value / n as f64;
        let dz = whole.elevation_change() / n as f64;
        let z0 = whole.z_in.value;

        self.segments.clear();
        for k in 0..n {
            let geometry = PipeGeometry {
                length: m(dl),
                z_in: m(z0 + dz * k as f64),
                z_out: m(z0 + dz * (k + 1) as f64),
                ..whole
            };
            let segment = PipeSegment::new(format!("{}[{k}]", self.name), geometry, self.fluid.clone())?
                .with_config(self.config);
            self.segments.push(segment);
        }
        Ok(())
    }

    fn fallback(&self, quantity: FlowQuantity) -> f64 {
        match quantity {
            FlowQuantity::ElevationIn => self.z_in.value,
            FlowQuantity::ElevationOut => self.z_out.value,
            _ => f64::NAN,
        }
    }
}

impl<F: FluidModel> Flowable for FlowElement<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve_out_flow(&mut self, inlet: &FlowState) -> FlowResult<FlowState> {
        self.build_segments()?;
        let mut state = *inlet;
        for seg in &mut self.segments {
            state = seg.solve_out_flow(&state)?;
        }
        Ok(state)
    }

    fn solve_in_flow(&mut self, outlet: &FlowState) -> FlowResult<FlowState> {
        self.build_segments()?;
        let mut state = *outlet;
        for seg in self.segments.iter_mut().rev() {
            state = seg.solve_in_flow(&state)?;
        }
        Ok(state)
    }

    fn inlet(&self) -> Option<FlowState> {
        self.segments.first().and_then(|s| s.inlet())
    }

    fn outlet(&self) -> Option<FlowState> {
        self.segments.last().and_then(|s| s.outlet())
    }

    fn profile(&self, quantity: FlowQuantity) -> Vec<f64> {
        if self.segments.is_empty() {
            return vec![self.fallback(quantity)];
        }
        self.segments
            .iter()
            .map(|s| s.value(quantity).unwrap_or(f64::NAN))
            .collect()
    }
}
