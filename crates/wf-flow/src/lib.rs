//! wf-flow: steady pipe-flow network solver for wellflow.
//!
//! Provides:
//! - Reynolds number and Darcy friction factor (laminar, Colebrook, transitional)
//! - `PipeSegment`: pressure traverse of one homogeneous segment, in either direction
//! - `FlowElement`: a pipe subdivided into a chain of segments
//! - `Booster`: fixed pressure increment (pump / ESP)
//! - `Network`: chain of pipes and boosters with an operating-point search
//!   against an inflow relation
//!
//! All composites implement [`Flowable`] with the same propagation contract,
//! so a network chains elements exactly as an element chains segments.
//!
//! # Example
//!
//! ```no_run
//! use wf_core::units::{bar, degc, m};
//! use wf_flow::{LinearIpr, Network};
//! use wf_fluids::BlackOilFluid;
//!
//! let fluid = BlackOilFluid::new(30.0, 0.7, 100.0).unwrap();
//! let mut well = Network::new("producer", fluid);
//! well.add_pipe("tubing")
//!     .set_length(m(1500.0)).unwrap()
//!     .set_elevations(m(-1500.0), m(0.0)).unwrap()
//!     .set_divisions(10).unwrap();
//! well.set_wellhead(bar(20.0), degc(40.0));
//! well.set_ipr(LinearIpr::new(8.0, bar(250.0)).unwrap());
//!
//! let op = well.solve_operating_point(None).unwrap();
//! println!("pwf = {:?}, converged = {}", op.pwf, op.converged);
//! ```

pub mod booster;
pub mod boundary;
pub mod common;
pub mod element;
pub mod error;
pub mod friction;
pub mod ipr;
pub mod network;
pub mod quantity;
pub mod segment;
pub mod traits;

pub use booster::Booster;
pub use boundary::{Boundary, FlowState, PortConditions};
pub use element::{FlowElement, PipeDefaults};
pub use error::{FlowError, FlowResult};
pub use friction::{ColebrookConfig, FlowRegime, friction_factor, reynolds};
pub use ipr::{InflowRelation, LinearIpr};
pub use network::{Network, NetworkElement, OperatingPoint, OperatingPointConfig};
pub use quantity::FlowQuantity;
pub use segment::{PipeGeometry, PipeSegment, SegmentResults, SegmentSolverConfig};
pub use traits::Flowable;
