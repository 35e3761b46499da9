//! wf-core: shared foundation for wellflow.
//!
//! Contains:
//! - units (uom SI types + field-unit constructors: bar, °C, m³/d, cP)
//! - numeric (Real + finiteness, range and relative-change helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{WfError, WfResult};
pub use numeric::*;
pub use units::*;
