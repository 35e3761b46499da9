//! Numerical kernels shared by the reservoir and pipe-network solvers.
//!
//! - `linear`: dense LU solve with singularity/finiteness checks
//! - `secant`: bounded secant root finder that always returns its best candidate

pub mod error;
pub mod linear;
pub mod secant;

pub use error::{SolverError, SolverResult};
pub use linear::solve_dense;
pub use secant::{SecantConfig, SecantResult, secant_solve};
