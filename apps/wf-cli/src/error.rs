use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read case file: {path}")]
    CaseFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse case file {path}: {source}")]
    CaseParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid case: {0}")]
    Case(String),

    #[error("Failed to write report: {path}")]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Simulation error: {0}")]
    Simulation(String),
}

pub type CliResult<T> = Result<T, CliError>;

impl From<wf_sim::SimError> for CliError {
    fn from(err: wf_sim::SimError) -> Self {
        CliError::Simulation(err.to_string())
    }
}

impl From<wf_reservoir::ReservoirError> for CliError {
    fn from(err: wf_reservoir::ReservoirError) -> Self {
        CliError::Case(err.to_string())
    }
}

impl From<wf_flow::FlowError> for CliError {
    fn from(err: wf_flow::FlowError) -> Self {
        CliError::Case(err.to_string())
    }
}

impl From<wf_fluids::FluidError> for CliError {
    fn from(err: wf_fluids::FluidError) -> Self {
        CliError::Case(err.to_string())
    }
}
