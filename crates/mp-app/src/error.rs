//! Error types for the mp-app service layer.

use mp_project::ConfigError;
use mp_results::ResultsError;
use mp_sim::{SimError, SimFailure};

/// Process exit codes.
pub mod exit_code {
    pub const OK: u8 = 0;
    pub const CONFIG: u8 = 2;
    pub const DIVERGENCE: u8 = 3;
    pub const IO: u8 = 4;
    pub const CANCELLED: u8 = 5;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The scenario parsed but does not assemble into a runnable model.
    #[error("Scenario error: {0}")]
    Build(#[from] SimError),

    #[error("Simulation failed: {0}")]
    Simulation(Box<SimFailure>),

    /// The run failed and its partial trajectory could not be written either.
    /// The simulation failure decides the exit code.
    #[error("Simulation failed: {failure}; partial trajectory not written: {source}")]
    SimulationUnsaved {
        failure: Box<SimFailure>,
        #[source]
        source: ResultsError,
    },

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Build(_) => exit_code::CONFIG,
            AppError::Simulation(failure) if failure.error.is_numerical() => {
                exit_code::DIVERGENCE
            }
            AppError::Simulation(_) => exit_code::CONFIG,
            AppError::SimulationUnsaved { failure, .. } if failure.error.is_numerical() => {
                exit_code::DIVERGENCE
            }
            AppError::SimulationUnsaved { .. } => exit_code::CONFIG,
            AppError::Results(_) => exit_code::IO,
        }
    }

    /// The failed run behind this error, if the error came from stepping.
    pub fn failure(&self) -> Option<&SimFailure> {
        match self {
            AppError::Simulation(failure) | AppError::SimulationUnsaved { failure, .. } => {
                Some(failure.as_ref())
            }
            _ => None,
        }
    }
}

/// Result type for mp-app operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::{ControlCommand, StateLayoutBuilder, StateVector};
    use mp_project::ValidationError;
    use mp_sim::{Snapshot, Trajectory};

    fn sim_failure(error: SimError) -> SimFailure {
        let mut builder = StateLayoutBuilder::new();
        builder.add_module("osc", &["q", "i"]).unwrap();
        let layout = builder.build().unwrap();
        let trajectory = Trajectory::new(
            &layout,
            Snapshot {
                step: 0,
                t: 0.0,
                state: StateVector::zeros(2),
                control: ControlCommand(0.0),
            },
        );
        SimFailure {
            error,
            step: 1,
            t: 0.01,
            trajectory,
        }
    }

    fn failure(error: SimError) -> AppError {
        AppError::Simulation(Box::new(sim_failure(error)))
    }

    #[test]
    fn exit_code_mapping() {
        let config = AppError::from(ConfigError::Validation(ValidationError::NoModules));
        assert_eq!(config.exit_code(), 2);

        let build = AppError::from(SimError::InvalidArg { what: "dt" });
        assert_eq!(build.exit_code(), 2);

        let diverged = failure(SimError::NumericalDivergence {
            t: 0.01,
            index: 1,
            value: f64::INFINITY,
        });
        assert_eq!(diverged.exit_code(), 3);

        let unphysical = failure(SimError::UnphysicalState {
            module: "fusion0d",
            quantity: "density",
            value: -1.0,
        });
        assert_eq!(unphysical.exit_code(), 3);

        let io = AppError::from(ResultsError::Io(std::io::Error::other("disk full")));
        assert_eq!(io.exit_code(), 4);
        assert!(io.failure().is_none());
    }

    #[test]
    fn unsaved_failure_keeps_the_simulation_exit_code() {
        let err = AppError::SimulationUnsaved {
            failure: Box::new(sim_failure(SimError::NumericalDivergence {
                t: 0.01,
                index: 0,
                value: f64::NAN,
            })),
            source: ResultsError::Io(std::io::Error::other("read-only")),
        };
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.failure().map(|f| f.step), Some(1));
        assert!(err.to_string().contains("read-only"));
    }
}
