//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered during a coupled simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Numerical divergence at t = {t}: component {index} is {value}")]
    NumericalDivergence { t: f64, index: usize, value: f64 },

    #[error("Unphysical state in {module}: {quantity} = {value}")]
    UnphysicalState {
        module: &'static str,
        quantity: &'static str,
        value: f64,
    },

    #[error("State layout error: {0}")]
    Layout(#[from] mp_core::CoreError),

    #[error("Control error: {0}")]
    Control(#[from] mp_controls::ControlError),
}

impl SimError {
    /// Divergence or unphysical state: the run itself failed, as opposed to
    /// being set up with bad arguments.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            SimError::NumericalDivergence { .. } | SimError::UnphysicalState { .. }
        )
    }
}

pub type SimResult<T> = Result<T, SimError>;
