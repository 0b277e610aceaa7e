use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite value for state variable '{name}': {value}")]
    NonFinite { name: String, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Duplicate state variable '{name}' (registered by '{module}')")]
    DuplicateVariable { name: String, module: String },

    #[error("Unknown state variable '{name}'")]
    UnknownVariable { name: String },

    #[error("No value given for state variable '{name}'")]
    MissingValue { name: String },

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}
