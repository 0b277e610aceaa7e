//! mp-core: shared foundation for the multiphysics engine.
//!
//! Contains:
//! - numeric (Real + step counting)
//! - ids (compact typed indices for variables and modules)
//! - state (composite state layout, dense state vector, control command)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod state;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use state::{ControlCommand, Slot, StateLayout, StateLayoutBuilder, StateVector};
