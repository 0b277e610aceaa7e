//! Discrete-time control primitives for the multiphysics engine.
//!
//! The controller runs on its own sample clock, independent of the
//! integration step. Between samples its output is held constant
//! (zero-order hold) and fed to every derivative evaluation of the plant.
//!
//! # Architecture
//!
//! - [`PIDController`] is the pure update law (gains, bounds, anti-windup)
//! - [`PIDControllerState`] is the persistent integral / previous error
//! - [`SampleClock`] decides sample instants from the step index only
//! - [`PidLoop`] ties them together with a [`ZeroOrderHold`] and a
//!   [`MeasuredVariable`] bound to the composite state

pub mod controller;
pub mod error;
pub mod measured;
pub mod pid_loop;
pub mod sampled;

pub use controller::{PIDController, PIDControllerState};
pub use error::{ControlError, ControlResult};
pub use measured::MeasuredVariable;
pub use pid_loop::PidLoop;
pub use sampled::{SampleClock, SampleConfig, ZeroOrderHold};
