//! Fixed-step coupled simulation for the multiphysics engine.
//!
//! Provides:
//! - `PhysicsModule` capability trait and the composite derivative
//! - Fixed-step RK4 integrator (and forward Euler for comparison)
//! - Coupling driver with a sampled controller under zero-order hold
//! - Append-only trajectory recording
//! - Cooperative cancellation

pub mod cancel;
pub mod error;
pub mod integrator;
pub mod model;
pub mod sim;
pub mod trajectory;

// Re-exports for public API
pub use cancel::StopToken;
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use model::{CompositeModel, PhysicsModule};
pub use sim::{
    ControlLoop, IntegratorKind, RunReport, SimFailure, SimOptions, SimProgress, Simulation,
    Termination,
};
pub use trajectory::{Snapshot, Trajectory};
