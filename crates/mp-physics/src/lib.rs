//! Physics modules for the multiphysics engine.
//!
//! Each module implements [`mp_sim::PhysicsModule`] and owns a slot of the
//! composite state:
//! - [`Fusion0D`]: lumped 0-D D-T plasma energy and particle balance
//! - [`OscillatorModel`]: driven RLC-type electromagnetic mode

pub mod fusion;
pub mod oscillator;

pub use fusion::{Fusion0D, FusionParams, bosch_hale_dt};
pub use oscillator::{OscillatorModel, OscillatorParams, SourceCoupling};
