//! Sampled execution primitives for digital controllers.
//!
//! Controllers operate in sampled/digital mode with a configured period.
//! Between samples, controller outputs are held constant (zero-order hold).
//!
//! Sample instants are derived from the integration step index, never from
//! accumulated floating-point time or the wall clock, so the sampling
//! pattern is identical on every run.

use mp_core::{ControlCommand, steps_to_cover};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Sample configuration for a controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub period: f64,
}

impl SampleConfig {
    /// Create a new sample configuration.
    ///
    /// # Arguments
    ///
    /// * `period` - Sample period in seconds (must be positive)
    pub fn new(period: f64) -> ControlResult<Self> {
        if !(period.is_finite() && period > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { period })
    }
}

/// Sample clock tracks at which integration steps a controller executes.
///
/// The first sample is due at step 0. After a sample at step `k` the next
/// one is due at `k + stride`, where `stride` is the smallest number of
/// steps covering the sample period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    /// Sample configuration.
    pub config: SampleConfig,
    /// Integration steps between samples.
    stride: u64,
    /// Step index of the next scheduled sample.
    next_sample_step: u64,
}

impl SampleClock {
    /// Create a new sample clock for integration step `dt`.
    ///
    /// The sample period must be at least one integration step.
    pub fn new(config: SampleConfig, dt: f64) -> ControlResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "dt must be positive",
            });
        }
        let stride = steps_to_cover(config.period, dt);
        if stride == 0 || config.period < dt * (1.0 - 1e-9) {
            return Err(ControlError::InvalidArg {
                what: "sample period must be at least one integration step",
            });
        }
        Ok(Self {
            config,
            stride,
            next_sample_step: 0,
        })
    }

    /// Integration steps between two samples.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Whether the sample period is an integer multiple of `dt`.
    pub fn is_aligned(&self, dt: f64) -> bool {
        let ratio = self.config.period / dt;
        (ratio - self.stride as f64).abs() <= 1e-9 * ratio.max(1.0)
    }

    /// Check if a sample should occur at the given step.
    pub fn should_sample(&self, step: u64) -> bool {
        step >= self.next_sample_step
    }

    /// Schedule the next sample after one executed at `step`.
    pub fn advance(&mut self, step: u64) {
        self.next_sample_step = step + self.stride;
    }
}

/// Zero-order hold for controller outputs.
///
/// Holds the last controller output value between samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroOrderHold {
    /// Held value.
    pub value: ControlCommand,
    /// Sample clock.
    pub clock: SampleClock,
}

impl ZeroOrderHold {
    /// Create a new zero-order hold.
    pub fn new(clock: SampleClock, initial_value: ControlCommand) -> Self {
        Self {
            value: initial_value,
            clock,
        }
    }

    /// Get the current held value.
    pub fn get(&self) -> ControlCommand {
        self.value
    }

    /// Whether a new value should be latched at `step`.
    pub fn is_due(&self, step: u64) -> bool {
        self.clock.should_sample(step)
    }

    /// Update the held value (if a sample should occur).
    ///
    /// Returns `true` if the value was updated.
    pub fn update(&mut self, step: u64, new_value: ControlCommand) -> bool {
        if self.clock.should_sample(step) {
            self.value = new_value;
            self.clock.advance(step);
            true
        } else {
            false
        }
    }
}
