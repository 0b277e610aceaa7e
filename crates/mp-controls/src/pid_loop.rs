//! Sampled PID loop with zero-order hold.

use mp_core::ControlCommand;

use crate::controller::{PIDController, PIDControllerState};
use crate::error::ControlResult;
use crate::sampled::{SampleClock, SampleConfig, ZeroOrderHold};

/// A [`PIDController`] running on its own sample clock.
///
/// Owns the controller state exclusively; the state only changes inside
/// [`sample`](Self::sample).
#[derive(Debug, Clone)]
pub struct PidLoop {
    controller: PIDController,
    state: PIDControllerState,
    hold: ZeroOrderHold,
    samples: u64,
}

impl PidLoop {
    /// Create a loop for integration step `dt`, holding `initial_output`
    /// until the first sample.
    pub fn new(controller: PIDController, dt: f64, initial_output: f64) -> ControlResult<Self> {
        let config = SampleConfig::new(controller.sample_period)?;
        let clock = SampleClock::new(config, dt)?;
        Ok(Self {
            controller,
            state: PIDControllerState::default(),
            hold: ZeroOrderHold::new(clock, ControlCommand(initial_output)),
            samples: 0,
        })
    }

    pub fn state(&self) -> &PIDControllerState {
        &self.state
    }

    pub fn clock(&self) -> &SampleClock {
        &self.hold.clock
    }

    /// Currently held command.
    pub fn held(&self) -> ControlCommand {
        self.hold.get()
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Whether a sample is due at integration step `step`.
    pub fn is_due(&self, step: u64) -> bool {
        self.hold.is_due(step)
    }

    /// Run the control law once and return the new command.
    ///
    /// Does not consult the clock; callers use [`poll`](Self::poll) to
    /// respect the sample schedule.
    pub fn sample(&mut self, measured: f64, setpoint: f64) -> ControlCommand {
        let (state, output) = self.controller.update(&self.state, measured, setpoint);
        self.state = state;
        self.samples += 1;
        ControlCommand(output)
    }

    /// Sample if due at `step` and latch the result into the hold.
    ///
    /// Returns the new command when a sample was taken.
    pub fn poll(&mut self, step: u64, measured: f64, setpoint: f64) -> Option<ControlCommand> {
        if !self.is_due(step) {
            return None;
        }
        let command = self.sample(measured, setpoint);
        self.hold.update(step, command);
        Some(command)
    }
}
