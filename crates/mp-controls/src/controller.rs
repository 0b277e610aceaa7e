//! PID controller update law.
//!
//! Discrete positional PID evaluated once per sample period `Ts`:
//! - error `e = sp - pv`
//! - integral accumulates `e * Ts`
//! - derivative is the backward difference `(e - e_prev) / Ts`
//! - output is clamped to `[out_min, out_max]`
//!
//! Anti-windup: when the clamped output differs from the raw output the
//! integral keeps its previous value.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PIDController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
    /// Sample period Ts (seconds).
    pub sample_period: f64,
}

impl PIDController {
    /// Create a new PID controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    /// * `kd` - Derivative gain
    /// * `out_min` - Minimum output
    /// * `out_max` - Maximum output
    /// * `sample_period` - Sample period Ts (seconds)
    pub fn new(
        kp: f64,
        ki: f64,
        kd: f64,
        out_min: f64,
        out_max: f64,
        sample_period: f64,
    ) -> ControlResult<Self> {
        if !(kp.is_finite() && ki.is_finite() && kd.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "gains must be finite",
            });
        }
        if !(sample_period.is_finite() && sample_period > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample_period must be positive",
            });
        }
        if !(out_min.is_finite() && out_max.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "output bounds must be finite",
            });
        }
        if out_min >= out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ki,
            kd,
            out_min,
            out_max,
            sample_period,
        })
    }

    /// Compute controller output given process variable and setpoint.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (integral and previous error)
    /// * `pv` - Process variable (measured value)
    /// * `sp` - Setpoint (desired value)
    ///
    /// # Returns
    ///
    /// Updated state and output value.
    pub fn update(&self, state: &PIDControllerState, pv: f64, sp: f64) -> (PIDControllerState, f64) {
        let ts = self.sample_period;

        // Error: e = sp - pv (positive error means PV is below setpoint)
        let error = sp - pv;

        let p_term = self.kp * error;

        let candidate_integral = state.integral + error * ts;
        let i_term = self.ki * candidate_integral;

        // No previous sample: no derivative kick on the first update
        let derivative = match state.prev_error {
            Some(prev) => (error - prev) / ts,
            None => 0.0,
        };
        let d_term = self.kd * derivative;

        let output_raw = p_term + i_term + d_term;
        let output = output_raw.clamp(self.out_min, self.out_max);

        // Anti-windup: if output is saturated, don't accumulate integral
        let integral = if output == output_raw {
            candidate_integral
        } else {
            state.integral
        };

        let new_state = PIDControllerState {
            integral,
            prev_error: Some(error),
        };

        (new_state, output)
    }
}

/// PID controller state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PIDControllerState {
    /// Integral accumulator.
    pub integral: f64,
    /// Error at the previous sample, `None` before the first sample.
    pub prev_error: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_controller_creation() {
        let pid = PIDController::new(1.0, 2.0, 0.5, 0.0, 1.0, 0.1).unwrap();
        assert_eq!(pid.kp, 1.0);
        assert_eq!(pid.ki, 2.0);
        assert_eq!(pid.kd, 0.5);
    }

    #[test]
    fn proportional_only() {
        let pid = PIDController::new(2.0, 0.0, 0.0, -10.0, 10.0, 0.1).unwrap();
        let (_, output) = pid.update(&PIDControllerState::default(), 0.5, 1.0);
        assert!((output - 1.0).abs() < 1e-12);
    }

    #[test]
    fn integral_accumulates_error_times_period() {
        let pid = PIDController::new(0.0, 1.0, 0.0, -10.0, 10.0, 0.1).unwrap();
        let mut state = PIDControllerState::default();
        for _ in 0..10 {
            let (next, _) = pid.update(&state, 0.0, 1.0);
            state = next;
        }
        assert!((state.integral - 1.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_uses_previous_error() {
        let pid = PIDController::new(0.0, 0.0, 1.0, -100.0, 100.0, 0.5).unwrap();
        let (state, first) = pid.update(&PIDControllerState::default(), 0.0, 1.0);
        assert_eq!(first, 0.0, "no derivative kick on first sample");
        // error goes 1.0 -> 0.0 over Ts=0.5 => derivative -2.0
        let (_, second) = pid.update(&state, 1.0, 1.0);
        assert!((second + 2.0).abs() < 1e-12);
    }

    #[test]
    fn output_clamping_and_anti_windup() {
        let pid = PIDController::new(10.0, 1.0, 0.0, 0.0, 1.0, 0.1).unwrap();
        let state = PIDControllerState::default();

        let (next, output) = pid.update(&state, 0.0, 10.0);
        assert_eq!(output, 1.0);
        // Saturated: integral must not wind up
        assert_eq!(next.integral, 0.0);
        assert_eq!(next.prev_error, Some(10.0));
    }

    #[test]
    fn invalid_controller_params() {
        // out_min >= out_max
        assert!(PIDController::new(1.0, 1.0, 0.0, 1.0, 0.0, 0.1).is_err());
        // Non-positive sample period
        assert!(PIDController::new(1.0, 1.0, 0.0, 0.0, 1.0, 0.0).is_err());
        // Non-finite gain
        assert!(PIDController::new(f64::NAN, 1.0, 0.0, 0.0, 1.0, 0.1).is_err());
    }
}
