//! Coupling driver: simulation clock, sampled control and result recording.

use mp_controls::{MeasuredVariable, PIDController, PidLoop};
use mp_core::{ControlCommand, StateLayout, StateVector, steps_to_cover};
use tracing::{debug, info, warn};

use crate::cancel::StopToken;
use crate::error::{SimError, SimResult};
use crate::integrator::{ForwardEuler, Integrator, RK4};
use crate::model::CompositeModel;
use crate::trajectory::{Snapshot, Trajectory};

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorKind {
    /// 4th-order Runge-Kutta (default, 4 derivative calls per step).
    #[default]
    RK4,
    /// Forward Euler (1st-order, 1 derivative call per step).
    ForwardEuler,
}

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Initial simulation time (seconds)
    pub t_start: f64,
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: u64,
    /// Integrator type (default: RK4)
    pub integrator: IntegratorKind,
    /// Evaluate physics modules on the rayon pool
    pub parallel: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            t_start: 0.0,
            dt: 1e-3,
            t_end: 1.0,
            max_steps: 10_000_000,
            integrator: IntegratorKind::default(),
            parallel: false,
        }
    }
}

impl SimOptions {
    /// Number of fixed steps from `t_start` to `t_end`.
    pub fn total_steps(&self) -> u64 {
        steps_to_cover(self.t_end - self.t_start, self.dt)
    }

    fn validate(&self) -> SimResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !(self.t_start.is_finite() && self.t_end.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "t_start and t_end must be finite",
            });
        }
        if self.t_end - self.t_start < self.dt * (1.0 - 1e-9) {
            return Err(SimError::InvalidArg {
                what: "horizon must be at least one step",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.total_steps() > self.max_steps {
            return Err(SimError::InvalidArg {
                what: "horizon needs more than max_steps steps",
            });
        }
        Ok(())
    }
}

/// Feedback loop closed around the composite model.
#[derive(Clone, Debug)]
pub struct ControlLoop {
    pub pid: PIDController,
    /// Plant variable fed back to the controller.
    pub measured: MeasuredVariable,
    pub setpoint: f64,
    /// Command held before the first sample.
    pub initial_output: f64,
}

/// Why a run stopped without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Time horizon reached.
    Completed,
    /// Stop requested through the [`StopToken`].
    Cancelled,
}

/// Result of a run that did not fail.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub trajectory: Trajectory,
    pub termination: Termination,
    /// Accepted steps.
    pub steps: u64,
    /// Controller samples taken.
    pub samples: u64,
}

/// A failed run, with every step accepted before the failure.
#[derive(thiserror::Error, Debug, Clone)]
#[error("step {step} (t = {t}) failed: {error}")]
pub struct SimFailure {
    #[source]
    pub error: SimError,
    /// Index the failing step would have had.
    pub step: u64,
    /// End time of the failing step.
    pub t: f64,
    pub trajectory: Trajectory,
}

/// Progress snapshot, emitted once per step boundary.
#[derive(Clone, Debug)]
pub struct SimProgress {
    pub step: u64,
    pub total_steps: u64,
    pub t: f64,
    pub t_end: f64,
    pub fraction_complete: f64,
}

/// A fully assembled run: model, optional controller, initial state, options.
#[derive(Debug)]
pub struct Simulation {
    model: CompositeModel,
    control: Option<ControlLoop>,
    initial_state: StateVector,
    options: SimOptions,
}

impl Simulation {
    /// Validate everything up front so that `run` can only fail numerically.
    pub fn new(
        model: CompositeModel,
        control: Option<ControlLoop>,
        initial_state: StateVector,
        options: SimOptions,
    ) -> SimResult<Self> {
        options.validate()?;
        model.layout().check_state(&initial_state)?;

        let model = model.with_parallel(options.parallel);

        let control = match control {
            Some(mut control) => {
                control.measured.resolve(model.layout())?;
                if !(control.setpoint.is_finite() && control.initial_output.is_finite()) {
                    return Err(SimError::InvalidArg {
                        what: "setpoint and initial output must be finite",
                    });
                }
                let probe = PidLoop::new(control.pid.clone(), options.dt, control.initial_output)?;
                if !probe.clock().is_aligned(options.dt) {
                    warn!(
                        sample_period = control.pid.sample_period,
                        dt = options.dt,
                        stride = probe.clock().stride(),
                        "controller sample period is not a multiple of dt"
                    );
                }
                Some(control)
            }
            None => None,
        };

        Ok(Self {
            model,
            control,
            initial_state,
            options,
        })
    }

    pub fn layout(&self) -> &StateLayout {
        self.model.layout()
    }

    pub fn model(&self) -> &CompositeModel {
        &self.model
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    pub fn initial_state(&self) -> &StateVector {
        &self.initial_state
    }

    pub fn total_steps(&self) -> u64 {
        self.options.total_steps()
    }

    /// Run to the horizon, or until `stop` is requested.
    pub fn run(&self, stop: &StopToken) -> Result<RunReport, SimFailure> {
        self.run_with_progress(stop, None)
    }

    /// Run with an optional progress callback.
    ///
    /// Every run starts from fresh controller state, so calling this twice
    /// yields identical trajectories.
    pub fn run_with_progress(
        &self,
        stop: &StopToken,
        mut progress: Option<&mut dyn FnMut(&SimProgress)>,
    ) -> Result<RunReport, SimFailure> {
        let opts = &self.options;
        let dt = opts.dt;
        let total_steps = self.total_steps();
        let layout = self.model.layout();

        let initial_output = self
            .control
            .as_ref()
            .map_or(0.0, |control| control.initial_output);
        let mut x = self.initial_state.clone();
        let mut trajectory = Trajectory::new(
            layout,
            Snapshot {
                step: 0,
                t: opts.t_start,
                state: x.clone(),
                control: ControlCommand(initial_output),
            },
        );

        let mut pid = match &self.control {
            Some(control) => match PidLoop::new(control.pid.clone(), dt, initial_output) {
                Ok(pid) => Some(pid),
                Err(e) => return Err(failure(e.into(), 0, opts.t_start, trajectory)),
            },
            None => None,
        };

        info!(
            modules = ?self.model.module_names(),
            dim = layout.dim(),
            dt,
            steps = total_steps,
            integrator = ?opts.integrator,
            "starting run"
        );

        for k in 0..total_steps {
            let t = opts.t_start + k as f64 * dt;

            if stop.is_stop_requested() {
                info!(step = k, t, "stop requested, halting run");
                return Ok(self.report(trajectory, Termination::Cancelled, pid.as_ref()));
            }

            // (a) sample the controller if due
            if let (Some(pid), Some(control)) = (pid.as_mut(), self.control.as_ref()) {
                if pid.is_due(k) {
                    let measured = match control.measured.read(&x) {
                        Ok(value) => value,
                        Err(e) => return Err(failure(e.into(), k + 1, t, trajectory)),
                    };
                    if let Some(command) = pid.poll(k, measured, control.setpoint) {
                        debug!(
                            step = k,
                            t,
                            measured,
                            u = command.value(),
                            integral = pid.state().integral,
                            "controller sample"
                        );
                    }
                }
            }

            // (b) + (c) composite derivative under the held command
            let held = pid
                .as_ref()
                .map_or(ControlCommand(initial_output), PidLoop::held);
            let mut rhs =
                |tau: f64, y: &StateVector| self.model.derivative(tau, y, held);
            let stepped = match opts.integrator {
                IntegratorKind::RK4 => RK4.step(&mut rhs, t, &x, dt),
                IntegratorKind::ForwardEuler => ForwardEuler.step(&mut rhs, t, &x, dt),
            };

            // (d) advance the clock
            let step = k + 1;
            let t_next = opts.t_start + step as f64 * dt;
            x = match stepped {
                Ok(next) => next,
                Err(error) => {
                    self.log_failure(&error, step, t_next);
                    return Err(failure(error, step, t_next, trajectory));
                }
            };

            // (e) record
            trajectory.push(Snapshot {
                step,
                t: t_next,
                state: x.clone(),
                control: held,
            });

            if let Some(cb) = progress.as_mut() {
                cb(&SimProgress {
                    step,
                    total_steps,
                    t: t_next,
                    t_end: opts.t_end,
                    fraction_complete: step as f64 / total_steps as f64,
                });
            }
        }

        info!(steps = total_steps, t = trajectory.last_time(), "run completed");
        Ok(self.report(trajectory, Termination::Completed, pid.as_ref()))
    }

    fn report(
        &self,
        trajectory: Trajectory,
        termination: Termination,
        pid: Option<&PidLoop>,
    ) -> RunReport {
        RunReport {
            steps: trajectory.len() as u64,
            samples: pid.map_or(0, PidLoop::samples),
            trajectory,
            termination,
        }
    }

    fn log_failure(&self, error: &SimError, step: u64, t: f64) {
        match error {
            SimError::NumericalDivergence { index, value, .. } => {
                let variable = self
                    .model
                    .layout()
                    .names()
                    .get(*index)
                    .map_or("?", String::as_str);
                warn!(step, t, variable, value, "numerical divergence");
            }
            SimError::UnphysicalState {
                module,
                quantity,
                value,
            } => {
                warn!(step, t, module, quantity, value, "unphysical state");
            }
            other => warn!(step, t, error = %other, "step failed"),
        }
    }
}

fn failure(error: SimError, step: u64, t: f64, trajectory: Trajectory) -> SimFailure {
    SimFailure {
        error,
        step,
        t,
        trajectory,
    }
}
