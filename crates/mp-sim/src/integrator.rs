//! Fixed-step time integrators.
//!
//! Integrators only see a derivative function `f(t, x) -> dx/dt` over a
//! dense [`StateVector`]; they never inspect what the components mean.

use mp_core::StateVector;

use crate::error::{SimError, SimResult};

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step.
    ///
    /// Fails with [`SimError::NumericalDivergence`] if any component of the
    /// new state is not finite.
    fn step<F>(&self, f: &mut F, t: f64, x: &StateVector, dt: f64) -> SimResult<StateVector>
    where
        F: FnMut(f64, &StateVector) -> SimResult<StateVector>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<F>(&self, f: &mut F, t: f64, x: &StateVector, dt: f64) -> SimResult<StateVector>
    where
        F: FnMut(f64, &StateVector) -> SimResult<StateVector>,
    {
        let k1 = f(t, x)?;

        let x2 = x.add_scaled(&k1, 0.5 * dt);
        let k2 = f(t + 0.5 * dt, &x2)?;

        let x3 = x.add_scaled(&k2, 0.5 * dt);
        let k3 = f(t + 0.5 * dt, &x3)?;

        let x4 = x.add_scaled(&k3, dt);
        let k4 = f(t + dt, &x4)?;

        // Combine: x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = k1
            .add_scaled(&k2, 2.0)
            .add_scaled(&k3, 2.0)
            .add_scaled(&k4, 1.0);

        ensure_finite_state(t + dt, x.add_scaled(&k_sum, dt / 6.0))
    }
}

/// Forward Euler (explicit, 1st order).
/// Calls the derivative once per step instead of 4 times (RK4).
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<F>(&self, f: &mut F, t: f64, x: &StateVector, dt: f64) -> SimResult<StateVector>
    where
        F: FnMut(f64, &StateVector) -> SimResult<StateVector>,
    {
        let xdot = f(t, x)?;
        ensure_finite_state(t + dt, x.add_scaled(&xdot, dt))
    }
}

/// One RK4 step of `f` from `(t, x)`.
pub fn rk4_step<F>(f: F, t: f64, x: &StateVector, dt: f64) -> SimResult<StateVector>
where
    F: FnMut(f64, &StateVector) -> SimResult<StateVector>,
{
    let mut f = f;
    RK4.step(&mut f, t, x, dt)
}

fn ensure_finite_state(t: f64, x: StateVector) -> SimResult<StateVector> {
    match x.first_non_finite() {
        Some((index, value)) => Err(SimError::NumericalDivergence { t, index, value }),
        None => Ok(x),
    }
}
