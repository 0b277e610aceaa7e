//! Scenario assembly: scenario file definitions to a runnable simulation.

use mp_controls::{MeasuredVariable, PIDController};
use mp_physics::{Fusion0D, FusionParams, OscillatorModel, OscillatorParams, SourceCoupling};
use mp_project::{FusionParamsDef, IntegratorDef, OscillatorParamsDef, ScenarioConfig};
use mp_sim::{
    CompositeModel, ControlLoop, IntegratorKind, PhysicsModule, SimError, SimOptions, Simulation,
};
use tracing::debug;

use crate::error::AppResult;

/// Assemble the scenario: modules, controller, initial state and options.
pub fn build_simulation(config: &ScenarioConfig) -> AppResult<Simulation> {
    let model = CompositeModel::new(build_modules(config)?)?;
    debug!(variables = ?model.layout().names(), "state layout");

    let initial_state = model
        .layout()
        .pack(&config.initial_state)
        .map_err(SimError::from)?;

    let simulation = Simulation::new(
        model,
        Some(control_loop(config)?),
        initial_state,
        sim_options(config),
    )?;
    Ok(simulation)
}

/// Physics modules in registry order: fusion first, then the oscillator.
pub fn build_modules(config: &ScenarioConfig) -> AppResult<Vec<Box<dyn PhysicsModule>>> {
    let mut modules: Vec<Box<dyn PhysicsModule>> = Vec::new();
    if let Some(def) = &config.fusion_params {
        modules.push(Box::new(Fusion0D::new(fusion_params(def))?));
    }
    if let Some(def) = &config.oscillator_params {
        modules.push(Box::new(OscillatorModel::new(oscillator_params(def))?));
    }
    Ok(modules)
}

pub fn control_loop(config: &ScenarioConfig) -> AppResult<ControlLoop> {
    let pid = PIDController::new(
        config.pid_kp,
        config.pid_ki,
        config.pid_kd,
        config.pid_output_min,
        config.pid_output_max,
        config.pid_sample_interval,
    )
    .map_err(SimError::from)?;
    Ok(ControlLoop {
        pid,
        measured: MeasuredVariable::new(config.pid_measured.clone()),
        setpoint: config.pid_setpoint,
        initial_output: config.pid_initial_output,
    })
}

pub fn sim_options(config: &ScenarioConfig) -> SimOptions {
    let defaults = SimOptions::default();
    SimOptions {
        t_start: config.t_start,
        dt: config.dt,
        t_end: config.t_end,
        max_steps: config.max_steps.unwrap_or(defaults.max_steps),
        integrator: match config.integrator {
            IntegratorDef::Rk4 => IntegratorKind::RK4,
            IntegratorDef::ForwardEuler => IntegratorKind::ForwardEuler,
        },
        parallel: config.parallel,
    }
}

fn fusion_params(def: &FusionParamsDef) -> FusionParams {
    FusionParams {
        volume: def.volume,
        tau_e: def.tau_e,
        tau_p: def.tau_p,
        fuel_rate: def.fuel_rate,
        alpha_fraction: def.alpha_fraction,
        heating_gain: def.heating_gain,
        tolerance: def.tolerance,
    }
}

fn oscillator_params(def: &OscillatorParamsDef) -> OscillatorParams {
    OscillatorParams {
        inductance: def.inductance,
        capacitance: def.capacitance,
        resistance: def.resistance,
        control_gain: def.control_gain,
        source: def.source.as_ref().map(|source| SourceCoupling {
            variable: source.variable.clone(),
            gain: source.gain,
        }),
    }
}
