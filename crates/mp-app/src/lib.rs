//! Shared application service layer for the multiphysics engine.
//!
//! Turns a scenario file into an assembled [`mp_sim::Simulation`], runs it,
//! and writes the results. The CLI is a thin shell around this crate.

pub mod error;
pub mod run_service;
pub mod scenario;

pub use error::{AppError, AppResult, exit_code};
pub use run_service::{
    ENGINE_VERSION, RunRequest, RunSummary, ScenarioSummary, run_config, run_scenario,
    run_scenario_with_progress, validate_scenario,
};
pub use scenario::{build_modules, build_simulation, control_loop, sim_options};
