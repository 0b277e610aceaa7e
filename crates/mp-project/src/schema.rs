//! Scenario file schema.
//!
//! A scenario is a single flat document (YAML or JSON). Unknown keys are
//! rejected so that typos fail loudly instead of silently using defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Fixed integration step (s).
    pub dt: f64,
    pub t_end: f64,
    #[serde(default)]
    pub t_start: f64,

    pub pid_kp: f64,
    pub pid_ki: f64,
    pub pid_kd: f64,
    /// Controller sample period (s), at least `dt`.
    pub pid_sample_interval: f64,
    pub pid_output_min: f64,
    pub pid_output_max: f64,
    /// State variable fed back to the controller.
    pub pid_measured: String,
    pub pid_setpoint: f64,
    /// Command held until the first sample.
    #[serde(default)]
    pub pid_initial_output: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion_params: Option<FusionParamsDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oscillator_params: Option<OscillatorParamsDef>,

    /// Initial value of every state variable, by name.
    pub initial_state: BTreeMap<String, f64>,

    #[serde(default)]
    pub integrator: IntegratorDef,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FusionParamsDef {
    #[serde(default = "default_volume")]
    pub volume: f64,
    pub tau_e: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tau_p: Option<f64>,
    #[serde(default)]
    pub fuel_rate: f64,
    #[serde(default = "default_alpha_fraction")]
    pub alpha_fraction: f64,
    #[serde(default = "default_heating_gain")]
    pub heating_gain: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OscillatorParamsDef {
    pub inductance: f64,
    pub capacitance: f64,
    #[serde(default)]
    pub resistance: f64,
    #[serde(default)]
    pub control_gain: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceDef>,
}

/// Oscillator drive taken from another state variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceDef {
    pub variable: String,
    pub gain: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorDef {
    #[default]
    Rk4,
    ForwardEuler,
}

fn default_volume() -> f64 {
    1.0
}

fn default_alpha_fraction() -> f64 {
    0.2
}

fn default_heating_gain() -> f64 {
    1.0
}

fn default_tolerance() -> f64 {
    1e-9
}
