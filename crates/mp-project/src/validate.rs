//! Scenario validation logic.
//!
//! Checks value domains only. Variable names are resolved when the scenario
//! is assembled against the module layout.

use crate::schema::{FusionParamsDef, OscillatorParamsDef, ScenarioConfig};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No physics module configured (need fusion_params and/or oscillator_params)")]
    NoModules,
}

pub fn validate_config(config: &ScenarioConfig) -> Result<(), ValidationError> {
    validate_positive_finite("dt", config.dt)?;
    validate_finite("t_start", config.t_start)?;
    validate_finite("t_end", config.t_end)?;
    if config.t_end - config.t_start < config.dt * (1.0 - 1e-9) {
        return Err(invalid(
            "t_end",
            config.t_end,
            "must be at least one step after t_start",
        ));
    }
    if config.max_steps == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "max_steps".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    validate_finite("pid_kp", config.pid_kp)?;
    validate_finite("pid_ki", config.pid_ki)?;
    validate_finite("pid_kd", config.pid_kd)?;
    validate_positive_finite("pid_sample_interval", config.pid_sample_interval)?;
    if config.pid_sample_interval < config.dt * (1.0 - 1e-9) {
        return Err(invalid(
            "pid_sample_interval",
            config.pid_sample_interval,
            "must be at least dt",
        ));
    }
    validate_finite("pid_output_min", config.pid_output_min)?;
    validate_finite("pid_output_max", config.pid_output_max)?;
    if config.pid_output_min >= config.pid_output_max {
        return Err(invalid(
            "pid_output_max",
            config.pid_output_max,
            "must exceed pid_output_min",
        ));
    }
    if config.pid_measured.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "pid_measured".to_string(),
            value: format!("{:?}", config.pid_measured),
            reason: "must name a state variable".to_string(),
        });
    }
    validate_finite("pid_setpoint", config.pid_setpoint)?;
    validate_finite("pid_initial_output", config.pid_initial_output)?;

    if config.fusion_params.is_none() && config.oscillator_params.is_none() {
        return Err(ValidationError::NoModules);
    }
    if let Some(fusion) = &config.fusion_params {
        validate_fusion(fusion)?;
    }
    if let Some(oscillator) = &config.oscillator_params {
        validate_oscillator(oscillator)?;
    }

    for (name, value) in &config.initial_state {
        validate_finite(&format!("initial_state.{name}"), *value)?;
    }

    Ok(())
}

fn validate_fusion(params: &FusionParamsDef) -> Result<(), ValidationError> {
    validate_positive_finite("fusion_params.volume", params.volume)?;
    validate_positive_finite("fusion_params.tau_e", params.tau_e)?;
    if let Some(tau_p) = params.tau_p {
        validate_positive_finite("fusion_params.tau_p", tau_p)?;
    }
    validate_non_negative_finite("fusion_params.fuel_rate", params.fuel_rate)?;
    if !(0.0..=1.0).contains(&params.alpha_fraction) {
        return Err(invalid(
            "fusion_params.alpha_fraction",
            params.alpha_fraction,
            "must be within [0, 1]",
        ));
    }
    validate_finite("fusion_params.heating_gain", params.heating_gain)?;
    validate_non_negative_finite("fusion_params.tolerance", params.tolerance)
}

fn validate_oscillator(params: &OscillatorParamsDef) -> Result<(), ValidationError> {
    validate_positive_finite("oscillator_params.inductance", params.inductance)?;
    validate_positive_finite("oscillator_params.capacitance", params.capacitance)?;
    validate_non_negative_finite("oscillator_params.resistance", params.resistance)?;
    validate_finite("oscillator_params.control_gain", params.control_gain)?;
    if let Some(source) = &params.source {
        if source.variable.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "oscillator_params.source.variable".to_string(),
                value: format!("{:?}", source.variable),
                reason: "must name a state variable".to_string(),
            });
        }
        validate_finite("oscillator_params.source.gain", source.gain)?;
    }
    Ok(())
}

fn invalid(field: &str, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(invalid(field, value, "must be finite"));
    }
    Ok(())
}

fn validate_positive_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, value, "must be positive and finite"));
    }
    Ok(())
}

fn validate_non_negative_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, value, "must be non-negative and finite"));
    }
    Ok(())
}
