use std::collections::BTreeMap;

use mp_project::schema::*;
use mp_project::{ValidationError, load_json, save_json, validate_config};

fn base() -> ScenarioConfig {
    ScenarioConfig {
        dt: 0.01,
        t_end: 1.0,
        t_start: 0.0,
        pid_kp: 1.0,
        pid_ki: 0.5,
        pid_kd: 0.0,
        pid_sample_interval: 0.05,
        pid_output_min: 0.0,
        pid_output_max: 10.0,
        pid_measured: "E".to_string(),
        pid_setpoint: 0.144,
        pid_initial_output: 0.0,
        fusion_params: Some(FusionParamsDef {
            volume: 1.0,
            tau_e: 1.0,
            tau_p: None,
            fuel_rate: 0.0,
            alpha_fraction: 0.2,
            heating_gain: 1.0,
            tolerance: 1e-9,
        }),
        oscillator_params: Some(OscillatorParamsDef {
            inductance: 1.0,
            capacitance: 1.0,
            resistance: 0.0,
            control_gain: 0.0,
            source: Some(SourceDef {
                variable: "E".to_string(),
                gain: 0.01,
            }),
        }),
        initial_state: BTreeMap::from([
            ("n".to_string(), 1.0),
            ("E".to_string(), 0.05),
            ("q".to_string(), 0.0),
            ("i".to_string(), 0.0),
        ]),
        integrator: IntegratorDef::Rk4,
        parallel: false,
        max_steps: None,
    }
}

fn invalid_field(config: &ScenarioConfig) -> String {
    match validate_config(config) {
        Err(ValidationError::InvalidValue { field, .. }) => field,
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[test]
fn base_is_valid() {
    validate_config(&base()).unwrap();
}

#[test]
fn time_grid_rejections() {
    let mut c = base();
    c.dt = 0.0;
    assert_eq!(invalid_field(&c), "dt");

    let mut c = base();
    c.dt = f64::NAN;
    assert_eq!(invalid_field(&c), "dt");

    let mut c = base();
    c.t_end = 0.0;
    assert_eq!(invalid_field(&c), "t_end");

    let mut c = base();
    c.t_start = f64::INFINITY;
    assert_eq!(invalid_field(&c), "t_start");

    let mut c = base();
    c.max_steps = Some(0);
    assert_eq!(invalid_field(&c), "max_steps");
}

#[test]
fn controller_rejections() {
    let mut c = base();
    c.pid_kp = f64::INFINITY;
    assert_eq!(invalid_field(&c), "pid_kp");

    let mut c = base();
    c.pid_sample_interval = -0.1;
    assert_eq!(invalid_field(&c), "pid_sample_interval");

    let mut c = base();
    c.pid_sample_interval = 0.001;
    assert_eq!(invalid_field(&c), "pid_sample_interval");

    let mut c = base();
    c.pid_output_min = 10.0;
    assert_eq!(invalid_field(&c), "pid_output_max");

    let mut c = base();
    c.pid_measured = " ".to_string();
    assert_eq!(invalid_field(&c), "pid_measured");

    let mut c = base();
    c.pid_setpoint = f64::NAN;
    assert_eq!(invalid_field(&c), "pid_setpoint");
}

#[test]
fn module_rejections() {
    let mut c = base();
    c.fusion_params = None;
    c.oscillator_params = None;
    assert!(matches!(validate_config(&c), Err(ValidationError::NoModules)));

    let mut c = base();
    c.fusion_params.as_mut().unwrap().tau_e = 0.0;
    assert_eq!(invalid_field(&c), "fusion_params.tau_e");

    let mut c = base();
    c.fusion_params.as_mut().unwrap().tau_p = Some(-1.0);
    assert_eq!(invalid_field(&c), "fusion_params.tau_p");

    let mut c = base();
    c.fusion_params.as_mut().unwrap().alpha_fraction = 1.2;
    assert_eq!(invalid_field(&c), "fusion_params.alpha_fraction");

    let mut c = base();
    c.fusion_params.as_mut().unwrap().fuel_rate = -0.1;
    assert_eq!(invalid_field(&c), "fusion_params.fuel_rate");

    let mut c = base();
    c.oscillator_params.as_mut().unwrap().capacitance = 0.0;
    assert_eq!(invalid_field(&c), "oscillator_params.capacitance");

    let mut c = base();
    c.oscillator_params.as_mut().unwrap().resistance = -1.0;
    assert_eq!(invalid_field(&c), "oscillator_params.resistance");

    let mut c = base();
    c.oscillator_params.as_mut().unwrap().source = Some(SourceDef {
        variable: String::new(),
        gain: 1.0,
    });
    assert_eq!(invalid_field(&c), "oscillator_params.source.variable");
}

#[test]
fn initial_state_must_be_finite() {
    let mut c = base();
    c.initial_state.insert("q".to_string(), f64::NAN);
    assert_eq!(invalid_field(&c), "initial_state.q");
}

#[test]
fn roundtrip_json() {
    let config = base();
    let path = std::env::temp_dir().join("mp_project_roundtrip.json");
    save_json(&path, &config).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(config, loaded);
}
