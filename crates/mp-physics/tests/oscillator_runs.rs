//! Integration tests: oscillator energy conservation and divergence detection.

use mp_core::StateVector;
use mp_physics::{OscillatorModel, OscillatorParams, SourceCoupling};
use mp_sim::{CompositeModel, PhysicsModule, SimError, SimOptions, Simulation, StopToken};

fn oscillator_sim(params: OscillatorParams, t_end: f64) -> Simulation {
    let module: Box<dyn PhysicsModule> = Box::new(OscillatorModel::new(params).unwrap());
    let model = CompositeModel::new(vec![module]).unwrap();
    let opts = SimOptions {
        dt: 0.01,
        t_end,
        ..SimOptions::default()
    };
    Simulation::new(model, None, StateVector::from(vec![1.0, 0.0]), opts).unwrap()
}

#[test]
fn undamped_oscillator_conserves_energy() {
    let params = OscillatorParams::default();
    let reference = OscillatorModel::new(params.clone()).unwrap();
    let sim = oscillator_sim(params, 10.0);

    let report = sim.run(&StopToken::new()).unwrap();
    assert_eq!(report.trajectory.len(), 1000);

    let e0 = reference.energy(1.0, 0.0);
    let max_drift = report
        .trajectory
        .rows()
        .iter()
        .map(|row| (reference.energy(row.state[0], row.state[1]) - e0).abs() / e0)
        .fold(0.0, f64::max);
    assert!(max_drift < 1e-4, "relative energy drift = {max_drift}");
}

#[test]
fn damped_oscillator_loses_energy() {
    let params = OscillatorParams::from_frequency(2.0, 0.05).unwrap();
    let reference = OscillatorModel::new(params.clone()).unwrap();
    let sim = oscillator_sim(params, 10.0);

    let report = sim.run(&StopToken::new()).unwrap();
    let last = report.trajectory.last().unwrap();
    let e0 = reference.energy(1.0, 0.0);
    let e1 = reference.energy(last.state[0], last.state[1]);
    assert!(e1 < e0);
}

#[test]
fn self_excited_oscillator_diverges() {
    let params = OscillatorParams {
        source: Some(SourceCoupling {
            variable: "i".to_string(),
            gain: 200.0,
        }),
        ..OscillatorParams::default()
    };
    let sim = oscillator_sim(params, 10.0);

    let failure = sim.run(&StopToken::new()).unwrap_err();
    assert!(matches!(failure.error, SimError::NumericalDivergence { .. }));
    assert!(failure.error.is_numerical());

    let traj = &failure.trajectory;
    assert!(!traj.is_empty());
    assert!(failure.step < sim.total_steps());
    assert_eq!(failure.step, traj.len() as u64 + 1);
    assert!((failure.t - failure.step as f64 * 0.01).abs() < 1e-9);
    for row in traj.rows() {
        assert!(row.state.first_non_finite().is_none(), "row {}", row.step);
    }
}
