//! Driven electromagnetic mode modelled as a series RLC circuit.
//!
//! State: `q` (charge) and `i` (current).
//!
//! ```text
//! dq/dt = i
//! di/dt = -q/(L·C) - (R/L)·i + (g_u·u + g_s·x_src)/L
//! ```
//!
//! `x_src` is an optional entry of the shared state, e.g. the fusion stored
//! energy, resolved by name when the module is bound.

use mp_core::{ControlCommand, Slot, StateLayout, StateVector, VarId};
use mp_sim::{PhysicsModule, SimError, SimResult};

const NAME: &str = "oscillator";
const VARIABLES: [&str; 2] = ["q", "i"];

/// Drive taken from another state variable.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceCoupling {
    /// Name of the driving state variable.
    pub variable: String,
    /// Driving voltage per unit of the source variable.
    pub gain: f64,
}

/// Immutable parameters of [`OscillatorModel`].
#[derive(Clone, Debug, PartialEq)]
pub struct OscillatorParams {
    /// Inductance L (> 0).
    pub inductance: f64,
    /// Capacitance C (> 0).
    pub capacitance: f64,
    /// Resistance R (>= 0).
    pub resistance: f64,
    /// Driving voltage per unit of control command.
    pub control_gain: f64,
    pub source: Option<SourceCoupling>,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            inductance: 1.0,
            capacitance: 1.0,
            resistance: 0.0,
            control_gain: 0.0,
            source: None,
        }
    }
}

impl OscillatorParams {
    /// Unit-inductance circuit with natural frequency `omega` (rad/s) and
    /// damping rate `gamma` (1/s).
    pub fn from_frequency(omega: f64, gamma: f64) -> SimResult<Self> {
        if !(omega.is_finite() && omega > 0.0) {
            return Err(SimError::InvalidArg {
                what: "oscillator omega must be positive",
            });
        }
        let params = Self {
            capacitance: 1.0 / (omega * omega),
            resistance: gamma,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> SimResult<()> {
        let invalid = |what| Err(SimError::InvalidArg { what });
        if !(self.inductance.is_finite() && self.inductance > 0.0) {
            return invalid("oscillator inductance must be positive");
        }
        if !(self.capacitance.is_finite() && self.capacitance > 0.0) {
            return invalid("oscillator capacitance must be positive");
        }
        if !(self.resistance.is_finite() && self.resistance >= 0.0) {
            return invalid("oscillator resistance must be non-negative");
        }
        if !self.control_gain.is_finite() {
            return invalid("oscillator control_gain must be finite");
        }
        if self.source.as_ref().is_some_and(|s| !s.gain.is_finite()) {
            return invalid("oscillator source gain must be finite");
        }
        Ok(())
    }

    /// Undamped natural frequency 1/sqrt(LC) (rad/s).
    pub fn natural_frequency(&self) -> f64 {
        (self.inductance * self.capacitance).sqrt().recip()
    }
}

#[derive(Clone, Copy, Debug)]
struct Bound {
    q: VarId,
    i: VarId,
    source: Option<VarId>,
}

/// Series RLC oscillator.
#[derive(Clone, Debug)]
pub struct OscillatorModel {
    params: OscillatorParams,
    bound: Option<Bound>,
}

impl OscillatorModel {
    pub fn new(params: OscillatorParams) -> SimResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            bound: None,
        })
    }

    pub fn params(&self) -> &OscillatorParams {
        &self.params
    }

    /// Stored energy q²/2C + L·i²/2.
    pub fn energy(&self, q: f64, i: f64) -> f64 {
        q * q / (2.0 * self.params.capacitance) + 0.5 * self.params.inductance * i * i
    }

    /// Stored energy read from a composite state.
    pub fn energy_of(&self, state: &StateVector) -> SimResult<f64> {
        let bound = self.bound()?;
        Ok(self.energy(state.get(bound.q), state.get(bound.i)))
    }

    fn bound(&self) -> SimResult<Bound> {
        self.bound.ok_or(SimError::InvalidArg {
            what: "oscillator used before bind",
        })
    }
}

impl PhysicsModule for OscillatorModel {
    fn name(&self) -> &'static str {
        NAME
    }

    fn variables(&self) -> &[&'static str] {
        &VARIABLES
    }

    fn bind(&mut self, slot: &Slot, layout: &StateLayout) -> SimResult<()> {
        let source = match &self.params.source {
            Some(source) => Some(layout.require(&source.variable)?),
            None => None,
        };
        self.bound = Some(Bound {
            q: slot.var(0),
            i: slot.var(1),
            source,
        });
        Ok(())
    }

    fn derivative(
        &self,
        _t: f64,
        state: &StateVector,
        control: ControlCommand,
        dstate: &mut StateVector,
    ) -> SimResult<()> {
        let bound = self.bound()?;
        let p = &self.params;
        let q = state.get(bound.q);
        let i = state.get(bound.i);

        let mut voltage = p.control_gain * control.value();
        if let (Some(id), Some(source)) = (bound.source, &p.source) {
            voltage += source.gain * state.get(id);
        }

        dstate.set(bound.q, i);
        dstate.set(
            bound.i,
            -q / (p.inductance * p.capacitance) - (p.resistance / p.inductance) * i
                + voltage / p.inductance,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::StateLayoutBuilder;

    fn bound(params: OscillatorParams) -> OscillatorModel {
        let mut module = OscillatorModel::new(params).unwrap();
        let mut builder = StateLayoutBuilder::new();
        let slot = builder.add_module(NAME, &VARIABLES).unwrap();
        let layout = builder.build().unwrap();
        module.bind(&slot, &layout).unwrap();
        module
    }

    #[test]
    fn free_oscillation_derivative() {
        let module = bound(OscillatorParams {
            inductance: 2.0,
            capacitance: 0.5,
            resistance: 0.4,
            control_gain: 3.0,
            source: None,
        });
        let state = StateVector::from(vec![1.0, 2.0]);
        let mut d = StateVector::zeros(2);
        module
            .derivative(0.0, &state, ControlCommand(1.0), &mut d)
            .unwrap();
        assert_eq!(d[0], 2.0);
        // -1/1 - 0.2*2 + 3/2
        assert!((d[1] - 0.1).abs() < 1e-15);
    }

    #[test]
    fn source_coupling_reads_shared_state() {
        let mut module = OscillatorModel::new(OscillatorParams {
            source: Some(SourceCoupling {
                variable: "E".to_string(),
                gain: 0.5,
            }),
            ..OscillatorParams::default()
        })
        .unwrap();
        let mut builder = StateLayoutBuilder::new();
        builder.add_module("fusion0d", &["n", "E"]).unwrap();
        let slot = builder.add_module(NAME, &VARIABLES).unwrap();
        let layout = builder.build().unwrap();
        module.bind(&slot, &layout).unwrap();

        let state = StateVector::from(vec![1.0, 4.0, 0.0, 0.0]);
        let mut d = StateVector::zeros(4);
        module
            .derivative(0.0, &state, ControlCommand(0.0), &mut d)
            .unwrap();
        assert_eq!(d.as_slice(), &[0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn unknown_source_fails_to_bind() {
        let mut module = OscillatorModel::new(OscillatorParams {
            source: Some(SourceCoupling {
                variable: "missing".to_string(),
                gain: 1.0,
            }),
            ..OscillatorParams::default()
        })
        .unwrap();
        let mut builder = StateLayoutBuilder::new();
        let slot = builder.add_module(NAME, &VARIABLES).unwrap();
        let layout = builder.build().unwrap();
        assert!(matches!(
            module.bind(&slot, &layout),
            Err(SimError::Layout(_))
        ));
    }

    #[test]
    fn energy_and_frequency() {
        let params = OscillatorParams::from_frequency(2.0, 0.05).unwrap();
        assert!((params.natural_frequency() - 2.0).abs() < 1e-12);
        let module = bound(params);
        let state = StateVector::from(vec![1.0, 2.0]);
        // q²/2C = 2, L·i²/2 = 2
        assert!((module.energy_of(&state).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(OscillatorParams::from_frequency(0.0, 0.1).is_err());
        assert!(
            OscillatorModel::new(OscillatorParams {
                resistance: -1.0,
                ..OscillatorParams::default()
            })
            .is_err()
        );
        assert!(
            OscillatorModel::new(OscillatorParams {
                capacitance: 0.0,
                ..OscillatorParams::default()
            })
            .is_err()
        );
    }
}
