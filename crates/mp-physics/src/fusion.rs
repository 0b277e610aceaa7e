//! Zero-dimensional D-T plasma balance.
//!
//! State: `n` (fuel ion density, 1e20 m⁻³) and `E` (stored thermal energy, MJ).
//! The temperature is not a state variable; it is derived from the closure
//! `T = E / (3·n·V·κ)` with `κ` = [`KEV_MJ`].
//!
//! ```text
//! dn/dt = S_fuel - n/τ_p
//! dE/dt = f_α·P_fus(n, T) - E/τ_E + g_aux·u
//! P_fus = (n/2)²·⟨σv⟩(T)·E_fus·V
//! ```

use mp_core::{ControlCommand, Slot, StateLayout, StateVector, VarId};
use mp_sim::{PhysicsModule, SimError, SimResult};
use tracing::trace;

const NAME: &str = "fusion0d";
const VARIABLES: [&str; 2] = ["n", "E"];

/// Below this temperature the reactivity fit is evaluated at the floor,
/// where it is negligible.
const T_MIN_KEV: f64 = 0.1;

/// 1 keV of thermal energy per particle at 1e20 m⁻³ in 1 m³, in MJ.
pub const KEV_MJ: f64 = 1.602e-2;

/// D-T reaction energy (17.6 MeV) in J.
pub const E_FUSION_DT_J: f64 = 17.6e3 * 1.602e-16;

/// Density unit of the `n` state variable, in m⁻³.
const DENSITY_UNIT: f64 = 1e20;

/// Bosch-Hale D-T reactivity ⟨σv⟩ in m³/s.
///
/// NRL Plasma Formulary approximation:
///   σv = 3.68e-18 / T^(2/3) × exp(-19.94 / T^(1/3))
///
/// Valid for T < 100 keV. T is clamped to 0.1 keV.
pub fn bosch_hale_dt(t_kev: f64) -> f64 {
    let t = t_kev.max(T_MIN_KEV);
    3.68e-18 / t.powf(2.0 / 3.0) * (-19.94 / t.powf(1.0 / 3.0)).exp()
}

/// Immutable parameters of [`Fusion0D`].
#[derive(Clone, Debug, PartialEq)]
pub struct FusionParams {
    /// Plasma volume (m³).
    pub volume: f64,
    /// Energy confinement time (s).
    pub tau_e: f64,
    /// Particle confinement time (s). `None` disables particle loss.
    pub tau_p: Option<f64>,
    /// Fuel feed rate (1e20 m⁻³/s).
    pub fuel_rate: f64,
    /// Fraction of fusion power deposited in the plasma.
    pub alpha_fraction: f64,
    /// Auxiliary heating per unit of control command (MW).
    pub heating_gain: f64,
    /// Negative values of `n` or `T` down to `-tolerance` are clamped to 0.
    pub tolerance: f64,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            tau_e: 1.0,
            tau_p: None,
            fuel_rate: 0.0,
            alpha_fraction: 0.2,
            heating_gain: 1.0,
            tolerance: 1e-9,
        }
    }
}

impl FusionParams {
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |what| Err(SimError::InvalidArg { what });
        if !(self.volume.is_finite() && self.volume > 0.0) {
            return invalid("fusion volume must be positive");
        }
        if !(self.tau_e.is_finite() && self.tau_e > 0.0) {
            return invalid("fusion tau_e must be positive");
        }
        if self.tau_p.is_some_and(|tau_p| !(tau_p.is_finite() && tau_p > 0.0)) {
            return invalid("fusion tau_p must be positive");
        }
        if !(self.fuel_rate.is_finite() && self.fuel_rate >= 0.0) {
            return invalid("fusion fuel_rate must be non-negative");
        }
        if !(0.0..=1.0).contains(&self.alpha_fraction) {
            return invalid("fusion alpha_fraction must be within [0, 1]");
        }
        if !self.heating_gain.is_finite() {
            return invalid("fusion heating_gain must be finite");
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return invalid("fusion tolerance must be non-negative");
        }
        Ok(())
    }
}

/// Lumped plasma energy and particle balance.
#[derive(Clone, Debug)]
pub struct Fusion0D {
    params: FusionParams,
    ids: Option<(VarId, VarId)>,
}

impl Fusion0D {
    pub fn new(params: FusionParams) -> SimResult<Self> {
        params.validate()?;
        Ok(Self { params, ids: None })
    }

    pub fn params(&self) -> &FusionParams {
        &self.params
    }

    /// Temperature (keV) for density `n` and stored energy `e`.
    ///
    /// Returns `Ok(None)` when the density is zero; the closure is
    /// undefined there, but the stored energy must still be non-negative.
    pub fn temperature(&self, n: f64, e: f64) -> SimResult<Option<f64>> {
        let n = self.non_negative("density", n)?;
        if n == 0.0 {
            self.non_negative("energy", e)?;
            return Ok(None);
        }
        let t = e / (3.0 * n * self.params.volume * KEV_MJ);
        self.non_negative("temperature", t).map(Some)
    }

    /// Stored energy (MJ) that gives temperature `t_kev` at density `n`.
    pub fn stored_energy(&self, n: f64, t_kev: f64) -> f64 {
        3.0 * n * self.params.volume * KEV_MJ * t_kev
    }

    /// Total fusion power (MW) at density `n` and temperature `t_kev`.
    pub fn fusion_power(&self, n: f64, t_kev: f64) -> f64 {
        let n_fuel = 0.5 * n * DENSITY_UNIT;
        n_fuel * n_fuel * bosch_hale_dt(t_kev) * E_FUSION_DT_J * self.params.volume / 1e6
    }

    fn non_negative(&self, quantity: &'static str, value: f64) -> SimResult<f64> {
        if value >= 0.0 {
            Ok(value)
        } else if value >= -self.params.tolerance {
            trace!(module = NAME, quantity, value, "clamping to zero");
            Ok(0.0)
        } else {
            Err(SimError::UnphysicalState {
                module: NAME,
                quantity,
                value,
            })
        }
    }
}

impl PhysicsModule for Fusion0D {
    fn name(&self) -> &'static str {
        NAME
    }

    fn variables(&self) -> &[&'static str] {
        &VARIABLES
    }

    fn bind(&mut self, slot: &Slot, _layout: &StateLayout) -> SimResult<()> {
        self.ids = Some((slot.var(0), slot.var(1)));
        Ok(())
    }

    fn derivative(
        &self,
        _t: f64,
        state: &StateVector,
        control: ControlCommand,
        dstate: &mut StateVector,
    ) -> SimResult<()> {
        let (n_id, e_id) = self.ids.ok_or(SimError::InvalidArg {
            what: "fusion0d used before bind",
        })?;
        let p = &self.params;
        let n_raw = state.get(n_id);
        let e = state.get(e_id);

        let n = self.non_negative("density", n_raw)?;
        let p_fus = match self.temperature(n, e)? {
            Some(t) => self.fusion_power(n, t),
            None => 0.0,
        };

        let particle_loss = p.tau_p.map_or(0.0, |tau_p| n / tau_p);
        dstate.set(n_id, p.fuel_rate - particle_loss);
        dstate.set(
            e_id,
            p.alpha_fraction * p_fus - e / p.tau_e + p.heating_gain * control.value(),
        );
        Ok(())
    }
}
