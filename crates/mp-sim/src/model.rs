//! Physics module capability and the composite derivative.

use mp_core::{ControlCommand, Slot, StateLayout, StateLayoutBuilder, StateVector};
use rayon::prelude::*;

use crate::error::{SimError, SimResult};

/// Capability every pluggable physics model provides.
///
/// A module owns a contiguous slot of the composite state. It may read any
/// entry of the shared state (resolved by name in [`bind`](Self::bind)),
/// but only contributes through the `dstate` buffer it is handed.
pub trait PhysicsModule: Send + Sync {
    /// Short, stable module name (used in logs and errors).
    fn name(&self) -> &'static str;

    /// Names of the state variables this module owns, in slot order.
    fn variables(&self) -> &[&'static str];

    /// Resolve indices against the final layout.
    ///
    /// Called exactly once, before the run starts.
    fn bind(&mut self, slot: &Slot, layout: &StateLayout) -> SimResult<()>;

    /// Add this module's contribution to `dstate`.
    ///
    /// `dstate` is full-length and zeroed. Must be a pure function of the
    /// arguments.
    fn derivative(
        &self,
        t: f64,
        state: &StateVector,
        control: ControlCommand,
        dstate: &mut StateVector,
    ) -> SimResult<()>;
}

/// Fixed registry of physics modules sharing one state vector.
pub struct CompositeModel {
    layout: StateLayout,
    modules: Vec<Box<dyn PhysicsModule>>,
    parallel: bool,
}

impl std::fmt::Debug for CompositeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeModel")
            .field("layout", &self.layout)
            .field("modules", &self.module_names())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl CompositeModel {
    /// Build the layout from the modules, in the given order, and bind them.
    pub fn new(mut modules: Vec<Box<dyn PhysicsModule>>) -> SimResult<Self> {
        if modules.is_empty() {
            return Err(SimError::InvalidArg {
                what: "at least one physics module is required",
            });
        }

        let mut builder = StateLayoutBuilder::new();
        let mut slots = Vec::with_capacity(modules.len());
        for module in &modules {
            slots.push(builder.add_module(module.name(), module.variables())?);
        }
        let layout = builder.build()?;

        for (module, slot) in modules.iter_mut().zip(&slots) {
            module.bind(slot, &layout)?;
        }

        Ok(Self {
            layout,
            modules,
            parallel: false,
        })
    }

    /// Evaluate module contributions on the rayon pool.
    ///
    /// Contributions are still summed in registry order, so results are
    /// bit-identical to sequential evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Composite right-hand side: sum of every module's contribution.
    pub fn derivative(
        &self,
        t: f64,
        state: &StateVector,
        control: ControlCommand,
    ) -> SimResult<StateVector> {
        self.layout.check_dim(state)?;
        let dim = self.layout.dim();

        let contribute = |module: &Box<dyn PhysicsModule>| -> SimResult<StateVector> {
            let mut dstate = StateVector::zeros(dim);
            module.derivative(t, state, control, &mut dstate)?;
            Ok(dstate)
        };

        let contributions: Vec<SimResult<StateVector>> = if self.parallel {
            self.modules.par_iter().map(contribute).collect()
        } else {
            self.modules.iter().map(contribute).collect()
        };

        let mut total = StateVector::zeros(dim);
        for contribution in contributions {
            total.accumulate(&contribution?);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::VarId;

    /// dx/dt = rate * x + control
    struct Growth {
        name: &'static str,
        vars: [&'static str; 1],
        rate: f64,
        x: Option<VarId>,
    }

    impl Growth {
        fn boxed(name: &'static str, var: &'static str, rate: f64) -> Box<dyn PhysicsModule> {
            Box::new(Self {
                name,
                vars: [var],
                rate,
                x: None,
            })
        }
    }

    impl PhysicsModule for Growth {
        fn name(&self) -> &'static str {
            self.name
        }

        fn variables(&self) -> &[&'static str] {
            &self.vars
        }

        fn bind(&mut self, slot: &Slot, _layout: &StateLayout) -> SimResult<()> {
            self.x = Some(slot.var(0));
            Ok(())
        }

        fn derivative(
            &self,
            _t: f64,
            state: &StateVector,
            control: ControlCommand,
            dstate: &mut StateVector,
        ) -> SimResult<()> {
            let x = self.x.ok_or(SimError::InvalidArg { what: "unbound" })?;
            dstate.set(x, self.rate * state.get(x) + control.value());
            Ok(())
        }
    }

    #[test]
    fn contributions_are_concatenated_in_registry_order() {
        let model = CompositeModel::new(vec![
            Growth::boxed("a", "x", -1.0),
            Growth::boxed("b", "y", 2.0),
        ])
        .unwrap();
        assert_eq!(model.layout().names(), &["x", "y"]);

        let state = StateVector::from(vec![1.0, 3.0]);
        let d = model.derivative(0.0, &state, ControlCommand(0.5)).unwrap();
        assert_eq!(d.as_slice(), &[-0.5, 6.5]);
    }

    #[test]
    fn parallel_matches_sequential_bitwise() {
        let build = |parallel| {
            CompositeModel::new(vec![
                Growth::boxed("a", "x", -0.3),
                Growth::boxed("b", "y", 0.7),
                Growth::boxed("c", "z", 1.1),
            ])
            .unwrap()
            .with_parallel(parallel)
        };
        let state = StateVector::from(vec![0.1, 0.2, 0.3]);
        let seq = build(false).derivative(1.0, &state, ControlCommand(0.01)).unwrap();
        let par = build(true).derivative(1.0, &state, ControlCommand(0.01)).unwrap();
        let bits = |v: &StateVector| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&seq), bits(&par));
    }

    #[test]
    fn duplicate_variables_rejected() {
        let err = CompositeModel::new(vec![
            Growth::boxed("a", "x", 1.0),
            Growth::boxed("b", "x", 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, SimError::Layout(_)));
    }

    #[test]
    fn empty_registry_rejected() {
        assert!(CompositeModel::new(Vec::new()).is_err());
    }

    #[test]
    fn wrong_dimension_rejected() {
        let model = CompositeModel::new(vec![Growth::boxed("a", "x", 1.0)]).unwrap();
        let state = StateVector::zeros(2);
        assert!(model.derivative(0.0, &state, ControlCommand(0.0)).is_err());
    }
}
