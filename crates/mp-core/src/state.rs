//! Composite state layout and dense state vector.
//!
//! Every physics module registers its named scalars with a
//! [`StateLayoutBuilder`]; the resulting [`StateLayout`] fixes the dimension
//! and the name-to-index mapping for the lifetime of a run. Integrators work
//! on the plain [`StateVector`] and never look at names.

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use crate::error::{CoreError, CoreResult};
use crate::ids::{ModuleId, VarId};

/// Contiguous range of the state vector owned by one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub module: ModuleId,
    pub offset: usize,
    pub len: usize,
}

impl Slot {
    /// Global index of the module-local variable `local`.
    pub fn var(&self, local: usize) -> VarId {
        debug_assert!(local < self.len, "local index outside slot");
        VarId::from_index((self.offset + local) as u32)
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Incremental builder for a [`StateLayout`].
#[derive(Debug, Default)]
pub struct StateLayoutBuilder {
    names: Vec<String>,
    lookup: BTreeMap<String, VarId>,
    modules: Vec<(String, Slot)>,
}

impl StateLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the variables of one module, in order.
    ///
    /// Variable names are global: two modules cannot both own `q`.
    pub fn add_module(&mut self, module: &str, variables: &[&str]) -> CoreResult<Slot> {
        let offset = self.names.len();
        for (local, name) in variables.iter().enumerate() {
            if self.lookup.contains_key(*name) {
                return Err(CoreError::DuplicateVariable {
                    name: (*name).to_string(),
                    module: module.to_string(),
                });
            }
            let id = VarId::from_index((offset + local) as u32);
            self.lookup.insert((*name).to_string(), id);
            self.names.push((*name).to_string());
        }
        let slot = Slot {
            module: ModuleId::from_index(self.modules.len() as u32),
            offset,
            len: variables.len(),
        };
        self.modules.push((module.to_string(), slot.clone()));
        Ok(slot)
    }

    pub fn build(self) -> CoreResult<StateLayout> {
        if self.names.is_empty() {
            return Err(CoreError::InvalidArg {
                what: "state layout has no variables",
            });
        }
        Ok(StateLayout {
            names: self.names,
            lookup: self.lookup,
            modules: self.modules,
        })
    }
}

/// Fixed name-to-index mapping of the composite state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateLayout {
    names: Vec<String>,
    lookup: BTreeMap<String, VarId>,
    modules: Vec<(String, Slot)>,
}

impl StateLayout {
    /// Number of scalars in the composite state.
    pub fn dim(&self) -> usize {
        self.names.len()
    }

    /// Variable names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, id: VarId) -> Option<&str> {
        self.names.get(id.as_usize()).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<VarId> {
        self.lookup.get(name).copied()
    }

    /// Like [`index_of`](Self::index_of), but an unknown name is an error.
    pub fn require(&self, name: &str) -> CoreResult<VarId> {
        self.index_of(name).ok_or_else(|| CoreError::UnknownVariable {
            name: name.to_string(),
        })
    }

    /// Registered modules with their slots, in registration order.
    pub fn modules(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.modules.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    pub fn slot(&self, module: ModuleId) -> Option<&Slot> {
        self.modules.get(module.as_usize()).map(|(_, slot)| slot)
    }

    /// Pack named values into a vector ordered by this layout.
    ///
    /// Every variable must be given exactly once; unknown names are rejected.
    pub fn pack(&self, values: &BTreeMap<String, f64>) -> CoreResult<StateVector> {
        if let Some(unknown) = values.keys().find(|k| !self.lookup.contains_key(*k)) {
            return Err(CoreError::UnknownVariable {
                name: unknown.clone(),
            });
        }
        let mut packed = Vec::with_capacity(self.dim());
        for name in &self.names {
            let value = values.get(name).ok_or_else(|| CoreError::MissingValue {
                name: name.clone(),
            })?;
            packed.push(*value);
        }
        Ok(StateVector::from(packed))
    }

    /// Unpack a vector into a name-ordered map.
    pub fn unpack(&self, state: &StateVector) -> CoreResult<BTreeMap<String, f64>> {
        self.check_dim(state)?;
        Ok(self
            .names
            .iter()
            .cloned()
            .zip(state.iter().copied())
            .collect())
    }

    pub fn check_dim(&self, state: &StateVector) -> CoreResult<()> {
        if state.len() != self.dim() {
            return Err(CoreError::DimensionMismatch {
                expected: self.dim(),
                found: state.len(),
            });
        }
        Ok(())
    }

    /// Dimension check plus finiteness of every component.
    pub fn check_state(&self, state: &StateVector) -> CoreResult<()> {
        self.check_dim(state)?;
        match state.first_non_finite() {
            Some((index, value)) => Err(CoreError::NonFinite {
                name: self.names[index].clone(),
                value,
            }),
            None => Ok(()),
        }
    }
}

/// Dense composite state (or state derivative).
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateVector {
    values: Vec<f64>,
}

impl StateVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            values: vec![0.0; dim],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    pub fn get(&self, id: VarId) -> f64 {
        self.values[id.as_usize()]
    }

    pub fn set(&mut self, id: VarId, value: f64) {
        self.values[id.as_usize()] = value;
    }

    /// `self + scale * other`, element-wise.
    pub fn add_scaled(&self, other: &StateVector, scale: f64) -> StateVector {
        debug_assert_eq!(self.len(), other.len());
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a + scale * b)
            .collect()
    }

    /// In-place element-wise sum.
    pub fn accumulate(&mut self, other: &StateVector) {
        debug_assert_eq!(self.len(), other.len());
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a += b;
        }
    }

    /// First component that is NaN or infinite, with its index.
    pub fn first_non_finite(&self) -> Option<(usize, f64)> {
        self.values
            .iter()
            .copied()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl From<Vec<f64>> for StateVector {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

impl FromIterator<f64> for StateVector {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Index<usize> for StateVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl IndexMut<usize> for StateVector {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.values[index]
    }
}

/// Controller output fed to every physics module.
///
/// Held constant between controller samples (zero-order hold).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlCommand(pub f64);

impl ControlCommand {
    /// Output column names, one per component.
    pub const COLUMNS: &'static [&'static str] = &["u"];

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn components(self) -> [f64; 1] {
        [self.0]
    }
}

impl From<f64> for ControlCommand {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
