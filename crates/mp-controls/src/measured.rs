//! Measured variable references for control loops.
//!
//! A measured variable names a scalar of the composite plant state. The
//! name is resolved once against the [`StateLayout`] before the run starts;
//! reading it afterwards is a plain index into the state vector.

use mp_core::{StateLayout, StateVector, VarId};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Plant state variable observed by a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasuredVariable {
    /// Name of the state variable.
    pub name: String,
    #[serde(skip)]
    id: Option<VarId>,
}

impl MeasuredVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    /// Resolve the name against the plant layout.
    pub fn resolve(&mut self, layout: &StateLayout) -> ControlResult<VarId> {
        let id = layout
            .index_of(&self.name)
            .ok_or_else(|| ControlError::InvalidReference {
                what: format!("'{}' is not a state variable", self.name),
            })?;
        self.id = Some(id);
        Ok(id)
    }

    /// Read the measured value from the plant state.
    pub fn read(&self, state: &StateVector) -> ControlResult<f64> {
        let id = self.id.ok_or_else(|| ControlError::InvalidReference {
            what: format!("'{}' has not been resolved", self.name),
        })?;
        state
            .as_slice()
            .get(id.as_usize())
            .copied()
            .ok_or_else(|| ControlError::InvalidReference {
                what: format!("'{}' is outside the state vector", self.name),
            })
    }
}
