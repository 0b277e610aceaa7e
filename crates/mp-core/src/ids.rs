use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used across the composite model.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Recover the 0-based index as `usize` for slice access.
    pub fn as_usize(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Position of a scalar in the composite state vector.
pub type VarId = Id;
/// Position of a physics module in the composite registry.
pub type ModuleId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        for i in [0u32, 1, 7, 1024] {
            assert_eq!(Id::from_index(i).index(), i);
        }
    }

    #[test]
    fn option_is_pointer_sized() {
        assert_eq!(
            core::mem::size_of::<Option<Id>>(),
            core::mem::size_of::<u32>()
        );
    }
}
