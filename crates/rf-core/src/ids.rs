use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used for airfoil sections.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        // saturates at u32::MAX instead of wrapping to zero
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
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

/// Airfoil section identifier assigned to radial stations.
pub type AirfoilId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = AirfoilId::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }

    #[test]
    fn display_uses_zero_based_index() {
        assert_eq!(AirfoilId::from_index(3).to_string(), "3");
    }
}
