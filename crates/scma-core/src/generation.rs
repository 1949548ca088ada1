//! Per-slot generation counters.
//!
//! Every block slot carries a [`Generation`]. A slot's generation advances
//! once each time the slot is handed out again, so a handle minted before
//! the reuse no longer matches. Two values are reserved and never issued:
//! `0` (a slot that has never been allocated) and `u32::MAX` (the invalid
//! handle sentinel).

use std::fmt;

/// Generation counter stored in block slots and handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Generation(pub u32);

impl Generation {
    /// Generation of a slot that has never been issued.
    pub const NONE: Self = Self(0);

    /// Sentinel generation carried by [`Handle::INVALID`](crate::Handle::INVALID).
    pub const INVALID: Self = Self(u32::MAX);

    /// First generation a fresh slot receives.
    pub const FIRST: Self = Self(1);

    /// The generation issued on the next reuse of a slot.
    ///
    /// Skips both reserved values, wrapping to [`Generation::FIRST`].
    pub fn next(self) -> Self {
        Self(next_generation(self.0))
    }

    /// Whether this value can appear in an issued handle.
    pub fn is_issuable(self) -> bool {
        self != Self::NONE && self != Self::INVALID
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Generation {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Advance a raw generation counter by one.
///
/// Returns `current + 1`, or `1` if the increment would land on `0` or on
/// the `u32::MAX` sentinel.
pub fn next_generation(current: u32) -> u32 {
    match current.wrapping_add(1) {
        0 | u32::MAX => 1,
        next => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slot_gets_first_generation() {
        assert_eq!(Generation::NONE.next(), Generation::FIRST);
    }

    #[test]
    fn increments_by_one() {
        assert_eq!(next_generation(1), 2);
        assert_eq!(next_generation(41), 42);
    }

    #[test]
    fn skips_sentinel() {
        assert_eq!(next_generation(u32::MAX - 1), 1);
    }

    #[test]
    fn wraps_from_sentinel() {
        assert_eq!(next_generation(u32::MAX), 1);
    }

    #[test]
    fn reserved_values_not_issuable() {
        assert!(!Generation::NONE.is_issuable());
        assert!(!Generation::INVALID.is_issuable());
        assert!(Generation::FIRST.is_issuable());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn next_is_always_issuable(current in any::<u32>()) {
                prop_assert!(Generation(current).next().is_issuable());
            }

            #[test]
            fn next_differs_from_current(current in any::<u32>()) {
                prop_assert_ne!(next_generation(current), current);
            }
        }
    }
}
