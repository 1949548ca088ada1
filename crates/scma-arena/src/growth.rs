//! Capacity growth policy shared by the byte arena and the block table.
//!
//! Capacity doubles until it covers the requirement. If a doubling step
//! would pass the limit, the new capacity is clamped to exactly the
//! requirement instead. The computation is pure; callers reallocate only
//! once it succeeds, so a rejected growth never touches storage.

use crate::error::ArenaError;

/// Compute the capacity that satisfies `required`.
///
/// Returns `Ok(None)` when `current` already suffices, and
/// `Err(CapacityExhausted)` when `required` exceeds `limit`.
pub(crate) fn grown_capacity(
    current: usize,
    required: usize,
    limit: usize,
) -> Result<Option<usize>, ArenaError> {
    if current >= required {
        return Ok(None);
    }
    if required > limit {
        return Err(ArenaError::CapacityExhausted { requested: required, limit });
    }
    let mut capacity = if current == 0 { required } else { current };
    while capacity < required {
        if capacity > limit / 2 {
            capacity = required;
        } else {
            capacity *= 2;
        }
    }
    Ok(Some(capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sufficient_capacity_is_noop() {
        assert_eq!(grown_capacity(64, 64, 1024), Ok(None));
        assert_eq!(grown_capacity(64, 10, 1024), Ok(None));
    }

    #[test]
    fn empty_grows_to_exact_requirement() {
        assert_eq!(grown_capacity(0, 40, 1024), Ok(Some(40)));
    }

    #[test]
    fn doubles_until_covered() {
        assert_eq!(grown_capacity(16, 17, 1024), Ok(Some(32)));
        assert_eq!(grown_capacity(16, 100, 1024), Ok(Some(128)));
    }

    #[test]
    fn clamps_to_requirement_near_limit() {
        // Doubling 600 would pass 1000, so land on the requirement itself.
        assert_eq!(grown_capacity(600, 700, 1000), Ok(Some(700)));
    }

    #[test]
    fn clamps_near_platform_max() {
        let limit = usize::MAX;
        let current = usize::MAX / 2 + 1;
        assert_eq!(
            grown_capacity(current, current + 1, limit),
            Ok(Some(current + 1))
        );
    }

    #[test]
    fn over_limit_rejected() {
        assert_eq!(
            grown_capacity(16, 2000, 1000),
            Err(ArenaError::CapacityExhausted {
                requested: 2000,
                limit: 1000
            })
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn result_covers_requirement_within_limit(
                current in 0usize..1 << 20,
                required in 0usize..1 << 21,
                limit in 0usize..1 << 22,
            ) {
                match grown_capacity(current, required, limit) {
                    Ok(None) => prop_assert!(current >= required),
                    Ok(Some(cap)) => {
                        prop_assert!(cap >= required);
                        prop_assert!(cap <= limit);
                        prop_assert!(cap > current);
                    }
                    Err(_) => prop_assert!(required > limit && current < required),
                }
            }
        }
    }
}
