//! Change detection between consecutive frames.
//!
//! The monitor endpoint keeps handing out the last acquired image until a
//! new one is taken, so most polls return a frame that was already
//! published. Those are filtered out here before any metadata is read.

mod previous;

pub use previous::PreviousFrame;

/// Returns true if `current` should be treated as a new image.
///
/// An empty `previous` buffer (nothing published yet) always counts as a
/// change, as does any difference in length. Otherwise the buffers are
/// compared sample by sample.
pub fn is_changed(previous: &[u32], current: &[u32]) -> bool {
    if previous.is_empty() || previous.len() != current.len() {
        return true;
    }
    previous != current
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_previous_is_changed() {
        assert!(is_changed(&[], &[0; 100]));
        assert!(is_changed(&[], &[]));
    }

    #[test]
    fn test_identical_is_unchanged() {
        let frame = vec![5u32; 64];
        assert!(!is_changed(&frame, &frame.clone()));
    }

    #[test]
    fn test_single_sample_difference() {
        let previous = vec![0u32; 64];
        let mut current = previous.clone();
        current[63] = 1;
        assert!(is_changed(&previous, &current));
    }

    #[test]
    fn test_length_mismatch_is_changed() {
        let previous = vec![0u32; 64];
        assert!(is_changed(&previous, &previous[..32]));
        assert!(is_changed(&previous[..32], &previous));
    }

    proptest! {
        #[test]
        fn prop_self_comparison_unchanged(frame in prop::collection::vec(any::<u32>(), 1..512)) {
            prop_assert!(!is_changed(&frame, &frame));
        }

        #[test]
        fn prop_any_difference_detected(
            frame in prop::collection::vec(any::<u32>(), 1..512),
            index in any::<prop::sample::Index>(),
            delta in 1u32..,
        ) {
            let mut other = frame.clone();
            let i = index.index(other.len());
            other[i] = other[i].wrapping_add(delta);
            prop_assert!(is_changed(&frame, &other));
        }
    }
}
