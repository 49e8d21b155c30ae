//! Membership toggle for relationship arrays
//!
//! A relationship update carries a candidate list of identifiers. Whether the
//! update adds or removes is decided by the first candidate alone: if it is
//! already a member, every candidate is removed, otherwise every candidate is
//! appended. Callers pass single-element candidates in practice; batches are
//! accepted but inherit the direction of their first element.

/// Which way a toggle moved the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Add,
    Remove,
}

/// Direction a toggle would take, or `None` for an empty candidate
pub fn direction<T: PartialEq>(current: &[T], candidate: &[T]) -> Option<Direction> {
    candidate.first().map(|first| {
        if current.contains(first) {
            Direction::Remove
        } else {
            Direction::Add
        }
    })
}

/// Add or remove `candidate` from `current`
pub fn toggle<T: PartialEq + Clone>(current: &[T], candidate: &[T]) -> Vec<T> {
    match direction(current, candidate) {
        None => current.to_vec(),
        Some(Direction::Remove) => difference(current, candidate),
        Some(Direction::Add) => current.iter().chain(candidate).cloned().collect(),
    }
}

/// `current` without any element of `removed`
///
/// Duplicates among the survivors collapse to their first occurrence.
pub fn difference<T: PartialEq + Clone>(current: &[T], removed: &[T]) -> Vec<T> {
    let mut kept: Vec<T> = Vec::with_capacity(current.len());
    for item in current {
        if !removed.contains(item) && !kept.contains(item) {
            kept.push(item.clone());
        }
    }
    kept
}

/// `current` followed by each element of `added` it does not already hold
pub fn union<T: PartialEq + Clone>(current: &[T], added: &[T]) -> Vec<T> {
    let mut merged = current.to_vec();
    for item in added {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_candidate_is_identity() {
        assert_eq!(toggle(&[1, 2, 2, 3], &[]), vec![1, 2, 2, 3]);
        assert_eq!(direction::<u8>(&[1], &[]), None);
    }

    #[test]
    fn test_add_to_empty() {
        assert_eq!(toggle(&[], &["x"]), vec!["x"]);
    }

    #[test]
    fn test_remove_only_member() {
        assert_eq!(toggle(&["x"], &["x"]), Vec::<&str>::new());
    }

    #[test]
    fn test_first_element_decides_direction() {
        // 2 is present, so the whole candidate is removed even though 9 is not
        assert_eq!(toggle(&[1, 2, 3], &[2, 9]), vec![1, 3]);
        // 9 is absent, so the whole candidate is appended even though 2 is present
        assert_eq!(toggle(&[1, 2, 3], &[9, 2]), vec![1, 2, 3, 9, 2]);
    }

    #[test]
    fn test_removal_collapses_duplicates_and_keeps_order() {
        assert_eq!(toggle(&[4, 1, 4, 2, 1], &[2]), vec![4, 1]);
    }

    #[test]
    fn test_union_skips_existing_members() {
        assert_eq!(union(&[1, 2], &[2, 3, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_difference_ignores_absent_elements() {
        assert_eq!(difference(&[1, 2], &[7]), vec![1, 2]);
    }

    proptest! {
        #[test]
        fn prop_toggle_twice_restores_without_candidate(
            current in proptest::collection::vec(0u8..50, 0..12),
            x in 50u8..100,
        ) {
            // x is never in `current`, so the first toggle adds and the second removes
            let added = toggle(&current, &[x]);
            prop_assert_eq!(added.last(), Some(&x));
            let restored = toggle(&added, &[x]);
            prop_assert_eq!(restored, difference(&current, &[]));
        }

        #[test]
        fn prop_toggle_twice_restores_with_member(
            members in proptest::collection::hash_set(0u8..50, 1..12),
            pick in any::<prop::sample::Index>(),
        ) {
            let mut current: Vec<u8> = members.into_iter().collect();
            current.sort_unstable();
            let x = current[pick.index(current.len())];
            let removed = toggle(&current, &[x]);
            prop_assert!(!removed.contains(&x));
            let mut restored = toggle(&removed, &[x]);
            restored.sort_unstable();
            prop_assert_eq!(restored, current);
        }

        #[test]
        fn prop_empty_candidate_identity(current in proptest::collection::vec(any::<u16>(), 0..16)) {
            prop_assert_eq!(toggle(&current, &[]), current);
        }
    }
}
