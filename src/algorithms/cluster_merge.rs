//! Transitive merging of overlap relations into disjoint groups

use std::collections::BTreeSet;

/// Merge sets sharing at least one element until every pair of sets is disjoint.
///
/// Each pass folds the current collection into a new one, merging a set into
/// the first accumulated set it intersects. Passes repeat until one produces no
/// change; every real merge lowers the number of sets, so this terminates.
/// Empty input sets carry no elements and are dropped.
pub fn merge_by_common_elements<T, I>(sets: I) -> Vec<BTreeSet<T>>
where
    T: Ord + Clone,
    I: IntoIterator<Item = BTreeSet<T>>,
{
    let mut current: BTreeSet<BTreeSet<T>> = sets.into_iter().filter(|set| !set.is_empty()).collect();

    loop {
        let next = current.iter().fold(BTreeSet::new(), |mut result: BTreeSet<BTreeSet<T>>, set| {
            let mergeable = result.iter().find(|existing| !existing.is_disjoint(set)).cloned();
            match mergeable {
                Some(existing) => {
                    result.remove(&existing);
                    result.insert(existing.union(set).cloned().collect());
                }
                None => {
                    result.insert(set.clone());
                }
            }
            result
        });

        if next == current {
            break;
        }
        current = next;
    }

    debug_assert!(is_disjoint_partition(current.iter()));
    current.into_iter().collect()
}

/// True when no element appears in more than one of `groups`
pub fn is_disjoint_partition<'a, T, I>(groups: I) -> bool
where
    T: Ord + 'a,
    I: IntoIterator<Item = &'a BTreeSet<T>>,
{
    let mut seen = BTreeSet::new();
    groups
        .into_iter()
        .flat_map(|group| group.iter())
        .all(|element| seen.insert(element))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<T: Ord + Clone>(items: &[T]) -> BTreeSet<T> {
        items.iter().cloned().collect()
    }

    fn as_set_of_sets<T: Ord>(groups: Vec<BTreeSet<T>>) -> BTreeSet<BTreeSet<T>> {
        groups.into_iter().collect()
    }

    #[test]
    fn test_merges_pairs_sharing_elements() {
        let input = vec![set(&[1, 2]), set(&[2, 3]), set(&[4, 5]), set(&[1, 2]), set(&[4, 6])];
        let merged = as_set_of_sets(merge_by_common_elements(input));
        assert_eq!(merged, as_set_of_sets(vec![set(&[1, 2, 3]), set(&[4, 5, 6])]));
    }

    #[test]
    fn test_merges_chains_into_one_group() {
        let input = vec![set(&["1", "2"]), set(&["3", "4"]), set(&["5", "6"]), set(&["2", "3"]), set(&["6", "1"])];
        let merged = merge_by_common_elements(input);
        assert_eq!(merged, vec![set(&["1", "2", "3", "4", "5", "6"])]);
    }

    #[test]
    fn test_merges_mixed_cardinalities() {
        let input = vec![
            set(&[1, 2, 4]),
            set(&[3, 5, 7]),
            set(&[6, 8]),
            set(&[0]),
            set(&[2, 8]),
            set(&[7, 9, 11, 13]),
        ];
        let merged = as_set_of_sets(merge_by_common_elements(input));
        assert_eq!(
            merged,
            as_set_of_sets(vec![set(&[0]), set(&[1, 2, 4, 6, 8]), set(&[3, 5, 7, 9, 11, 13])])
        );

        let input = vec![set(&[7, 10]), set(&[25, 13, 19]), set(&[10, 13]), set(&[1, 2]), set(&[15, 2])];
        let merged = as_set_of_sets(merge_by_common_elements(input));
        assert_eq!(merged, as_set_of_sets(vec![set(&[7, 10, 13, 19, 25]), set(&[1, 2, 15])]));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = vec![set(&[1, 2]), set(&[4, 5]), set(&[5, 6]), set(&[7, 8]), set(&[8, 9]), set(&[8, 10]), set(&[9, 10])];
        let once = merge_by_common_elements(input);
        let twice = merge_by_common_elements(once.clone());
        assert_eq!(once, twice);
        assert_eq!(as_set_of_sets(once), as_set_of_sets(vec![set(&[1, 2]), set(&[4, 5, 6]), set(&[7, 8, 9, 10])]));
    }

    #[test]
    fn test_merge_preserves_every_element_once() {
        let input = vec![set(&[1, 9]), set(&[3, 4]), set(&[9, 12]), set(&[20]), set(&[4, 1]), set(&[30, 31])];
        let expected: BTreeSet<i32> = input.iter().flat_map(|s| s.iter().copied()).collect();

        let merged = merge_by_common_elements(input);
        assert!(is_disjoint_partition(merged.iter()));

        let union: BTreeSet<i32> = merged.iter().flat_map(|s| s.iter().copied()).collect();
        let total: usize = merged.iter().map(|s| s.len()).sum();
        assert_eq!(union, expected);
        assert_eq!(total, expected.len());
    }

    #[test]
    fn test_single_and_empty_inputs() {
        assert_eq!(merge_by_common_elements(vec![set(&[1])]), vec![set(&[1])]);
        assert!(merge_by_common_elements(Vec::<BTreeSet<u8>>::new()).is_empty());
        assert!(merge_by_common_elements(vec![BTreeSet::<u8>::new()]).is_empty());
    }

    #[test]
    fn test_partition_check_detects_shared_elements() {
        let groups = vec![set(&[1, 2]), set(&[2, 3])];
        assert!(!is_disjoint_partition(groups.iter()));
    }
}
