//! Stratified train/test partitioning.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::ml::types::RiskProfile;

/// Indices of the two partitions, each in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split sample indices so that every class keeps its proportion in both
/// partitions.
///
/// Each class is shuffled independently and `round(n_c * test_size)` of its
/// members go to the test partition. A class with at least two members always
/// contributes at least one example to each partition; a singleton class goes
/// to training.
pub fn stratified_split(labels: &[RiskProfile], test_size: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for profile in RiskProfile::ALL {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == profile)
            .map(|(i, _)| i)
            .collect();
        let n = members.len();
        if n == 0 {
            continue;
        }
        members.shuffle(&mut rng);

        let mut n_test = (n as f64 * test_size).round() as usize;
        if n >= 2 {
            n_test = n_test.clamp(1, n - 1);
        } else {
            n_test = 0;
        }

        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RiskProfile::*;

    fn labels(counts: [usize; 3]) -> Vec<RiskProfile> {
        let mut labels = Vec::new();
        for (profile, count) in RiskProfile::ALL.iter().zip(counts) {
            labels.extend(std::iter::repeat_n(*profile, count));
        }
        labels
    }

    #[test]
    fn test_proportions_are_preserved() {
        let labels = labels([50, 30, 20]);
        let split = stratified_split(&labels, 0.2, 42);

        assert_eq!(split.train.len() + split.test.len(), 100);
        let in_test = |p: RiskProfile| split.test.iter().filter(|i| labels[**i] == p).count();
        assert_eq!(in_test(Conservative), 10);
        assert_eq!(in_test(Balanced), 6);
        assert_eq!(in_test(Aggressive), 4);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let labels = labels([7, 5, 3]);
        let split = stratified_split(&labels, 0.2, 1);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn test_small_classes_reach_both_partitions() {
        let labels = labels([2, 2, 1]);
        let split = stratified_split(&labels, 0.2, 42);

        assert!(split.test.iter().any(|i| labels[*i] == Conservative));
        assert!(split.train.iter().any(|i| labels[*i] == Conservative));
        assert!(!split.test.iter().any(|i| labels[*i] == Aggressive));
    }

    #[test]
    fn test_split_is_seeded() {
        let labels = labels([20, 20, 20]);
        assert_eq!(stratified_split(&labels, 0.2, 42), stratified_split(&labels, 0.2, 42));
        assert_ne!(stratified_split(&labels, 0.2, 42), stratified_split(&labels, 0.2, 43));
    }
}
