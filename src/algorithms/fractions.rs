use std::collections::BTreeMap;

use crate::models::{ClusterFractions, ClusterId};
use crate::utils::round_to;

const FRACTION_DIGITS: i32 = 2;

/// Per-cluster share of the catalog, rounded to two decimals.
///
/// Rounding means the fractions may not sum to exactly 1.0. Clusters with no
/// items get no entry.
pub fn estimate_fractions(counts: &BTreeMap<ClusterId, usize>) -> ClusterFractions {
    let total: usize = counts.values().sum();
    if total == 0 {
        return ClusterFractions::default();
    }

    let fractions = counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(&cluster, &count)| {
            (cluster, round_to(count as f64 / total as f64, FRACTION_DIGITS))
        })
        .collect();

    ClusterFractions::new(fractions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let counts = BTreeMap::from([(0, 2), (1, 2)]);
        let fractions = estimate_fractions(&counts);
        assert_eq!(fractions.get(0), Some(0.5));
        assert_eq!(fractions.get(1), Some(0.5));
        assert_eq!(fractions.total(), 1.0);
    }

    #[test]
    fn test_rounding_to_two_digits() {
        let counts = BTreeMap::from([(0, 1), (1, 1), (2, 1)]);
        let fractions = estimate_fractions(&counts);
        assert_eq!(fractions.get(0), Some(0.33));
        assert!((fractions.total() - 0.99).abs() < 1e-9);
        assert!((fractions.total() - 1.0).abs() <= 0.01 * fractions.len() as f64);
    }

    #[test]
    fn test_missing_and_empty_clusters() {
        let counts = BTreeMap::from([(0, 3), (2, 0), (3, 1)]);
        let fractions = estimate_fractions(&counts);
        assert_eq!(fractions.len(), 2);
        assert_eq!(fractions.get(2), None);
        assert_eq!(fractions.get(1), None);
        assert_eq!(fractions.get(3), Some(0.25));

        assert!(estimate_fractions(&BTreeMap::new()).is_empty());
    }
}
