use nalgebra::DVector;
use std::sync::Arc;
use tracing::debug;

use crate::dataset::Dataset;
use crate::models::{ContentVector, ItemId, Rating, UserId, UserProfile};

/// Build one profile per user as the rating-weighted sum of the content
/// vectors of the items they rated.
///
/// Ratings for items without a content vector are dropped. Users left with no
/// matching item get no profile. Profiles are not normalized by count.
pub fn build_profiles(
    ratings: &[Rating],
    content: &[ContentVector],
    num_partitions: usize,
) -> Dataset<UserProfile> {
    let keyed_ratings: Dataset<(ItemId, (UserId, f64))> = Dataset::from_vec(
        ratings
            .iter()
            .map(|r| (r.item_id, (r.user_id, r.value)))
            .collect(),
        num_partitions,
    );
    let keyed_content: Dataset<(ItemId, Arc<[f64]>)> = Dataset::from_vec(
        content
            .iter()
            .map(|c| (c.item_id, Arc::from(c.features.as_slice())))
            .collect(),
        num_partitions,
    );

    let joined = keyed_ratings.join(keyed_content);
    debug!(
        ratings = ratings.len(),
        matched = joined.len(),
        "joined ratings with content vectors"
    );

    joined
        .map(|(_, ((user_id, rating), vector))| (user_id, (rating, vector)))
        .group_by_key()
        .map(|(user_id, rated)| {
            let dim = rated[0].1.len();
            let vector = rated
                .iter()
                .fold(DVector::<f64>::zeros(dim), |mut acc, (rating, features)| {
                    acc.axpy(*rating, &DVector::from_column_slice(&features[..]), 1.0);
                    acc
                });

            UserProfile {
                user_id,
                vector: vector.as_slice().to_vec(),
                rated_items: rated.len(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_weighted_sum() {
        let content = vec![
            ContentVector::new(1, vec![1.0, 0.0]),
            ContentVector::new(2, vec![0.0, 1.0]),
        ];
        let ratings = vec![
            Rating::new(7, 1, 4.0),
            Rating::new(7, 2, 2.0),
            Rating::new(8, 2, 5.0),
        ];

        let profiles = build_profiles(&ratings, &content, 4).collect();
        assert_eq!(profiles.len(), 2);

        assert_eq!(profiles[0].user_id, 7);
        assert_eq!(profiles[0].vector, vec![4.0, 2.0]);
        assert_eq!(profiles[0].rated_items, 2);

        assert_eq!(profiles[1].user_id, 8);
        assert_eq!(profiles[1].vector, vec![0.0, 5.0]);
    }

    #[test]
    fn test_unmatched_items_are_dropped() {
        let content = vec![ContentVector::new(1, vec![1.0, 1.0])];
        let ratings = vec![
            Rating::new(1, 1, 3.0),
            Rating::new(1, 99, 5.0),
            Rating::new(2, 99, 5.0),
        ];

        let profiles = build_profiles(&ratings, &content, 2).collect();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].user_id, 1);
        assert_eq!(profiles[0].vector, vec![3.0, 3.0]);
        assert_eq!(profiles[0].rated_items, 1);
    }
}
