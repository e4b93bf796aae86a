use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::EmptyInput;

pub type UserId = u64;
pub type ItemId = u64;
pub type ClusterId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVector {
    pub item_id: ItemId,
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub vector: Vec<f64>,
    /// Rated items that had a content vector.
    pub rated_items: usize,
}

/// A content vector tagged with the cluster its item was assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredItem {
    pub cluster_id: ClusterId,
    pub item_id: ItemId,
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub user_id: UserId,
    pub cluster_id: ClusterId,
    pub item_id: ItemId,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectedCandidate {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub predicted_rating: f64,
}

/// Observed span of rating values across every input rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: f64,
    pub max: f64,
}

impl RatingRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn spread(&self) -> f64 {
        self.max - self.min
    }

    pub fn from_ratings(ratings: &[Rating]) -> Option<Self> {
        let mut values = ratings.iter().map(|r| r.value);
        let first = values.next()?;
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }
}

/// Share of each user's recommendations drawn from a cluster.
///
/// Clusters with no assigned items have no entry; callers treat a missing key
/// as a zero quota.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterFractions(BTreeMap<ClusterId, f64>);

impl ClusterFractions {
    pub fn new(fractions: BTreeMap<ClusterId, f64>) -> Self {
        Self(fractions)
    }

    pub fn get(&self, cluster_id: ClusterId) -> Option<f64> {
        self.0.get(&cluster_id).copied()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub k: usize,
    pub iterations: usize,
    pub inertia: f64,
    pub sizes: BTreeMap<ClusterId, usize>,
    pub fractions: ClusterFractions,
}

/// Output of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRun {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub rating_range: Option<RatingRange>,
    pub clusters: Option<ClusterReport>,
    pub predictions: Vec<Prediction>,
    /// Set when the run had nothing to predict from.
    pub empty: Option<EmptyInput>,
}

impl PredictionRun {
    pub fn new(
        rating_range: RatingRange,
        clusters: ClusterReport,
        predictions: Vec<Prediction>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            rating_range: Some(rating_range),
            clusters: Some(clusters),
            predictions,
            empty: None,
        }
    }

    pub fn empty(reason: EmptyInput) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            rating_range: None,
            clusters: None,
            predictions: Vec::new(),
            empty: Some(reason),
        }
    }

    pub fn with_context(
        mut self,
        rating_range: Option<RatingRange>,
        clusters: Option<ClusterReport>,
    ) -> Self {
        self.rating_range = rating_range;
        self.clusters = clusters;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn for_user(&self, user_id: UserId) -> Vec<Prediction> {
        self.predictions
            .iter()
            .filter(|p| p.user_id == user_id)
            .copied()
            .collect()
    }

    pub fn users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.predictions.iter().map(|p| p.user_id).collect();
        users.sort_unstable();
        users.dedup();
        users
    }
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, value: f64) -> Self {
        Self { user_id, item_id, value }
    }
}

impl ContentVector {
    pub fn new(item_id: ItemId, features: Vec<f64>) -> Self {
        Self { item_id, features }
    }

    pub fn dimension(&self) -> usize {
        self.features.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range_from_ratings() {
        let ratings = vec![
            Rating::new(1, 10, 3.0),
            Rating::new(1, 11, 5.0),
            Rating::new(2, 10, 1.0),
        ];
        let range = RatingRange::from_ratings(&ratings).unwrap();
        assert_eq!(range, RatingRange::new(1.0, 5.0));
        assert_eq!(range.spread(), 4.0);

        assert!(RatingRange::from_ratings(&[]).is_none());
    }

    #[test]
    fn test_prediction_run_accessors() {
        let run = PredictionRun {
            predictions: vec![
                Prediction {
                    user_id: 2,
                    item_id: 1,
                    predicted_rating: 4.0,
                },
                Prediction {
                    user_id: 1,
                    item_id: 3,
                    predicted_rating: 2.0,
                },
                Prediction {
                    user_id: 2,
                    item_id: 5,
                    predicted_rating: 1.0,
                },
            ],
            ..PredictionRun::empty(EmptyInput::NoCandidates)
        };

        assert_eq!(run.users(), vec![1, 2]);
        assert_eq!(run.for_user(2).len(), 2);
        assert!(run.for_user(9).is_empty());
    }
}
