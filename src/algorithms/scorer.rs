use tracing::{debug, warn};

use crate::config::ZeroNormPolicy;
use crate::dataset::Dataset;
use crate::error::{RecommendError, Result};
use crate::models::{ClusteredItem, ScoredCandidate, UserProfile};
use crate::utils::{cosine_similarity, round_to};

const SCORE_DIGITS: i32 = 3;

/// Cosine similarity between a profile and an item, rounded to three decimals.
pub fn affinity(profile: &UserProfile, item: &ClusteredItem) -> Result<f64> {
    cosine_similarity(&profile.vector, &item.features)
        .map(|score| round_to(score, SCORE_DIGITS))
        .ok_or(RecommendError::DegenerateVector {
            user_id: profile.user_id,
            item_id: item.item_id,
        })
}

/// Score every profile against every clustered item.
///
/// Items are broadcast to each profile partition and the result is
/// repartitioned into `num_partitions` before it is handed on.
pub fn score_candidates(
    profiles: &Dataset<UserProfile>,
    items: &[ClusteredItem],
    policy: ZeroNormPolicy,
    num_partitions: usize,
) -> Dataset<ScoredCandidate> {
    let scored = profiles.cartesian_with(items, |profile, item| {
        let score = match affinity(profile, item) {
            Ok(score) => score,
            Err(_) if policy == ZeroNormPolicy::ZeroScore => 0.0,
            Err(_) => return None,
        };
        Some(ScoredCandidate {
            user_id: profile.user_id,
            cluster_id: item.cluster_id,
            item_id: item.item_id,
            score,
        })
    });

    let pairs = profiles.len() * items.len();
    let excluded = pairs - scored.len();
    if excluded > 0 {
        warn!(excluded, pairs, "excluded zero-norm pairs from scoring");
    }
    debug!(pairs, num_partitions, "scored user x item candidates");

    scored.repartition(num_partitions)
}
