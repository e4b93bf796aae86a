use std::cmp::Ordering;

use crate::dataset::Dataset;
use crate::models::{ClusterFractions, ScoredCandidate, SelectedCandidate};

/// Items a user draws from a cluster holding `fraction` of the catalog.
pub fn cluster_quota(num_predictions: usize, fraction: f64) -> usize {
    (num_predictions as f64 * fraction).round().max(0.0) as usize
}

/// Higher score first, then lower item id.
fn by_score_desc(a_score: f64, a_item: u64, b_score: f64, b_item: u64) -> Ordering {
    b_score.total_cmp(&a_score).then(a_item.cmp(&b_item))
}

/// Pick each user's candidates cluster by cluster.
///
/// Within a cluster candidates are ranked by score and cut to that cluster's
/// quota; clusters without a fraction contribute nothing. The per-cluster picks
/// are merged, re-ranked and capped at `num_predictions`. Rounded quotas can sum
/// to less than `num_predictions`; the shortfall is not filled.
pub fn select_diversified(
    candidates: Dataset<ScoredCandidate>,
    fractions: &ClusterFractions,
    num_predictions: usize,
) -> Dataset<SelectedCandidate> {
    candidates
        .map(|c| ((c.user_id, c.cluster_id), c))
        .group_by_key()
        .flat_map(|((user_id, cluster_id), mut in_cluster)| {
            let quota = fractions
                .get(cluster_id)
                .map(|fraction| cluster_quota(num_predictions, fraction))
                .unwrap_or(0);

            in_cluster.sort_by(|a, b| by_score_desc(a.score, a.item_id, b.score, b.item_id));
            in_cluster.truncate(quota);
            in_cluster.into_iter().map(move |c| {
                (
                    user_id,
                    SelectedCandidate {
                        user_id,
                        item_id: c.item_id,
                        score: c.score,
                    },
                )
            })
        })
        .group_by_key()
        .flat_map(|(_, mut selected)| {
            selected.sort_by(|a, b| by_score_desc(a.score, a.item_id, b.score, b.item_id));
            selected.truncate(num_predictions);
            selected
        })
}
