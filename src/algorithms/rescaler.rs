use tracing::{debug, warn};

use crate::config::DegenerateRangePolicy;
use crate::dataset::Dataset;
use crate::error::{RecommendError, Result};
use crate::models::{Prediction, RatingRange, SelectedCandidate};

/// Linearly map raw scores onto the observed rating range.
///
/// The lowest selected score lands on `range.min` and the highest on
/// `range.max`. When every score is equal the spread is zero and `policy`
/// decides between failing and flattening everything to `range.min`.
pub fn rescale(
    selected: Dataset<SelectedCandidate>,
    range: RatingRange,
    policy: DegenerateRangePolicy,
) -> Result<Vec<Prediction>> {
    let (Some(min_pred), Some(max_pred)) = (
        selected.min_value(|s| s.score),
        selected.max_value(|s| s.score),
    ) else {
        return Ok(Vec::new());
    };

    let spread = max_pred - min_pred;
    debug!(
        min_pred,
        max_pred,
        min_rating = range.min,
        max_rating = range.max,
        "rescaling predictions"
    );

    if spread == 0.0 {
        return match policy {
            DegenerateRangePolicy::Fail => Err(RecommendError::DegenerateRange { value: max_pred }),
            DegenerateRangePolicy::MinRating => {
                warn!(value = max_pred, "all scores identical, predicting the minimum rating");
                Ok(selected
                    .map(|s| Prediction {
                        user_id: s.user_id,
                        item_id: s.item_id,
                        predicted_rating: range.min,
                    })
                    .collect())
            }
        };
    }

    let scale = range.spread() / spread;
    Ok(selected
        .map(|s| Prediction {
            user_id: s.user_id,
            item_id: s.item_id,
            predicted_rating: (s.score - min_pred) * scale + range.min,
        })
        .collect())
}
