use crate::error::{RecommendError, Result};
use crate::models::*;
use std::collections::HashSet;

pub fn validate_rating(rating: &Rating) -> Result<()> {
    if !rating.value.is_finite() {
        return Err(RecommendError::invalid(format!(
            "Rating by user {} for item {} is not finite",
            rating.user_id, rating.item_id
        )));
    }
    Ok(())
}

pub fn validate_ratings(ratings: &[Rating]) -> Result<()> {
    ratings.iter().try_for_each(validate_rating)
}

pub fn validate_content_vector(content: &ContentVector, expected_dim: usize) -> Result<()> {
    if content.features.is_empty() {
        return Err(RecommendError::invalid(format!(
            "Content vector for item {} is empty",
            content.item_id
        )));
    }

    if content.features.len() != expected_dim {
        return Err(RecommendError::invalid(format!(
            "Content vector dimension mismatch for item {}: expected {}, got {}",
            content.item_id,
            expected_dim,
            content.features.len()
        )));
    }

    if content.features.iter().any(|v| !v.is_finite()) {
        return Err(RecommendError::invalid(format!(
            "Content vector for item {} contains NaN or infinite values",
            content.item_id
        )));
    }

    Ok(())
}

/// Checks uniform dimensionality and unique item ids. Returns the dimension.
pub fn validate_catalog(content: &[ContentVector]) -> Result<usize> {
    let Some(first) = content.first() else {
        return Ok(0);
    };
    let dim = first.dimension();

    let mut seen = HashSet::with_capacity(content.len());
    for vector in content {
        validate_content_vector(vector, dim)?;
        if !seen.insert(vector.item_id) {
            return Err(RecommendError::invalid(format!(
                "Duplicate content vector for item {}",
                vector.item_id
            )));
        }
    }

    Ok(dim)
}

pub fn validate_cluster_count(k: usize, distinct_items: usize) -> Result<()> {
    if k == 0 {
        return Err(RecommendError::invalid("k must be positive"));
    }

    if k > distinct_items {
        return Err(RecommendError::invalid(format!(
            "k ({}) exceeds the number of distinct items ({})",
            k, distinct_items
        )));
    }

    Ok(())
}

pub fn validate_num_predictions(num_predictions: usize) -> Result<()> {
    if num_predictions == 0 {
        return Err(RecommendError::invalid("num_predictions must be positive"));
    }
    Ok(())
}

pub fn validate_num_partitions(num_partitions: usize) -> Result<()> {
    if num_partitions == 0 {
        return Err(RecommendError::invalid("num_partitions must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_catalog() {
        let catalog = vec![
            ContentVector::new(1, vec![1.0, 0.0]),
            ContentVector::new(2, vec![0.0, 1.0]),
        ];
        assert_eq!(validate_catalog(&catalog).unwrap(), 2);
        assert_eq!(validate_catalog(&[]).unwrap(), 0);
    }

    #[test]
    fn test_validate_catalog_dimension_mismatch() {
        let catalog = vec![
            ContentVector::new(1, vec![1.0, 0.0]),
            ContentVector::new(2, vec![0.0, 1.0, 2.0]),
        ];
        assert!(matches!(
            validate_catalog(&catalog),
            Err(RecommendError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_catalog_rejects_duplicates_and_nan() {
        let duplicated = vec![
            ContentVector::new(1, vec![1.0]),
            ContentVector::new(1, vec![2.0]),
        ];
        assert!(validate_catalog(&duplicated).is_err());

        let with_nan = vec![ContentVector::new(1, vec![f64::NAN])];
        assert!(validate_catalog(&with_nan).is_err());

        let empty_vector = vec![ContentVector::new(1, vec![])];
        assert!(validate_catalog(&empty_vector).is_err());
    }

    #[test]
    fn test_validate_cluster_count() {
        assert!(validate_cluster_count(2, 4).is_ok());
        assert!(validate_cluster_count(4, 4).is_ok());
        assert!(validate_cluster_count(0, 4).is_err());
        assert!(validate_cluster_count(5, 4).is_err());
    }

    #[test]
    fn test_validate_ratings() {
        assert!(validate_ratings(&[Rating::new(1, 1, 4.0)]).is_ok());
        assert!(validate_ratings(&[Rating::new(1, 1, f64::INFINITY)]).is_err());
        assert!(validate_num_predictions(0).is_err());
        assert!(validate_num_partitions(0).is_err());
    }
}
