use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::config::ClusteringConfig;
use crate::error::{RecommendError, Result};
use crate::models::ClusterId;
use crate::utils::validation::validate_cluster_count;

/// Trained k-means model over item content vectors.
#[derive(Debug, Clone)]
pub struct ClusterModel {
    centroids: Vec<DVector<f64>>,
    iterations: usize,
    inertia: f64,
}

impl ClusterModel {
    /// Fit `config.k` clusters with k-means++ seeding and Lloyd iterations.
    pub fn train(vectors: &[&[f64]], config: &ClusteringConfig) -> Result<Self> {
        let k = config.k;
        validate_cluster_count(k, vectors.len())?;

        let dim = vectors[0].len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(RecommendError::invalid(format!(
                "Vector dimension mismatch: expected {}, got {}",
                dim,
                bad.len()
            )));
        }

        let points: Vec<DVector<f64>> = vectors
            .iter()
            .map(|v| DVector::from_column_slice(*v))
            .collect();

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut centroids = kmeans_plus_plus(&points, k, &mut rng);
        let mut iterations = 0;

        for iter in 0..config.max_iterations {
            iterations = iter + 1;

            let assignments: Vec<ClusterId> = points
                .par_iter()
                .map(|p| nearest(&centroids, p).0)
                .collect();

            let mut sums = vec![DVector::<f64>::zeros(dim); k];
            let mut counts = vec![0usize; k];
            for (point, &cluster) in points.iter().zip(assignments.iter()) {
                sums[cluster] += point;
                counts[cluster] += 1;
            }

            let mut new_centroids: Vec<DVector<f64>> = sums
                .into_iter()
                .zip(counts.iter())
                .map(|(sum, &count)| if count > 0 { sum / count as f64 } else { sum })
                .collect();

            // Reseed empty clusters from the point farthest from its centroid.
            for cluster in (0..k).filter(|&c| counts[c] == 0) {
                let farthest = points
                    .iter()
                    .zip(assignments.iter())
                    .map(|(p, &a)| (p, (p - &new_centroids[a]).norm_squared()))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(p, _)| p.clone());
                if let Some(point) = farthest {
                    new_centroids[cluster] = point;
                }
            }

            let shift = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(old, new)| (old - new).norm())
                .fold(0.0, f64::max);

            centroids = new_centroids;

            if shift <= config.tolerance {
                break;
            }
        }

        let inertia: f64 = points.iter().map(|p| nearest(&centroids, p).1).sum();

        debug!(k, iterations, inertia, "k-means finished");

        Ok(Self {
            centroids,
            iterations,
            inertia,
        })
    }

    /// Nearest centroid by Euclidean distance; ties go to the lowest index.
    pub fn predict(&self, vector: &[f64]) -> ClusterId {
        let point = DVector::from_column_slice(vector);
        nearest(&self.centroids, &point).0
    }

    pub fn centroids(&self) -> &[DVector<f64>] {
        &self.centroids
    }

    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Sum of squared distances from each training point to its centroid.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }
}

/// Index of and squared distance to the closest centroid.
fn nearest(centroids: &[DVector<f64>], point: &DVector<f64>) -> (ClusterId, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = (point - centroid).norm_squared();
        if dist < best.1 {
            best = (i, dist);
        }
    }
    best
}

fn kmeans_plus_plus(points: &[DVector<f64>], k: usize, rng: &mut StdRng) -> Vec<DVector<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())].clone());

    while centroids.len() < k {
        let distances: Vec<f64> = points
            .iter()
            .map(|p| nearest(&centroids, p).1)
            .collect();

        let total: f64 = distances.iter().sum();
        if total == 0.0 {
            centroids.push(points[rng.gen_range(0..points.len())].clone());
            continue;
        }

        let threshold = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        let mut selected = points.len() - 1;
        for (i, &d) in distances.iter().enumerate() {
            cumulative += d;
            if d > 0.0 && cumulative >= threshold {
                selected = i;
                break;
            }
        }

        centroids.push(points[selected].clone());
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(k: usize) -> ClusteringConfig {
        ClusteringConfig {
            k,
            seed: Some(42),
            ..ClusteringConfig::default()
        }
    }

    fn two_blobs() -> Vec<Vec<f64>> {
        vec![
            vec![10.0, 0.0],
            vec![10.0, 0.1],
            vec![0.0, 10.0],
            vec![0.1, 10.0],
        ]
    }

    #[test]
    fn test_separates_two_blobs() {
        let data = two_blobs();
        let refs: Vec<&[f64]> = data.iter().map(|v| v.as_slice()).collect();
        let model = ClusterModel::train(&refs, &config(2)).unwrap();

        assert_eq!(model.k(), 2);
        assert_eq!(model.predict(&data[0]), model.predict(&data[1]));
        assert_eq!(model.predict(&data[2]), model.predict(&data[3]));
        assert_ne!(model.predict(&data[0]), model.predict(&data[2]));
        assert!(model.inertia() < 0.1);
    }

    #[test]
    fn test_seeded_training_is_deterministic() {
        let data: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i % 5) as f64, (i / 5) as f64 * 0.5])
            .collect();
        let refs: Vec<&[f64]> = data.iter().map(|v| v.as_slice()).collect();

        let a = ClusterModel::train(&refs, &config(3)).unwrap();
        let b = ClusterModel::train(&refs, &config(3)).unwrap();
        assert_eq!(a.centroids(), b.centroids());
        for v in &data {
            assert_eq!(a.predict(v), b.predict(v));
        }
    }

    #[test]
    fn test_predict_ties_go_to_lowest_index() {
        let model = ClusterModel {
            centroids: vec![
                DVector::from_vec(vec![1.0, 0.0]),
                DVector::from_vec(vec![-1.0, 0.0]),
            ],
            iterations: 0,
            inertia: 0.0,
        };
        assert_eq!(model.predict(&[0.0, 5.0]), 0);
        assert_eq!(model.predict(&[-0.5, 0.0]), 1);
    }

    #[test]
    fn test_rejects_bad_k_and_dimensions() {
        let data = two_blobs();
        let refs: Vec<&[f64]> = data.iter().map(|v| v.as_slice()).collect();

        assert!(matches!(
            ClusterModel::train(&refs, &config(0)),
            Err(RecommendError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            ClusterModel::train(&refs, &config(5)),
            Err(RecommendError::InvalidConfiguration(_))
        ));

        let (wide, narrow) = ([1.0, 0.0], [1.0]);
        let ragged: Vec<&[f64]> = vec![wide.as_slice(), narrow.as_slice()];
        assert!(matches!(
            ClusterModel::train(&ragged, &config(1)),
            Err(RecommendError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_identical_points_fill_every_cluster() {
        let data = vec![vec![1.0, 1.0]; 4];
        let refs: Vec<&[f64]> = data.iter().map(|v| v.as_slice()).collect();
        let model = ClusterModel::train(&refs, &config(2)).unwrap();
        assert_eq!(model.k(), 2);
        assert_eq!(model.inertia(), 0.0);
        assert_eq!(model.predict(&[1.0, 1.0]), 0);
    }
}
