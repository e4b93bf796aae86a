pub mod algorithms;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use algorithms::{ContentKMeansRecommender, Recommender};
pub use config::Config;
pub use error::{EmptyInput, RecommendError, Result};
pub use models::*;
pub use services::RecommendationService;

/// Predict up to `num_predictions` ratings per user with `k` item clusters,
/// scoring the user x item cross product over `num_partitions` partitions.
pub fn predict(
    ratings: &[Rating],
    content: &[ContentVector],
    num_predictions: usize,
    k: usize,
    num_partitions: usize,
) -> Result<PredictionRun> {
    ContentKMeansRecommender::new(k, num_partitions).predict(ratings, content, num_predictions)
}

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
