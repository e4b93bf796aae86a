use crate::algorithms::{ContentKMeansRecommender, Recommender};
use crate::config::Config;
use crate::error::{RecommendError, Result};
use crate::models::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Runs prediction batches on a dedicated worker pool under a wall-clock limit.
pub struct RecommendationService {
    recommender: Arc<dyn Recommender>,
    pool: Arc<rayon::ThreadPool>,
    timeout: Duration,
}

impl RecommendationService {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let recommender = Arc::new(ContentKMeansRecommender::from_config(&config));
        Self::with_recommender(config, recommender)
    }

    /// Build a service around any recommender, sized and limited by `config`.
    pub fn with_recommender(
        config: Arc<Config>,
        recommender: Arc<dyn Recommender>,
    ) -> Result<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.pipeline.workers)
            .thread_name(|i| format!("divrec-worker-{}", i))
            .build()
            .map_err(|e| RecommendError::Runtime(e.to_string()))?;

        Ok(Self {
            recommender,
            pool: Arc::new(pool),
            timeout: config.pipeline.timeout(),
        })
    }

    /// Override the configured batch limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one batch on the caller's thread, blocking until it finishes.
    pub fn run_blocking(
        &self,
        ratings: &[Rating],
        content: &[ContentVector],
        num_predictions: usize,
    ) -> Result<PredictionRun> {
        self.pool
            .install(|| self.recommender.predict(ratings, content, num_predictions))
    }

    /// Run one batch off the async runtime, failing with `Timeout` once the
    /// configured limit passes. A timed-out batch is abandoned, not interrupted.
    pub async fn run(
        &self,
        ratings: Vec<Rating>,
        content: Vec<ContentVector>,
        num_predictions: usize,
    ) -> Result<PredictionRun> {
        let limit = self.timeout;
        let recommender = self.recommender.clone();
        let pool = self.pool.clone();

        info!(
            ratings = ratings.len(),
            items = content.len(),
            num_predictions,
            "starting prediction batch"
        );
        let started = Instant::now();

        let task = tokio::task::spawn_blocking(move || {
            pool.install(|| recommender.predict(&ratings, &content, num_predictions))
        });

        let run = match tokio::time::timeout(limit, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                error!("Prediction batch panicked or was cancelled: {}", join_error);
                return Err(RecommendError::Runtime(join_error.to_string()));
            }
            Err(_) => {
                error!("Prediction batch exceeded {:?}", limit);
                return Err(RecommendError::Timeout(limit));
            }
        };

        info!(
            run_id = %run.run_id,
            predictions = run.predictions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction batch finished"
        );
        Ok(run)
    }
}
