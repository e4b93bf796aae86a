pub mod fractions;
pub mod kmeans;
pub mod profile;
pub mod rescaler;
pub mod scorer;
pub mod selector;

pub use kmeans::ClusterModel;

use crate::config::{ClusteringConfig, Config, ScoringConfig};
use crate::dataset::Dataset;
use crate::error::{EmptyInput, RecommendError, Result};
use crate::models::*;
use crate::utils::validation::{
    validate_catalog, validate_cluster_count, validate_num_partitions, validate_num_predictions,
    validate_ratings,
};
use tracing::{debug, info};

pub trait Recommender: Send + Sync {
    /// Produce at most `num_predictions` predictions per user.
    fn predict(
        &self,
        ratings: &[Rating],
        content: &[ContentVector],
        num_predictions: usize,
    ) -> Result<PredictionRun>;
}

/// Item clustering produced once per run and shared by later stages.
#[derive(Debug, Clone)]
pub struct TrainedClusters {
    pub model: ClusterModel,
    pub items: Vec<ClusteredItem>,
    pub report: ClusterReport,
}

/// Content-based recommender that draws each user's picks from item clusters
/// in proportion to the clusters' share of the catalog.
#[derive(Debug, Clone)]
pub struct ContentKMeansRecommender {
    pub clustering: ClusteringConfig,
    pub scoring: ScoringConfig,
    pub num_partitions: usize,
}

impl Default for ContentKMeansRecommender {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

impl ContentKMeansRecommender {
    pub fn new(k: usize, num_partitions: usize) -> Self {
        Self {
            clustering: ClusteringConfig {
                k,
                ..ClusteringConfig::default()
            },
            scoring: ScoringConfig::default(),
            num_partitions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            clustering: config.clustering.clone(),
            scoring: config.scoring.clone(),
            num_partitions: config.pipeline.num_partitions,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.clustering.seed = Some(seed);
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Cluster the catalog and derive per-cluster recommendation fractions.
    pub fn train_clusters(&self, content: &[ContentVector]) -> Result<TrainedClusters> {
        validate_cluster_count(self.clustering.k, content.len())?;
        validate_catalog(content)?;

        let vectors: Vec<&[f64]> = content.iter().map(|c| c.features.as_slice()).collect();
        let model = ClusterModel::train(&vectors, &self.clustering)?;

        let clustered = Dataset::from_vec(content.to_vec(), self.num_partitions).map(|c| {
            let cluster_id = model.predict(&c.features);
            (
                cluster_id,
                ClusteredItem {
                    cluster_id,
                    item_id: c.item_id,
                    features: c.features,
                },
            )
        });

        let sizes = clustered.count_by_key();
        let fractions = fractions::estimate_fractions(&sizes);

        info!(
            items = content.len(),
            k = model.k(),
            non_empty = sizes.len(),
            iterations = model.iterations(),
            "trained item clusters"
        );
        debug!(?sizes, ?fractions, "cluster composition");

        let report = ClusterReport {
            k: model.k(),
            iterations: model.iterations(),
            inertia: model.inertia(),
            sizes,
            fractions,
        };

        Ok(TrainedClusters {
            model,
            items: clustered.map(|(_, item)| item).collect(),
            report,
        })
    }

    fn validate(&self, num_predictions: usize) -> Result<()> {
        validate_num_predictions(num_predictions)?;
        validate_num_partitions(self.num_partitions)?;
        if self.clustering.k == 0 {
            return Err(RecommendError::invalid("k must be positive"));
        }
        Ok(())
    }
}

impl Recommender for ContentKMeansRecommender {
    fn predict(
        &self,
        ratings: &[Rating],
        content: &[ContentVector],
        num_predictions: usize,
    ) -> Result<PredictionRun> {
        self.validate(num_predictions)?;
        validate_ratings(ratings)?;
        validate_catalog(content)?;
        if !content.is_empty() {
            validate_cluster_count(self.clustering.k, content.len())?;
        }

        let Some(rating_range) = RatingRange::from_ratings(ratings) else {
            info!("no ratings, nothing to predict");
            return Ok(PredictionRun::empty(EmptyInput::NoRatings));
        };
        if content.is_empty() {
            info!("no content vectors, nothing to predict");
            return Ok(PredictionRun::empty(EmptyInput::NoContent));
        }

        let clusters = self.train_clusters(content)?;
        let empty_run = |reason: EmptyInput| {
            info!(%reason, "run produced no predictions");
            Ok(PredictionRun::empty(reason)
                .with_context(Some(rating_range), Some(clusters.report.clone())))
        };

        let profiles = profile::build_profiles(ratings, content, self.num_partitions);
        if profiles.is_empty() {
            return empty_run(EmptyInput::NoProfiles);
        }
        info!(users = profiles.len(), "built user profiles");

        let candidates = scorer::score_candidates(
            &profiles,
            &clusters.items,
            self.scoring.zero_norm_policy,
            self.num_partitions,
        );
        if candidates.is_empty() {
            return empty_run(EmptyInput::NoCandidates);
        }

        let selected =
            selector::select_diversified(candidates, &clusters.report.fractions, num_predictions);
        if selected.is_empty() {
            return empty_run(EmptyInput::NoCandidates);
        }

        let predictions = rescaler::rescale(
            selected,
            rating_range,
            self.scoring.degenerate_range_policy,
        )?;

        info!(
            users = profiles.len(),
            predictions = predictions.len(),
            "prediction run complete"
        );

        Ok(PredictionRun::new(rating_range, clusters.report, predictions))
    }
}
