use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RecommendError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub clustering: ClusteringConfig,
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    pub k: usize,
    pub max_iterations: usize,
    /// Stop once no centroid moves farther than this.
    pub tolerance: f64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Partition count for the user x item scoring stage.
    pub num_partitions: usize,
    pub workers: usize,
    pub timeout_secs: u64,
}

impl PipelineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroNormPolicy {
    /// Drop the (user, item) pair.
    Exclude,
    /// Keep the pair with a similarity of 0.0.
    ZeroScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateRangePolicy {
    Fail,
    /// Every prediction becomes the lowest observed rating.
    MinRating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub zero_norm_policy: ZeroNormPolicy,
    pub degenerate_range_policy: DegenerateRangePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: 10,
            max_iterations: 100,
            tolerance: 1e-4,
            seed: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_partitions: 20,
            workers: num_cpus::get(),
            timeout_secs: 300,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            zero_norm_policy: ZeroNormPolicy::Exclude,
            degenerate_range_policy: DegenerateRangePolicy::Fail,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            pipeline: PipelineConfig::default(),
            scoring: ScoringConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("DIVREC").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.clustering.k == 0 {
            return Err(RecommendError::invalid("k must be positive"));
        }
        if self.clustering.max_iterations == 0 {
            return Err(RecommendError::invalid("max_iterations must be positive"));
        }
        if !self.clustering.tolerance.is_finite() || self.clustering.tolerance < 0.0 {
            return Err(RecommendError::invalid("tolerance must be a non-negative number"));
        }
        if self.pipeline.num_partitions == 0 {
            return Err(RecommendError::invalid("num_partitions must be positive"));
        }
        if self.pipeline.workers == 0 {
            return Err(RecommendError::invalid("workers must be positive"));
        }
        if self.pipeline.timeout_secs == 0 {
            return Err(RecommendError::invalid("timeout_secs must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.clustering.k, 10);
        assert_eq!(config.pipeline.num_partitions, 20);
        assert_eq!(config.scoring.zero_norm_policy, ZeroNormPolicy::Exclude);
        assert_eq!(config.scoring.degenerate_range_policy, DegenerateRangePolicy::Fail);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_k() {
        let mut config = Config::default();
        config.clustering.k = 0;
        assert!(matches!(
            config.validate(),
            Err(RecommendError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("divrec-config-{}.toml", std::process::id()));
        let contents = concat!(
            "[clustering]\nk = 4\nseed = 7\n\n",
            "[scoring]\ndegenerate_range_policy = \"min_rating\"\n",
        );
        std::fs::write(&path, contents).unwrap();

        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.clustering.k, 4);
        assert_eq!(config.clustering.seed, Some(7));
        assert_eq!(config.clustering.max_iterations, 100);
        assert_eq!(config.pipeline.num_partitions, 20);
        assert_eq!(config.scoring.degenerate_range_policy, DegenerateRangePolicy::MinRating);
        assert_eq!(config.scoring.zero_norm_policy, ZeroNormPolicy::Exclude);
    }

    #[test]
    fn test_policy_serde_names() {
        let policy: ZeroNormPolicy = serde_json::from_str("\"zero_score\"").unwrap();
        assert_eq!(policy, ZeroNormPolicy::ZeroScore);
        let policy: DegenerateRangePolicy = serde_json::from_str("\"min_rating\"").unwrap();
        assert_eq!(policy, DegenerateRangePolicy::MinRating);
    }
}
