use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{ItemId, UserId};

pub type Result<T> = std::result::Result<T, RecommendError>;

/// Why a run produced no predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyInput {
    NoRatings,
    NoContent,
    /// No rating matched an item with a content vector.
    NoProfiles,
    /// Every (user, item) pair was excluded during scoring or selection.
    NoCandidates,
}

impl std::fmt::Display for EmptyInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            EmptyInput::NoRatings => "no ratings",
            EmptyInput::NoContent => "no content vectors",
            EmptyInput::NoProfiles => "no rating matched a content vector",
            EmptyInput::NoCandidates => "no scored candidates",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("empty input: {0}")]
    EmptyInput(EmptyInput),

    #[error("zero-norm vector scoring user {user_id} against item {item_id}")]
    DegenerateVector { user_id: UserId, item_id: ItemId },

    #[error("all selected scores equal {value}, cannot rescale")]
    DegenerateRange { value: f64 },

    #[error("pipeline did not finish within {0:?}")]
    Timeout(Duration),

    #[error("pipeline runtime failure: {0}")]
    Runtime(String),
}

impl RecommendError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RecommendError::InvalidConfiguration(message.into())
    }
}
