//! Error types for the recommendation pipeline.
//!
//! Only startup (artifact loading, engine configuration) and the scoring step
//! can fail. Identity resolution is total and has no error case. Scoring
//! failures never leave the engine: they are converted into a fallback
//! response by [`RecommendationEngine`](crate::RecommendationEngine).

use crate::{ItemId, UserId};
use std::path::PathBuf;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `recoserve` can produce.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A user universe must contain at least one user.
    #[error("user universe must contain at least one user")]
    EmptyUniverse,

    /// The model artifact could not be read from disk.
    #[error("failed to read model artifact {path}: {source}")]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The model artifact is not valid JSON or does not match the schema.
    #[error("failed to parse model artifact: {0}")]
    ArtifactFormat(#[from] serde_json::Error),

    /// The model artifact parsed, but its contents are inconsistent.
    #[error("invalid model artifact: {reason}")]
    InvalidArtifact { reason: String },

    /// The model has no row for this user.
    #[error("user {user} is unknown to the model")]
    UnknownUser { user: UserId },

    /// A scored item has no latent factors in the model.
    #[error("item {item} is unknown to the model")]
    UnknownItem { item: ItemId },

    /// The scoring backend produced NaN or an infinite score.
    #[error("non-finite score {score} for item {item} (user {user})")]
    NonFiniteScore {
        user: UserId,
        item: ItemId,
        score: f32,
    },

    /// The fallback list names the same item twice.
    #[error("fallback list contains duplicate item {item}")]
    DuplicateFallback { item: ItemId },

    /// `K` must be at least 1.
    #[error("top-k must be greater than 0")]
    InvalidTopK,
}
