use crate::{ItemId, Result, ScoredItem, UserId};

/// A pre-trained, immutable scoring backend.
///
/// The model is built once by the offline training collaborator and then only
/// read. Implementations must be safe for unsynchronized concurrent reads:
/// many workers call into the same instance at once.
pub trait RankingModel: Send + Sync {
    /// Items eligible for scoring for `user`: the held-out evaluation set, i.e.
    /// items the user did not interact with in the training partition.
    ///
    /// Returns an empty slice for users the model has no held-out items for,
    /// including users outside the model's rows.
    fn candidates(&self, user: UserId) -> &[ItemId];

    /// Scores `items` for `user`. The output order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error when the candidate set is malformed for this model,
    /// for example when it names an item the model was never trained on.
    fn score(&self, user: UserId, items: &[ItemId]) -> Result<Vec<ScoredItem>>;
}
