//! Top-K recommendation with graceful degradation.
//!
//! [`RecommendationEngine::recommend`] never fails. Whenever the ranking step
//! cannot produce a list (no held-out candidates, a scoring error, every
//! ranked item excluded), the caller gets the configured [`FallbackList`]
//! instead, and the returned [`Recommendations`] records why through its
//! [`Origin`].

mod fallback;
#[cfg(test)]
mod tests;

pub use fallback::*;

use core::cmp::Ordering;
use crate::{Error, IdentityResolver, ItemId, RankingModel, Result, UserId, UserUniverse};
use std::collections::HashSet;
use std::sync::Arc;

/// Maximum number of items returned per call unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 10;

/// Why a response was served from the fallback list.
#[derive(Debug)]
pub enum FallbackReason {
    /// The model holds no candidate items for the resolved user.
    NoCandidates,
    /// The model rejected the candidate set or produced an unusable score.
    ScoringFailed(Error),
    /// Every ranked candidate was in the caller's exclusion set.
    Exhausted,
}

/// Where the items of a [`Recommendations`] came from.
#[derive(Debug)]
pub enum Origin {
    Ranked,
    Fallback(FallbackReason),
}

/// Result of one recommendation call: at most `K` distinct items, best first.
#[derive(Debug)]
pub struct Recommendations {
    user: UserId,
    items: Vec<ItemId>,
    origin: Origin,
}

impl Recommendations {
    /// The user the caller token resolved to.
    pub const fn user(&self) -> UserId {
        self.user
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ItemId> {
        self.items
    }

    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback(_))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resolves callers to users and ranks their candidate items.
///
/// Holds only shared, immutable state, so one instance can serve any number
/// of concurrent callers through an [`Arc`].
pub struct RecommendationEngine {
    resolver: IdentityResolver,
    model: Arc<dyn RankingModel>,
    fallback: FallbackList,
    top_k: usize,
}

impl RecommendationEngine {
    /// Creates an engine with the default fallback list and `K` =
    /// [`DEFAULT_TOP_K`].
    pub fn new(universe: UserUniverse, model: Arc<dyn RankingModel>) -> Self {
        Self {
            resolver: IdentityResolver::new(universe),
            model,
            fallback: FallbackList::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackList) -> Self {
        self.fallback = fallback;
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidTopK`] when `top_k` is zero.
    pub fn with_top_k(mut self, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::InvalidTopK);
        }
        self.top_k = top_k;
        Ok(self)
    }

    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    pub const fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub const fn fallback(&self) -> &FallbackList {
        &self.fallback
    }

    /// Recommends up to `K` items for the caller identified by `token`.
    ///
    /// Items in `excluded` are removed from the ranked list before it is
    /// truncated. Ranking is by descending score with ties broken by
    /// ascending [`ItemId`], so identical inputs always produce identical
    /// output.
    ///
    /// If `excluded` removes every ranked item, the fallback list (minus
    /// excluded items) is returned instead of an empty list.
    pub fn recommend(&self, token: &str, excluded: &HashSet<ItemId>) -> Recommendations {
        let user = self.resolver.resolve(token);

        match self.rank(user, excluded) {
            Ok(items) => Recommendations {
                user,
                items,
                origin: Origin::Ranked,
            },
            Err(reason) => self.fall_back(user, reason, excluded),
        }
    }

    fn rank(
        &self,
        user: UserId,
        excluded: &HashSet<ItemId>,
    ) -> core::result::Result<Vec<ItemId>, FallbackReason> {
        let candidates = self.model.candidates(user);
        if candidates.is_empty() {
            return Err(FallbackReason::NoCandidates);
        }

        let mut scored = self
            .model
            .score(user, candidates)
            .map_err(FallbackReason::ScoringFailed)?;

        if let Some(bad) = scored.iter().find(|s| !s.score.is_finite()) {
            return Err(FallbackReason::ScoringFailed(Error::NonFiniteScore {
                user,
                item: bad.item.clone(),
                score: bad.score,
            }));
        }

        // Scores are finite here; `0.0` and `-0.0` must compare equal.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.item.cmp(&b.item))
        });

        let mut seen = HashSet::with_capacity(self.top_k);
        let items: Vec<ItemId> = scored
            .into_iter()
            .map(|s| s.item)
            .filter(|item| !excluded.contains(item))
            .filter(|item| seen.insert(item.clone()))
            .take(self.top_k)
            .collect();

        if items.is_empty() {
            return Err(FallbackReason::Exhausted);
        }
        Ok(items)
    }

    fn fall_back(
        &self,
        user: UserId,
        reason: FallbackReason,
        excluded: &HashSet<ItemId>,
    ) -> Recommendations {
        let fallback = self.fallback.items().iter();
        let items = match reason {
            // Exclusions carry over to the static list.
            FallbackReason::Exhausted => fallback
                .filter(|item| !excluded.contains(*item))
                .take(self.top_k)
                .cloned()
                .collect(),
            FallbackReason::NoCandidates | FallbackReason::ScoringFailed(_) => {
                fallback.take(self.top_k).cloned().collect()
            }
        };

        Recommendations {
            user,
            items,
            origin: Origin::Fallback(reason),
        }
    }
}
