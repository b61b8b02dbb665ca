use crate::{
    Error, ItemFactors, ItemId, ModelArtifact, RankingModel, Result, ScoredItem, UserId,
    UserRecord, UserUniverse,
};
use std::collections::HashMap;

/// Biased matrix-factorization model.
///
/// Predicts `global_mean + b_u + b_i + p_u · q_i`, optionally clipped to the
/// artifact's rating scale. Clipping flattens the top of the ranking into
/// ties, which the engine breaks by item id.
#[derive(Debug)]
pub struct FactorModel {
    universe: UserUniverse,
    global_mean: f32,
    rating_scale: Option<(f32, f32)>,
    users: Vec<UserRecord>,
    items: HashMap<ItemId, ItemFactors>,
}

impl FactorModel {
    /// A model with no learned parameters and no candidates for anyone.
    ///
    /// Every user resolves fine but ranking is always unavailable, so the
    /// engine serves its fallback list.
    pub fn untrained(universe: UserUniverse) -> Self {
        Self {
            universe,
            global_mean: 0.0,
            rating_scale: None,
            users: Vec::new(),
            items: HashMap::new(),
        }
    }

    /// The users this model was trained for, `1..=users.len()`.
    pub const fn universe(&self) -> UserUniverse {
        self.universe
    }

    /// Number of latent factors per user and item.
    pub fn factor_count(&self) -> usize {
        self.users.first().map_or(0, |u| u.factors.len())
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    fn predict(&self, user: &UserRecord, item: &ItemFactors) -> f32 {
        let dot: f32 = user
            .factors
            .iter()
            .zip(&item.factors)
            .map(|(p, q)| p * q)
            .sum();
        let estimate = self.global_mean + user.bias + item.bias + dot;
        match self.rating_scale {
            Some((lo, hi)) => estimate.clamp(lo, hi),
            None => estimate,
        }
    }
}

impl RankingModel for FactorModel {
    fn candidates(&self, user: UserId) -> &[ItemId] {
        self.users
            .get(user.index())
            .map_or(&[], |record| record.candidates.as_slice())
    }

    fn score(&self, user: UserId, items: &[ItemId]) -> Result<Vec<ScoredItem>> {
        let record = self
            .users
            .get(user.index())
            .ok_or(Error::UnknownUser { user })?;

        items
            .iter()
            .map(|item| {
                let factors = self
                    .items
                    .get(item)
                    .ok_or_else(|| Error::UnknownItem { item: item.clone() })?;
                Ok(ScoredItem {
                    item: item.clone(),
                    score: self.predict(record, factors),
                })
            })
            .collect()
    }
}

impl TryFrom<ModelArtifact> for FactorModel {
    type Error = Error;

    fn try_from(artifact: ModelArtifact) -> Result<Self> {
        let universe = UserUniverse::new(artifact.users.len() as u64)?;
        let width = artifact.users[0].factors.len();

        if !artifact.global_mean.is_finite() {
            return Err(invalid("global_mean is not finite"));
        }

        if let Some((lo, hi)) = artifact.rating_scale {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(invalid(format!("rating_scale [{lo}, {hi}] is not a range")));
            }
        }

        for (i, user) in artifact.users.iter().enumerate() {
            check_params(&format!("user {}", i + 1), user.bias, &user.factors, width)?;
        }
        for (id, item) in &artifact.items {
            check_params(&format!("item {id}"), item.bias, &item.factors, width)?;
        }

        Ok(Self {
            universe,
            global_mean: artifact.global_mean,
            rating_scale: artifact.rating_scale,
            users: artifact.users,
            items: artifact.items,
        })
    }
}

fn check_params(owner: &str, bias: f32, factors: &[f32], width: usize) -> Result<()> {
    if factors.len() != width {
        return Err(invalid(format!(
            "{owner} has {} factors, expected {width}",
            factors.len()
        )));
    }
    if !bias.is_finite() || factors.iter().any(|f| !f.is_finite()) {
        return Err(invalid(format!("{owner} has non-finite parameters")));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidArtifact {
        reason: reason.into(),
    }
}
