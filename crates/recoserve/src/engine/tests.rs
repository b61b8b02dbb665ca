use crate::{
    DEFAULT_FALLBACK, Error, FactorModel, FallbackList, FallbackReason, ItemId, ModelArtifact,
    Origin, RankingModel, RecommendationEngine, Result, ScoredItem, UserId, UserUniverse,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Scores each candidate with a fixed value, or fails, for every user.
struct TableModel {
    candidates: Vec<ItemId>,
    scores: Vec<(ItemId, f32)>,
    fail: bool,
}

impl TableModel {
    fn new(scores: &[(&str, f32)]) -> Self {
        Self {
            candidates: scores.iter().map(|(id, _)| ItemId::from(*id)).collect(),
            scores: scores.iter().map(|(id, s)| (ItemId::from(*id), *s)).collect(),
            fail: false,
        }
    }

    fn failing(candidates: &[&str]) -> Self {
        Self {
            candidates: candidates.iter().copied().map(ItemId::from).collect(),
            scores: Vec::new(),
            fail: true,
        }
    }
}

impl RankingModel for TableModel {
    fn candidates(&self, _user: UserId) -> &[ItemId] {
        &self.candidates
    }

    fn score(&self, _user: UserId, items: &[ItemId]) -> Result<Vec<ScoredItem>> {
        if self.fail {
            return Err(Error::UnknownItem {
                item: items[0].clone(),
            });
        }
        Ok(self
            .scores
            .iter()
            .map(|(item, score)| ScoredItem::new(item.clone(), *score))
            .collect())
    }
}

fn engine(model: impl RankingModel + 'static, users: u64) -> RecommendationEngine {
    RecommendationEngine::new(UserUniverse::new(users).unwrap(), Arc::new(model))
}

fn ids(items: &[ItemId]) -> Vec<&str> {
    items.iter().map(ItemId::as_str).collect()
}

fn none() -> HashSet<ItemId> {
    HashSet::new()
}

#[test]
fn ranks_by_descending_score() {
    let engine = engine(TableModel::new(&[("A", 1.0), ("B", 3.0), ("C", 2.0)]), 5);
    let recs = engine.recommend("abc", &none());
    assert!(matches!(recs.origin(), Origin::Ranked));
    assert_eq!(ids(recs.items()), ["B", "C", "A"]);
}

#[test]
fn ties_break_by_ascending_item_id() {
    let engine = engine(
        TableModel::new(&[("Z", 5.0), ("M", 5.0), ("A", 5.0), ("Q", 4.0)]),
        5,
    );
    let recs = engine.recommend("abc", &none());
    assert_eq!(ids(recs.items()), ["A", "M", "Z", "Q"]);
}

#[test]
fn signed_zero_scores_tie() {
    let engine = engine(TableModel::new(&[("B", 0.0), ("A", -0.0), ("C", -1.0)]), 5);
    let recs = engine.recommend("abc", &none());
    assert_eq!(ids(recs.items()), ["A", "B", "C"]);
}

#[test]
fn never_returns_more_than_k_items() {
    let scores: Vec<(String, f32)> = (0..50).map(|i| (format!("item-{i:02}"), i as f32)).collect();
    let table: Vec<(&str, f32)> = scores.iter().map(|(id, s)| (id.as_str(), *s)).collect();
    let engine = engine(TableModel::new(&table), 5);

    let recs = engine.recommend("abc", &none());
    assert_eq!(recs.len(), 10);
    assert_eq!(recs.items()[0].as_str(), "item-49");
    assert_eq!(recs.items()[9].as_str(), "item-40");

    let engine = engine.with_top_k(3).unwrap();
    assert_eq!(engine.recommend("abc", &none()).len(), 3);
}

#[test]
fn duplicate_candidates_are_collapsed() {
    let engine = engine(
        TableModel::new(&[("A", 1.0), ("B", 2.0), ("A", 3.0), ("B", 0.5)]),
        5,
    );
    let recs = engine.recommend("abc", &none());
    assert_eq!(ids(recs.items()), ["A", "B"]);

    let unique: HashSet<&ItemId> = recs.items().iter().collect();
    assert_eq!(unique.len(), recs.len());
}

#[test]
fn excluded_items_are_removed_before_truncation() {
    let scores: Vec<(String, f32)> = (0..12).map(|i| (format!("i{i:02}"), i as f32)).collect();
    let table: Vec<(&str, f32)> = scores.iter().map(|(id, s)| (id.as_str(), *s)).collect();
    let engine = engine(TableModel::new(&table), 5);

    let excluded: HashSet<ItemId> = ["i11", "i10"].into_iter().map(ItemId::from).collect();
    let recs = engine.recommend("abc", &excluded);

    assert_eq!(recs.len(), 10);
    assert_eq!(recs.items()[0].as_str(), "i09");
    assert_eq!(recs.items()[9].as_str(), "i00");
    assert!(recs.items().iter().all(|item| !excluded.contains(item)));
}

#[test]
fn empty_candidates_yield_exact_fallback() {
    let engine = engine(TableModel::new(&[]), 5);
    let excluded: HashSet<ItemId> = [ItemId::from("OLJCESPC7Z")].into_iter().collect();

    let recs = engine.recommend("abc", &excluded);
    assert!(matches!(
        recs.origin(),
        Origin::Fallback(FallbackReason::NoCandidates)
    ));
    assert_eq!(ids(recs.items()), DEFAULT_FALLBACK);
}

#[test]
fn scoring_errors_are_absorbed_into_fallback() {
    let engine = engine(TableModel::failing(&["A", "B"]), 5);
    let recs = engine.recommend("abc", &none());
    assert!(matches!(
        recs.origin(),
        Origin::Fallback(FallbackReason::ScoringFailed(Error::UnknownItem { .. }))
    ));
    assert_eq!(ids(recs.items()), DEFAULT_FALLBACK);
}

#[test]
fn non_finite_scores_are_treated_as_scoring_failure() {
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        let engine = engine(TableModel::new(&[("A", 1.0), ("B", bad)]), 5);
        let recs = engine.recommend("abc", &none());
        assert!(matches!(
            recs.origin(),
            Origin::Fallback(FallbackReason::ScoringFailed(Error::NonFiniteScore { .. }))
        ));
        assert_eq!(ids(recs.items()), DEFAULT_FALLBACK);
    }
}

#[test]
fn fully_excluded_ranking_falls_back_without_excluded_items() {
    let engine = engine(TableModel::new(&[("A", 1.0), ("B", 2.0)]), 5);
    let excluded: HashSet<ItemId> = ["A", "B", "L9ECAV7KIM"]
        .into_iter()
        .map(ItemId::from)
        .collect();

    let recs = engine.recommend("abc", &excluded);
    assert!(matches!(
        recs.origin(),
        Origin::Fallback(FallbackReason::Exhausted)
    ));
    assert_eq!(
        ids(recs.items()),
        ["1YMWWN1N4O", "LS4PSXUNUM", "9SIQT8TOJO", "OLJCESPC7Z"]
    );
}

#[test]
fn custom_fallback_is_truncated_to_k() {
    let fallback = FallbackList::new(["A", "B", "C", "D"]).unwrap();
    let engine = engine(TableModel::new(&[]), 5)
        .with_fallback(fallback)
        .with_top_k(2)
        .unwrap();
    assert_eq!(ids(engine.recommend("x", &none()).items()), ["A", "B"]);
}

#[test]
fn zero_top_k_is_rejected() {
    let result = engine(TableModel::new(&[]), 5).with_top_k(0);
    assert!(matches!(result, Err(Error::InvalidTopK)));
}

#[test]
fn same_token_same_user_same_list() {
    let engine = engine(TableModel::new(&[("A", 1.0), ("B", 2.0)]), 5);
    let first = engine.recommend("abc", &none());
    assert_eq!(first.user().get(), 3);
    for _ in 0..10 {
        let again = engine.recommend("abc", &none());
        assert_eq!(again.user(), first.user());
        assert_eq!(again.items(), first.items());
    }
}

#[test]
fn factor_model_end_to_end() {
    // Three users; "abc" resolves to user 3, who has no held-out items.
    let artifact = ModelArtifact::from_json(
        r#"{
            "global_mean": 3.0,
            "rating_scale": [1.0, 5.0],
            "users": [
                { "bias": 0.0, "factors": [1.0], "candidates": ["X", "Y", "Z"] },
                { "bias": 0.0, "factors": [1.0], "candidates": ["X", "Y", "Z"] },
                { "bias": 0.0, "factors": [1.0], "candidates": [] }
            ],
            "items": {
                "X": { "bias": 0.0, "factors": [9.0] },
                "Y": { "bias": 0.0, "factors": [-1.0] },
                "Z": { "bias": 0.0, "factors": [4.0] }
            }
        }"#,
    )
    .unwrap();
    let model = Arc::new(FactorModel::try_from(artifact).unwrap());
    let engine = RecommendationEngine::new(model.universe(), model);

    let recs = engine.recommend("abc", &none());
    assert_eq!(recs.user().get(), 3);
    assert!(recs.is_fallback());
    assert_eq!(ids(recs.items()), DEFAULT_FALLBACK);

    // Find a token that lands on a user with candidates: X and Z both clip to
    // 5.0 and tie, so X comes first by id.
    let token = (0..)
        .map(|i| format!("token-{i}"))
        .find(|t| engine.resolver().resolve(t).get() != 3)
        .unwrap();
    let recs = engine.recommend(&token, &none());
    assert!(matches!(recs.origin(), Origin::Ranked));
    assert_eq!(ids(recs.items()), ["X", "Z", "Y"]);
}
