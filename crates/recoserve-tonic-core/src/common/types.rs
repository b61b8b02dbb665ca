//! Conversions between the wire messages and `recoserve` types.
//!
//! The wire format speaks plain strings. On the way in, the request is split
//! into the caller token and the exclusion set the engine expects; on the way
//! out, ranked [`ItemId`]s become `product_ids` in order.

use crate::proto::{ListRecommendationsRequest, ListRecommendationsResponse};
use recoserve::{ItemId, Recommendations};
use std::collections::HashSet;

impl ListRecommendationsRequest {
    /// Splits the request into the caller token and the set of products to
    /// exclude from the ranking.
    pub fn into_parts(self) -> (String, HashSet<ItemId>) {
        let excluded = self.product_ids.into_iter().map(ItemId::from).collect();
        (self.user_id, excluded)
    }
}

impl From<Recommendations> for ListRecommendationsResponse {
    fn from(recs: Recommendations) -> Self {
        Self {
            product_ids: recs.into_items().into_iter().map(String::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recoserve::{FactorModel, RecommendationEngine, UserUniverse};
    use std::sync::Arc;

    #[test]
    fn request_splits_into_token_and_exclusions() {
        let request = ListRecommendationsRequest {
            user_id: "abc".into(),
            product_ids: vec!["A".into(), "B".into(), "A".into()],
        };
        let (token, excluded) = request.into_parts();
        assert_eq!(token, "abc");
        assert_eq!(excluded.len(), 2);
        assert!(excluded.contains(&ItemId::from("B")));
    }

    #[test]
    fn response_preserves_order() {
        let universe = UserUniverse::new(5).unwrap();
        let engine = RecommendationEngine::new(universe, Arc::new(FactorModel::untrained(universe)));
        let response = ListRecommendationsResponse::from(engine.recommend("abc", &HashSet::new()));
        assert_eq!(
            response.product_ids,
            ["1YMWWN1N4O", "L9ECAV7KIM", "LS4PSXUNUM", "9SIQT8TOJO", "OLJCESPC7Z"]
        );
    }
}
