use crate::{Error, ItemId, Result};
use std::collections::HashSet;

/// Items served when ranking is unavailable for the resolved user.
pub const DEFAULT_FALLBACK: [&str; 5] = [
    "1YMWWN1N4O",
    "L9ECAV7KIM",
    "LS4PSXUNUM",
    "9SIQT8TOJO",
    "OLJCESPC7Z",
];

/// A fixed, ordered, duplicate-free list of items used when ranking is
/// unavailable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackList(Vec<ItemId>);

impl FallbackList {
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFallback`] if any item appears twice.
    pub fn new<I, T>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        let items: Vec<ItemId> = items.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item) {
                return Err(Error::DuplicateFallback { item: item.clone() });
            }
        }
        Ok(Self(items))
    }

    pub fn items(&self) -> &[ItemId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FallbackList {
    fn default() -> Self {
        Self(DEFAULT_FALLBACK.into_iter().map(ItemId::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_static_popular_list() {
        let fallback = FallbackList::default();
        let ids: Vec<&str> = fallback.items().iter().map(ItemId::as_str).collect();
        assert_eq!(ids, DEFAULT_FALLBACK);
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = FallbackList::new(["A", "B", "A"]).unwrap_err();
        assert!(matches!(err, Error::DuplicateFallback { item } if item.as_str() == "A"));
    }

    #[test]
    fn order_is_preserved() {
        let fallback = FallbackList::new(["Z", "A", "M"]).unwrap();
        assert_eq!(
            fallback.items(),
            &[ItemId::from("Z"), ItemId::from("A"), ItemId::from("M")]
        );
    }
}
