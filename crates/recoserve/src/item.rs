use core::fmt;
use serde::{Deserialize, Serialize};

/// Opaque catalog item identifier (for example `"OLJCESPC7Z"`).
///
/// Ordering is lexicographic on the underlying string and is used to break
/// score ties deterministically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An item paired with the score a [`RankingModel`](crate::RankingModel)
/// assigned to it for one user.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredItem {
    pub item: ItemId,
    pub score: f32,
}

impl ScoredItem {
    pub fn new(item: impl Into<ItemId>, score: f32) -> Self {
        Self {
            item: item.into(),
            score,
        }
    }
}
