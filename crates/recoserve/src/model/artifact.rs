//! On-disk form of a trained factorization model.
//!
//! The offline training job writes one JSON document per model. Users are
//! positional: `users[0]` is user 1, `users[N - 1]` is user `N`.
//!
//! ```json
//! {
//!   "global_mean": 3.53,
//!   "rating_scale": [1.0, 5.0],
//!   "users": [
//!     { "bias": 0.12, "factors": [0.3, -0.1], "candidates": ["OLJCESPC7Z", "66VCHSJNUP"] }
//!   ],
//!   "items": {
//!     "OLJCESPC7Z": { "bias": -0.2, "factors": [0.5, 0.4] },
//!     "66VCHSJNUP": { "bias": 0.05, "factors": [0.1, 0.9] }
//!   }
//! }
//! ```

use crate::{Error, ItemId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Mean of all training ratings.
    pub global_mean: f32,
    /// Inclusive `[min, max]` range predictions are clipped to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_scale: Option<(f32, f32)>,
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub items: HashMap<ItemId, ItemFactors>,
}

/// Learned parameters and held-out candidate items for one user.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub bias: f32,
    #[serde(default)]
    pub factors: Vec<f32>,
    /// Items this user did not interact with in the training partition.
    #[serde(default)]
    pub candidates: Vec<ItemId>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ItemFactors {
    #[serde(default)]
    pub bias: f32,
    #[serde(default)]
    pub factors: Vec<f32>,
}

impl ModelArtifact {
    /// Reads and parses an artifact file.
    ///
    /// # Errors
    ///
    /// [`Error::ArtifactIo`] if the file cannot be opened,
    /// [`Error::ArtifactFormat`] if it is not a valid artifact document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Parses an artifact from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
