//! # `recoserve`: recommendation-serving pipeline
//!
//! This crate holds the in-memory half of the recommendation server. Given an
//! opaque caller token, it produces an ordered, de-duplicated list of at most
//! `K` item identifiers:
//!
//! 1. [`IdentityResolver`] hashes the token into a [`UserId`] within a fixed
//!    [`UserUniverse`].
//! 2. A [`RankingModel`] exposes the user's candidate items and scores them.
//! 3. [`RecommendationEngine`] sorts, filters and truncates the scores, or
//!    falls back to a static [`FallbackList`] when ranking is unavailable.
//!
//! Everything here is immutable after construction and safe to share across
//! threads behind an [`Arc`](std::sync::Arc). Nothing on the request path
//! performs I/O; the only I/O is [`ModelArtifact::from_path`], which runs once
//! at startup.
//!
//! ## Example
//!
//! ```rust
//! use recoserve::{FactorModel, RecommendationEngine, UserUniverse};
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! let universe = UserUniverse::new(943).unwrap();
//! let model = Arc::new(FactorModel::untrained(universe));
//! let engine = RecommendationEngine::new(universe, model);
//!
//! let recs = engine.recommend("session-1234", &HashSet::new());
//! assert!(recs.is_fallback());
//! assert_eq!(recs.len(), 5);
//! ```

mod engine;
mod error;
mod item;
mod model;
mod resolver;
mod user;

pub use crate::engine::*;
pub use crate::error::*;
pub use crate::item::*;
pub use crate::model::*;
pub use crate::resolver::*;
pub use crate::user::*;
