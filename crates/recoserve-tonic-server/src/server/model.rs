//! Startup loading of the ranking model.

use crate::server::config::ServerConfig;
use anyhow::Context;
use recoserve_tonic_core::recoserve::{
    FactorModel, ModelArtifact, RecommendationEngine, UserUniverse,
};
use std::sync::Arc;

/// Builds the engine described by `config`.
///
/// With `MODEL_PATH` set, the artifact is read and validated; any problem is
/// returned as an error and must abort startup. Without it, an untrained
/// model over `NUM_USERS` users is used and every call is answered from the
/// fallback list.
pub fn load_engine(config: &ServerConfig) -> anyhow::Result<RecommendationEngine> {
    let model = match &config.model_path {
        Some(path) => {
            let artifact = ModelArtifact::from_path(path)
                .with_context(|| format!("failed to read model from {}", path.display()))?;
            let model = FactorModel::try_from(artifact)
                .with_context(|| format!("invalid model in {}", path.display()))?;
            tracing::info!(
                users = model.universe().len().get(),
                items = model.item_count(),
                factors = model.factor_count(),
                "Loaded model from {}",
                path.display()
            );
            model
        }
        None => {
            let universe = UserUniverse::new(config.num_users).context("invalid NUM_USERS")?;
            tracing::warn!(
                users = config.num_users,
                "MODEL_PATH not set, serving the fallback list only"
            );
            FactorModel::untrained(universe)
        }
    };

    let engine = RecommendationEngine::new(model.universe(), Arc::new(model))
        .with_fallback(config.fallback.clone())
        .with_top_k(config.top_k)?;

    Ok(engine)
}
