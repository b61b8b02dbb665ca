//! gRPC entry point for recommendation calls.
//!
//! [`RecommendationHandler`] implements the generated
//! [`RecommendationService`] trait. Each call is handed to the
//! [`WorkerPool`], so the number of recommendations computed at once is
//! bounded by the pool size regardless of how many connections are open.

use crate::server::{
    pool::manager::WorkerPool,
    telemetry::{
        decrement_requests_inflight, increment_fallbacks, increment_request_errors,
        increment_requests, increment_requests_inflight, record_items_per_response,
        record_request_duration,
    },
};
use core::time::Duration;
use recoserve_tonic_core::{
    proto::{
        ListRecommendationsRequest, ListRecommendationsResponse,
        recommendation_service_server::RecommendationService,
    },
    recoserve::{FallbackReason, Origin, RecommendationEngine},
};
use std::sync::Arc;
use std::time::Instant;
use tonic::{Request, Response, Status};

#[derive(Clone)]
pub struct RecommendationHandler {
    pool: Arc<WorkerPool>,
}

impl RecommendationHandler {
    /// Spawns the worker pool backing this handler.
    pub fn new(
        engine: Arc<RecommendationEngine>,
        num_workers: usize,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            pool: Arc::new(WorkerPool::spawn(engine, num_workers, shutdown_timeout)),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Refuses new calls and waits for in-flight ones before stopping workers.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

const fn fallback_label(reason: &FallbackReason) -> &'static str {
    match reason {
        FallbackReason::NoCandidates => "no_candidates",
        FallbackReason::ScoringFailed(_) => "scoring_failed",
        FallbackReason::Exhausted => "exhausted",
    }
}

#[tonic::async_trait]
impl RecommendationService for RecommendationHandler {
    /// Ranks products for the caller named by `user_id`, leaving out
    /// `product_ids`.
    ///
    /// Ranking problems are answered from the fallback list, never with an
    /// error status. Errors only come from the serving machinery: a draining
    /// server (`UNAVAILABLE`) or a failed worker (`INTERNAL`).
    #[tracing::instrument(skip_all, fields(excluded = req.get_ref().product_ids.len()))]
    async fn list_recommendations(
        &self,
        req: Request<ListRecommendationsRequest>,
    ) -> Result<Response<ListRecommendationsResponse>, Status> {
        let start = Instant::now();
        increment_requests();
        increment_requests_inflight();

        let (token, excluded) = req.into_inner().into_parts();
        let result = self.pool.recommend(token, excluded).await;

        decrement_requests_inflight();
        record_request_duration(start.elapsed().as_secs_f64() * 1000.0);

        let recs = result.map_err(|e| {
            increment_request_errors();
            tracing::warn!("ListRecommendations failed: {e}");
            Status::from(e)
        })?;

        if let Origin::Fallback(reason) = recs.origin() {
            increment_fallbacks(fallback_label(reason));
            match reason {
                FallbackReason::ScoringFailed(e) => {
                    tracing::warn!(user = recs.user().get(), "Serving fallback list: {e}");
                }
                other => {
                    tracing::debug!(
                        user = recs.user().get(),
                        "Serving fallback list ({})",
                        fallback_label(other)
                    );
                }
            }
        }

        record_items_per_response(recs.len() as f64);
        let response = ListRecommendationsResponse::from(recs);
        tracing::info!(
            "[Recv ListRecommendations] product_ids={:?}",
            response.product_ids
        );

        Ok(Response::new(response))
    }
}
