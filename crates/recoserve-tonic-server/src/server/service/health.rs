//! Standard gRPC health checking.
//!
//! The server reports `SERVING` for as long as it accepts connections; there
//! is no dependency whose failure would make it unhealthy, since ranking
//! problems degrade to the fallback list. Streaming `Watch` is not offered.

use core::pin::Pin;
use tokio_stream::Stream;
use tonic::{Request, Response, Status};
use tonic_health::pb::{
    HealthCheckRequest, HealthCheckResponse, health_check_response::ServingStatus,
    health_server::Health,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct HealthService;

#[tonic::async_trait]
impl Health for HealthService {
    type WatchStream = Pin<Box<dyn Stream<Item = Result<HealthCheckResponse, Status>> + Send>>;

    /// Answers `SERVING` for every service name, including the empty one.
    async fn check(
        &self,
        _req: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        Ok(Response::new(HealthCheckResponse {
            status: ServingStatus::Serving as i32,
        }))
    }

    async fn watch(
        &self,
        _req: Request<HealthCheckRequest>,
    ) -> Result<Response<Self::WatchStream>, Status> {
        Err(Status::unimplemented("health check via Watch not implemented"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[tokio::test]
    async fn check_is_always_serving() {
        for service in ["", "recoserve.v1.RecommendationService", "unknown"] {
            let resp = HealthService
                .check(Request::new(HealthCheckRequest {
                    service: service.into(),
                }))
                .await
                .unwrap();
            assert_eq!(resp.get_ref().status, ServingStatus::Serving as i32);
        }
    }

    #[tokio::test]
    async fn watch_is_unimplemented() {
        let status = HealthService
            .watch(Request::new(HealthCheckRequest::default()))
            .await
            .err()
            .unwrap();
        assert_eq!(status.code(), Code::Unimplemented);
    }
}
