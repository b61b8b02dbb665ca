//! Server assembly.
//!
//! ## Structure
//!
//! - [`config`] - CLI / environment configuration.
//! - [`bootstrap`] - optional subsystems (profiler, tracer, debugger).
//! - [`model`] - model loading at startup.
//! - [`pool`] - bounded worker pool running the engine.
//! - [`service`] - gRPC services.
//! - [`profiler`] - runtime sampler.
//! - [`telemetry`] - logging, tracing and metrics.

pub mod bootstrap;
pub mod config;
pub mod model;
pub mod pool;
pub mod profiler;
pub mod service;
pub mod telemetry;

use bootstrap::{OptionalFeatures, Subsystem};
use core::future::Future;
use futures::Stream;
use recoserve_tonic_core::proto::{
    FILE_DESCRIPTOR_SET, recommendation_service_server::RecommendationServiceServer,
};
use service::{handler::RecommendationHandler, health::HealthService};
use tokio::io::{AsyncRead, AsyncWrite};
use tonic::transport::server::Connected;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::pb::health_server::HealthServer;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Serves the recommendation and health services on `incoming` until
/// `shutdown` resolves. Once the listener has stopped and in-flight calls
/// have completed, the worker pool is shut down.
///
/// The debugger (gRPC reflection) is started here, according to `features`.
pub async fn serve_with_incoming<I, IO, IE, F>(
    incoming: I,
    handler: RecommendationHandler,
    features: &OptionalFeatures,
    shutdown: F,
) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
    F: Future<Output = ()>,
{
    let debugger = bootstrap::start(
        Subsystem::Debugger,
        features,
        Subsystem::Debugger.retry_policy(),
        || async {
            tonic_reflection::server::Builder::configure()
                .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
                .register_encoded_file_descriptor_set(tonic_health::pb::FILE_DESCRIPTOR_SET)
                .build_v1()
                .map_err(anyhow::Error::from)
        },
    )
    .await;
    debugger.log(Subsystem::Debugger);

    let shutdown = async move {
        shutdown.await;
        tracing::info!("Shutdown signal received, terminating gracefully...");
    };

    let served = Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(HealthServer::new(HealthService))
        .add_optional_service(debugger.into_option())
        .add_service(recommendation_service(handler.clone()))
        .serve_with_incoming_shutdown(incoming, shutdown)
        .await;

    // The listener is closed and open connections have finished; only then
    // are the workers stopped.
    handler.shutdown().await;

    served?;
    tracing::info!("Service shut down successfully");
    Ok(())
}

fn recommendation_service(
    handler: RecommendationHandler,
) -> RecommendationServiceServer<RecommendationHandler> {
    RecommendationServiceServer::new(handler)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}
