#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can reach the engine types via
// `recoserve_tonic_core::recoserve`
pub use recoserve;

/// gRPC service and message definitions generated from
/// `proto/recoserve.proto`.
///
/// - [`recommendation_service_server::RecommendationService`] - server trait
/// - [`recommendation_service_client::RecommendationServiceClient`] - client
/// - [`ListRecommendationsRequest`] / [`ListRecommendationsResponse`]
pub mod proto {
    tonic::include_proto!("recoserve.v1");

    /// Encoded `FileDescriptorSet` for server reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("recoserve_descriptor");
}
