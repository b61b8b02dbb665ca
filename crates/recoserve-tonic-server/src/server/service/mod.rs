//! gRPC services exposed by the server.
//!
//! - [`handler`] - `recoserve.v1.RecommendationService`.
//! - [`health`] - `grpc.health.v1.Health`.

pub mod handler;
pub mod health;
