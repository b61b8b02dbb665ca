//! Error types for the recommendation service.
//!
//! Ranking problems never show up here: the engine absorbs them into its
//! fallback list. What remains are failures of the serving machinery itself,
//! each mapped onto a gRPC status by `From<Error> for tonic::Status`.
//!
//! ## Error Cases
//! - `ChannelError`: an internal channel between the handler and a worker
//!   closed unexpectedly.
//! - `EngineFailure`: the engine panicked while serving a request. The worker
//!   survives and keeps serving.
//! - `ServiceShutdown`: a request arrived while the service was draining.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the recommendation service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// Internal channel send/receive failure (e.g., closed channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The engine aborted while computing a recommendation.
    #[error("Engine failure: {reason}")]
    EngineFailure { reason: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {context}"))
            }
            Error::EngineFailure { reason } => {
                Status::internal(format!("Recommendation failed: {reason}"))
            }
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn maps_onto_grpc_codes() {
        let status = Status::from(Error::ChannelError {
            context: "worker 3 channel closed".into(),
        });
        assert_eq!(status.code(), Code::Internal);
        assert!(status.message().contains("worker 3"));

        let status = Status::from(Error::EngineFailure {
            reason: "boom".into(),
        });
        assert_eq!(status.code(), Code::Internal);

        assert_eq!(
            Status::from(Error::ServiceShutdown).code(),
            Code::Unavailable
        );
    }
}
