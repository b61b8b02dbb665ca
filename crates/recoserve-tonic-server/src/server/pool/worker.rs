use crate::server::pool::request::WorkRequest;
use recoserve_tonic_core::{Error, recoserve::RecommendationEngine};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// All workers share one [`RecommendationEngine`]; the engine is immutable
/// after startup so no locking is involved. A panic inside the engine is
/// caught and reported to the caller as [`Error::EngineFailure`], and the
/// worker keeps serving.
///
/// Runs until a [`WorkRequest::Shutdown`] arrives or every sender is dropped.
pub async fn worker_loop(
    worker_id: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    engine: Arc<RecommendationEngine>,
) {
    tracing::trace!("Worker {worker_id} started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Recommend {
                token,
                excluded,
                response,
            } => {
                let result = catch_unwind(AssertUnwindSafe(|| engine.recommend(&token, &excluded)))
                    .map_err(|panic| Error::EngineFailure {
                        reason: panic_message(panic.as_ref()),
                    });

                if let Err(e) = &result {
                    tracing::error!("Worker {worker_id}: {e}");
                }

                // The caller may have gone away (deadline, cancellation).
                if response.send(result).is_err() {
                    tracing::debug!("Worker {worker_id}: caller dropped before response");
                }
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}

fn panic_message(panic: &(dyn core::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "engine panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_messages() {
        let panic = catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "boom");

        let panic = catch_unwind(|| panic!("{}", String::from("formatted"))).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "formatted");

        let panic = catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "engine panicked");
    }
}
