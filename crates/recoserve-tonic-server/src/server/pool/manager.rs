//! Asynchronous worker pool for recommendation calls.
//!
//! [`WorkerPool`] owns a fixed set of worker tasks, each listening on its own
//! bounded [`mpsc::Receiver`]. Calls are distributed round-robin; when the
//! chosen worker is busy the caller waits for it, so at most `num_workers`
//! recommendations are computed at once and excess calls queue instead of
//! failing.
//!
//! Shutdown is cooperative: new calls are refused, in-flight calls get up to
//! `shutdown_timeout` to finish, then the shared [`CancellationToken`] is
//! cancelled and every worker is told to stop.

use crate::server::pool::{request::WorkRequest, worker::worker_loop};
use core::time::Duration;
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use recoserve_tonic_core::{
    Error, Result,
    recoserve::{ItemId, RecommendationEngine, Recommendations},
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// How long each worker gets to acknowledge a shutdown request.
const WORKER_ACK_TIMEOUT: Duration = Duration::from_secs(3);

pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    inflight: AtomicUsize,
    shutting_down: AtomicBool,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
}

/// Decrements the in-flight count when a call finishes, however it finishes.
struct InflightGuard<'a>(&'a AtomicUsize);

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl WorkerPool {
    /// Spawns `num_workers` worker tasks sharing `engine`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        engine: Arc<RecommendationEngine>,
        num_workers: usize,
        shutdown_timeout: Duration,
    ) -> Self {
        let num_workers = num_workers.max(1);
        let mut workers = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            // One queued request per worker. Anything beyond that waits in
            // `send`, which is what bounds concurrency.
            let (tx, rx) = mpsc::channel(1);
            workers.push(tx);
            tokio::spawn(worker_loop(worker_id, rx, Arc::clone(&engine)));
        }

        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            inflight: AtomicUsize::new(0),
            shutting_down: AtomicBool::new(false),
            shutdown_token: CancellationToken::new(),
            shutdown_timeout,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Calls currently between dispatch and response.
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Runs one recommendation on the next worker and waits for the answer.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] if the pool is draining or was cancelled
    ///   while the call waited for a worker.
    /// - [`Error::ChannelError`] if the worker went away.
    /// - [`Error::EngineFailure`] if the engine panicked.
    pub async fn recommend(
        &self,
        token: String,
        excluded: HashSet<ItemId>,
    ) -> Result<Recommendations> {
        self.inflight.fetch_add(1, Ordering::AcqRel);
        let _guard = InflightGuard(&self.inflight);

        if self.is_shutting_down() {
            return Err(Error::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let (tx, rx) = oneshot::channel();
        let request = WorkRequest::Recommend {
            token,
            excluded,
            response: tx,
        };

        tokio::select! {
            biased;
            () = self.shutdown_token.cancelled() => return Err(Error::ServiceShutdown),
            sent = self.workers[worker_idx].send(request) => {
                if sent.is_err() {
                    return Err(Error::ChannelError {
                        context: format!("Worker {worker_idx} channel closed"),
                    });
                }
            }
        }

        rx.await.map_err(|_| Error::ChannelError {
            context: format!("Worker {worker_idx} dropped the response"),
        })?
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// Idempotent: only the first call does any work.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }

        // === Phase 1: Refuse new calls, drain in-flight ones ===
        tracing::info!("Draining in-flight calls ({} active)", self.inflight());
        let drained = timeout(self.shutdown_timeout, async {
            while self.inflight() > 0 {
                sleep(Duration::from_millis(50)).await;
            }
        })
        .await;

        match drained {
            Ok(()) => tracing::debug!("All in-flight calls drained"),
            Err(_) => tracing::warn!(
                "Graceful drain timed out ({} calls still active)",
                self.inflight()
            ),
        }

        // === Phase 2: Cancel whatever is still waiting for a worker ===
        self.shutdown_token.cancel();

        // === Phase 3: Notify workers to shut down ===
        let mut acks = Vec::with_capacity(self.workers.len());
        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            match timeout(WORKER_ACK_TIMEOUT, worker.send(WorkRequest::Shutdown { response: tx }))
                .await
            {
                Ok(Ok(())) => acks.push((i, rx)),
                Ok(Err(e)) => tracing::error!("Failed to send shutdown to worker {i}: {e}"),
                Err(_) => tracing::warn!("Worker {i} did not accept shutdown in time"),
            }
        }

        let waits = acks.into_iter().map(|(i, rx)| async move {
            match timeout(WORKER_ACK_TIMEOUT, rx).await {
                Ok(Ok(())) => tracing::trace!("Worker {i} shutdown acknowledged"),
                Ok(Err(e)) => tracing::error!("Worker {i} returned error: {e}"),
                Err(_) => tracing::warn!("Worker {i} shutdown timed out"),
            }
        });
        futures::future::join_all(waits).await;

        tracing::info!("Worker pool shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recoserve_tonic_core::recoserve::{FactorModel, UserUniverse};

    fn engine() -> Arc<RecommendationEngine> {
        let universe = UserUniverse::new(5).unwrap();
        Arc::new(RecommendationEngine::new(
            universe,
            Arc::new(FactorModel::untrained(universe)),
        ))
    }

    #[tokio::test]
    async fn serves_more_calls_than_workers() {
        let pool = Arc::new(WorkerPool::spawn(engine(), 2, Duration::from_secs(1)));

        let calls = (0..20).map(|i| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.recommend(format!("user-{i}"), HashSet::new()).await })
        });

        for call in futures::future::join_all(calls).await {
            let recs = call.unwrap().unwrap();
            assert_eq!(recs.len(), 5);
        }
        assert_eq!(pool.inflight(), 0);
    }

    #[tokio::test]
    async fn refuses_calls_after_shutdown() {
        let pool = WorkerPool::spawn(engine(), 3, Duration::from_millis(100));
        assert!(pool.recommend("abc".into(), HashSet::new()).await.is_ok());

        pool.shutdown().await;
        assert!(pool.is_shutting_down());

        let err = pool.recommend("abc".into(), HashSet::new()).await.unwrap_err();
        assert!(matches!(err, Error::ServiceShutdown));
        assert_eq!(pool.inflight(), 0);

        // Second shutdown is a no-op.
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn zero_workers_is_clamped_to_one() {
        let pool = WorkerPool::spawn(engine(), 0, Duration::from_millis(100));
        assert_eq!(pool.num_workers(), 1);
        assert!(pool.recommend("abc".into(), HashSet::new()).await.is_ok());
    }
}
