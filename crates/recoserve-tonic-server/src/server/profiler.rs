//! Periodic runtime sampler.
//!
//! Logs a snapshot of the Tokio scheduler every `PROFILER_INTERVAL` seconds.
//! Started through the profiler subsystem; failing to start it is never
//! fatal.

use anyhow::{Context, bail};
use core::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Spawns the sampler on the current runtime.
///
/// # Errors
///
/// Fails if `period` is zero or no Tokio runtime is running.
pub fn spawn_runtime_profiler(period: Duration) -> anyhow::Result<JoinHandle<()>> {
    if period.is_zero() {
        bail!("PROFILER_INTERVAL must be greater than 0");
    }

    let handle = Handle::try_current().context("no Tokio runtime to profile")?;

    Ok(handle.spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let metrics = Handle::current().metrics();
            tracing::debug!(
                workers = metrics.num_workers(),
                alive_tasks = metrics.num_alive_tasks(),
                global_queue_depth = metrics.global_queue_depth(),
                "runtime profile"
            );
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let _enter = rt.enter();
        assert!(spawn_runtime_profiler(Duration::ZERO).is_err());
    }

    #[test]
    fn requires_a_runtime() {
        let err = spawn_runtime_profiler(Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("runtime"));
    }

    #[tokio::test(start_paused = true)]
    async fn samples_until_aborted() {
        let handle = spawn_runtime_profiler(Duration::from_secs(60)).unwrap();
        tokio::time::sleep(Duration::from_secs(180)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
