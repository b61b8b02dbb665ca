//! Startup of optional subsystems.
//!
//! The profiler, tracer and debugger all follow the same contract: enabled
//! unless explicitly opted out, started with a per-subsystem retry policy, and
//! never fatal. [`start`] implements that contract once; each subsystem only
//! supplies its init function.
//!
//! [`start`] does not log. The tracer is started before the log subscriber
//! exists, so outcomes are reported separately through [`Outcome::log`] once
//! logging is up.

use core::fmt;
use core::future::Future;
use core::time::Duration;

/// Optional startup subsystems, each independently opt-out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Periodic runtime sampler.
    Profiler,
    /// OpenTelemetry span exporter.
    Tracer,
    /// gRPC server reflection.
    Debugger,
}

impl Subsystem {
    pub const fn name(self) -> &'static str {
        match self {
            Subsystem::Profiler => "profiler",
            Subsystem::Tracer => "tracer",
            Subsystem::Debugger => "debugger",
        }
    }

    /// Environment variable that opts out of this subsystem.
    pub const fn opt_out_var(self) -> &'static str {
        match self {
            Subsystem::Profiler => "DISABLE_PROFILER",
            Subsystem::Tracer => "DISABLE_TRACING",
            Subsystem::Debugger => "DISABLE_DEBUGGER",
        }
    }

    /// The profiler agent is the only subsystem worth retrying.
    pub const fn retry_policy(self) -> RetryPolicy {
        match self {
            Subsystem::Profiler => RetryPolicy::fixed(3, Duration::from_secs(1)),
            Subsystem::Tracer | Subsystem::Debugger => RetryPolicy::once(),
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which optional subsystems are enabled. All are enabled by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionalFeatures {
    pub profiler: bool,
    pub tracer: bool,
    pub debugger: bool,
}

impl OptionalFeatures {
    pub const fn is_enabled(&self, subsystem: Subsystem) -> bool {
        match subsystem {
            Subsystem::Profiler => self.profiler,
            Subsystem::Tracer => self.tracer,
            Subsystem::Debugger => self.debugger,
        }
    }
}

impl Default for OptionalFeatures {
    fn default() -> Self {
        Self {
            profiler: true,
            tracer: true,
            debugger: true,
        }
    }
}

/// Bounded retry with a fixed pause between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn once() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub const fn fixed(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }
}

/// Result of starting one subsystem.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Opted out through configuration; init was never called.
    Disabled,
    Started { value: T, attempts: u32 },
    /// Every attempt failed; `error` is the last failure.
    Failed { attempts: u32, error: anyhow::Error },
}

impl<T> Outcome<T> {
    pub const fn value(&self) -> Option<&T> {
        match self {
            Outcome::Started { value, .. } => Some(value),
            Outcome::Disabled | Outcome::Failed { .. } => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Started { value, .. } => Some(value),
            Outcome::Disabled | Outcome::Failed { .. } => None,
        }
    }

    /// Reports the outcome. Failures are warnings: startup carries on.
    pub fn log(&self, subsystem: Subsystem) {
        match self {
            Outcome::Disabled => {
                tracing::info!(
                    subsystem = subsystem.name(),
                    "{subsystem} disabled by {}",
                    subsystem.opt_out_var()
                );
            }
            Outcome::Started { attempts, .. } => {
                tracing::info!(subsystem = subsystem.name(), attempts, "{subsystem} enabled");
            }
            Outcome::Failed { attempts, error } => {
                tracing::warn!(
                    subsystem = subsystem.name(),
                    attempts,
                    "Could not start {subsystem}, continuing without it: {error:#}"
                );
            }
        }
    }
}

/// Starts `subsystem` unless it is disabled, retrying `init` according to
/// `policy`.
///
/// Never fails and never panics on init errors: a subsystem that cannot be
/// started is simply reported as [`Outcome::Failed`].
pub async fn start<T, F, Fut>(
    subsystem: Subsystem,
    features: &OptionalFeatures,
    policy: RetryPolicy,
    mut init: F,
) -> Outcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    if !features.is_enabled(subsystem) {
        return Outcome::Disabled;
    }

    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match init().await {
            Ok(value) => {
                return Outcome::Started {
                    value,
                    attempts: attempt,
                };
            }
            Err(error) if attempt >= attempts => {
                return Outcome::Failed {
                    attempts: attempt,
                    error,
                };
            }
            Err(error) => {
                tracing::debug!(
                    subsystem = subsystem.name(),
                    attempt,
                    "{subsystem} init failed, retrying in {:?}: {error:#}",
                    policy.backoff
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
        }
    }
}
