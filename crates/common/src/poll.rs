//! Bounded polling for eventually-consistent reads
//!
//! After a write against the ERP (for example receiving stock), the read side
//! catches up asynchronously. [`poll_until_eq`] re-reads a value at a fixed
//! interval until it equals the expected target or the timeout elapses.
//!
//! ```text
//!            read() == target
//!   Polling ──────────────────▶ Converged
//!      │ ▲
//!      │ └── wait(interval), elapsed < timeout
//!      │
//!      └──────────────────────▶ TimedOut      (elapsed >= timeout)
//! ```
//!
//! A failing read aborts the poll immediately; retrying transient read errors
//! is the read function's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::Error;

/// Timing for one poll: total budget and the wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PollSettings", into = "PollSettings")]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Reject settings that would spin without yielding.
    pub fn validate(&self) -> crate::Result<()> {
        if self.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            interval: Duration::from_millis(500),
        }
    }
}

/// On-disk shape of [`PollConfig`], in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PollSettings {
    timeout_ms: u64,
    interval_ms: u64,
}

impl TryFrom<PollSettings> for PollConfig {
    type Error = Error;

    fn try_from(settings: PollSettings) -> Result<Self, Self::Error> {
        let config = PollConfig::new(
            Duration::from_millis(settings.timeout_ms),
            Duration::from_millis(settings.interval_ms),
        );
        config.validate()?;
        Ok(config)
    }
}

impl From<PollConfig> for PollSettings {
    fn from(config: PollConfig) -> Self {
        Self {
            timeout_ms: config.timeout.as_millis() as u64,
            interval_ms: config.interval.as_millis() as u64,
        }
    }
}

/// Successful poll: the observed value equals the target.
#[derive(Debug, Clone, PartialEq)]
pub struct Converged<T> {
    pub value: T,
    pub attempts: usize,
    pub elapsed: Duration,
}

/// The deadline passed before the observed value reached the target.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "expected {target}, last observed {last_observed} after {} ms ({attempts} attempts)",
    .elapsed.as_millis()
)]
pub struct ConvergenceTimeout<T: fmt::Display + fmt::Debug> {
    pub target: T,
    pub last_observed: T,
    pub elapsed: Duration,
    pub attempts: usize,
}

/// Why a poll ended without converging.
#[derive(Error, Debug)]
pub enum PollError<T: fmt::Display + fmt::Debug, E: fmt::Display + fmt::Debug> {
    #[error("convergence timeout: {0}")]
    Timeout(ConvergenceTimeout<T>),

    #[error("read failed: {0}")]
    Read(E),
}

/// Call `read` until it returns `target` or `config.timeout` elapses.
///
/// The first read happens immediately. Between attempts the poller sleeps
/// for `config.interval`, clamped so the last attempt lands on the deadline.
/// Reads never overlap and none is made after a match.
pub async fn poll_until_eq<T, E, F, Fut>(
    mut read: F,
    target: &T,
    config: &PollConfig,
) -> Result<Converged<T>, PollError<T, E>>
where
    T: PartialEq + Clone + fmt::Display + fmt::Debug,
    E: fmt::Display + fmt::Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        let observed = read().await.map_err(PollError::Read)?;
        attempts += 1;

        if observed == *target {
            let elapsed = start.elapsed();
            debug!(attempts, elapsed_ms = elapsed.as_millis() as u64, "converged on {}", target);
            return Ok(Converged {
                value: observed,
                attempts,
                elapsed,
            });
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            warn!(
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "gave up waiting for {}, last observed {}",
                target,
                observed
            );
            return Err(PollError::Timeout(ConvergenceTimeout {
                target: target.clone(),
                last_observed: observed,
                elapsed,
                attempts,
            }));
        }

        debug!(attempt = attempts, "observed {}, waiting for {}", observed, target);
        sleep(config.interval.min(config.timeout - elapsed)).await;
    }
}
