//! Bounded readiness polling with exponential backoff.
//!
//! Used between "operator is Ready" and "wait for the installed workload": the
//! installed workload is created asynchronously by the operator, and a
//! blocking `kubectl wait` on an object that does not exist yet fails at
//! once. The check is retried until it succeeds or the budget is spent.

use crate::error::{Result, TaskError};
use crate::orchestrator::executor::{CommandRunner, ToolCommand};
use std::time::Duration;
use tokio::time::Instant;

/// Backoff schedule for a bounded poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    /// Total time allowed, measured from the first check.
    pub budget: Duration,
}

impl BackoffPolicy {
    /// Delay to use after `delay`: doubled, capped at `max`.
    pub fn next_delay(&self, delay: Duration) -> Duration {
        delay.saturating_mul(2).min(self.max)
    }
}

/// Shortest pause between checks.
pub const MIN_BACKOFF: Duration = Duration::from_secs(1);

impl From<&crate::config::ReadinessSettings> for BackoffPolicy {
    fn from(settings: &crate::config::ReadinessSettings) -> Self {
        BackoffPolicy {
            initial: settings.initial_backoff().max(MIN_BACKOFF),
            max: settings.max_backoff().max(MIN_BACKOFF),
            budget: settings.settle_budget(),
        }
    }
}

/// Run `check` until it exits 0. Returns the number of attempts made.
///
/// Spawn failures are fatal at once; a missing binary will not appear later.
pub async fn poll_until_ready(
    runner: &dyn CommandRunner,
    check: &ToolCommand,
    what: &str,
    policy: BackoffPolicy,
) -> Result<u32> {
    // A budget too large to represent has no deadline.
    let deadline = Instant::now().checked_add(policy.budget);
    let mut delay = policy.initial;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let outcome = runner.run(check).await?;
        if outcome.success() {
            log::info!("[Readiness] {} present after {} attempt(s)", what, attempts);
            return Ok(attempts);
        }

        let now = Instant::now();
        let sleep_for = match deadline {
            Some(deadline) if now >= deadline => {
                return Err(TaskError::Timeout {
                    what: format!("{} after {} attempt(s)", what, attempts),
                });
            }
            Some(deadline) => delay.min(deadline - now),
            None => delay,
        };
        log::debug!(
            "[Readiness] {} not present yet (attempt {}), retrying in {:?}",
            what,
            attempts,
            sleep_for
        );
        tokio::time::sleep(sleep_for).await;
        delay = policy.next_delay(delay);
    }
}
