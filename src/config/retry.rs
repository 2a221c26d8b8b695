use std::fmt::Debug;
use std::time::Duration;

use crate::constants::DEFAULT_RETRY_UNIT_DELAY;
use crate::constants::RETRY_RESET_THRESHOLD;

/// What the polling loop should do after a failed long-poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryDecision {
    /// Wait this long before the next attempt
    pub delay: Duration,

    /// Restart the attempt counter from 0 instead of incrementing it
    pub reset: bool,

    /// Stop polling for good
    pub abandon: bool,
}

impl RetryDecision {
    pub fn retry_after(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn abandon() -> Self {
        Self {
            abandon: true,
            ..Default::default()
        }
    }
}

/// Strategy consulted by the notification channel on every polling failure.
///
/// `retries` is the number of consecutive failed attempts before this one,
/// starting at 0.
pub trait RetryPolicy: Send + Sync + Debug + 'static {
    fn decide(
        &self,
        retries: u32,
    ) -> RetryDecision;
}

/// Linear backoff that starts over after [`RETRY_RESET_THRESHOLD`] attempts.
///
/// `delay = retries * unit`. Once `retries >= 6` the decision also asks for a
/// reset, so a long outage turns into repeated fresh sequences instead of an
/// ever growing delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearRetryPolicy {
    pub unit: Duration,
}

impl LinearRetryPolicy {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }
}

impl Default for LinearRetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_UNIT_DELAY)
    }
}

impl RetryPolicy for LinearRetryPolicy {
    fn decide(
        &self,
        retries: u32,
    ) -> RetryDecision {
        RetryDecision {
            delay: self.unit.saturating_mul(retries),
            reset: retries >= RETRY_RESET_THRESHOLD,
            abandon: false,
        }
    }
}

/// Adapts a plain closure into a [`RetryPolicy`]
pub struct FnRetryPolicy<F>(pub F);

impl<F> Debug for FnRetryPolicy<F> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("FnRetryPolicy").finish()
    }
}

impl<F> RetryPolicy for FnRetryPolicy<F>
where
    F: Fn(u32) -> RetryDecision + Send + Sync + 'static,
{
    fn decide(
        &self,
        retries: u32,
    ) -> RetryDecision {
        (self.0)(retries)
    }
}
