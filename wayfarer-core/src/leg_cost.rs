//! Baseline leg retrieval with retry of transient failures.

use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::leg::scale_duration;
use crate::{Leg, ProviderError, TransportMode, TravelDataProvider, Waypoint};

/// How [`LegCostModel`] retries provider timeouts.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use wayfarer_core::RetryPolicy;
///
/// let policy = RetryPolicy::default().with_initial_backoff(Duration::ZERO);
/// assert_eq!(policy.max_retries, 2);
/// assert_eq!(policy.backoff(1), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub initial_backoff: Duration,
    /// Growth of the wait between successive retries.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Override the number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the first wait.
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Wait before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        scale_duration(self.initial_backoff, self.backoff_factor.powi(exponent))
    }
}

/// Fetches baseline legs from a [`TravelDataProvider`].
///
/// The model holds no cache: every call reaches the provider. Timeouts are
/// retried according to the [`RetryPolicy`]; other errors return at once.
#[derive(Debug)]
pub struct LegCostModel<P> {
    provider: P,
    retry: RetryPolicy,
}

impl<P: TravelDataProvider> LegCostModel<P> {
    /// Wrap `provider` with the default retry policy.
    pub fn new(provider: P) -> Self {
        Self::with_retry(provider, RetryPolicy::default())
    }

    /// Wrap `provider` with an explicit retry policy.
    pub const fn with_retry(provider: P, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Borrow the underlying provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Active retry policy.
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Baseline figures for `origin → destination` by `mode`.
    ///
    /// A provider answer with negative or non-finite figures is reported as
    /// [`ProviderError::Unavailable`].
    pub fn base_leg(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        mode: TransportMode,
    ) -> Result<Leg, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.provider.base_leg(origin, destination, mode) {
                Ok(leg) if leg.is_well_formed() => return Ok(leg),
                Ok(_) => {
                    return Err(ProviderError::unavailable(format!(
                        "malformed {mode} leg from {} to {}",
                        origin.id, destination.id
                    )));
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let wait = self.retry.backoff(attempt);
                    warn!(
                        "{mode} leg {} -> {}: {err}; retry {attempt}/{} in {wait:?}",
                        origin.id, destination.id, self.retry.max_retries
                    );
                    if !wait.is_zero() {
                        thread::sleep(wait);
                    }
                }
                Err(err) => {
                    debug!(
                        "{mode} leg {} -> {} failed: {err}",
                        origin.id, destination.id
                    );
                    return Err(err);
                }
            }
        }
    }
}
