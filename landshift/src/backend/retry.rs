//! Retry decorator for transient backend failures.
//!
//! Network and quota failures from the compute service are worth retrying;
//! malformed responses and contract violations are not. [`RetryingBackend`]
//! wraps any [`GeoBackend`] and applies an exponential-backoff
//! [`RetryPolicy`] to every call, so the pipeline components themselves stay
//! retry-free.

use std::time::Duration;

use geo::Polygon;
use tracing::warn;

use super::types::{
    BackendError, ClassCompositeRequest, ClassGrid, GroupSum, MaskedCompositeRequest, RasterRef,
    ReduceRegionRequest, SamplePage, SamplePageRequest,
};
use super::GeoBackend;

/// Default initial delay between attempts (250 ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 250;

/// Default maximum delay cap (10 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 10;

/// Default multiplier applied to the delay after each failure.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default number of attempts, including the initial one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How transient failures are retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the initial attempt.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Cap applied to the growing delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failure.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Exponential backoff with the default parameters.
    pub fn exponential(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// A policy that never retries.
    pub fn none() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before the retry following the given 1-based attempt, or `None`
    /// when no more attempts are allowed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay_ms = self.initial_delay.as_millis() as f64 * factor;
        let delay = Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as f64) as u64);
        Some(delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::exponential(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Backend decorator that retries transient failures.
#[derive(Debug)]
pub struct RetryingBackend<B: GeoBackend> {
    inner: B,
    policy: RetryPolicy,
}

impl<B: GeoBackend> RetryingBackend<B> {
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn call<T>(
        &self,
        operation: &str,
        f: impl Fn(&B) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut attempt = 1;
        loop {
            match f(&self.inner) {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() => {
                    match self.policy.delay_for_attempt(attempt) {
                        Some(delay) => {
                            warn!(
                                operation,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %error,
                                "Transient backend failure, retrying"
                            );
                            std::thread::sleep(delay);
                            attempt += 1;
                        }
                        None => return Err(error),
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl<B: GeoBackend> GeoBackend for RetryingBackend<B> {
    fn class_composite(
        &self,
        request: &ClassCompositeRequest<'_>,
    ) -> Result<ClassGrid, BackendError> {
        self.call("class_composite", |backend| backend.class_composite(request))
    }

    fn masked_composite(
        &self,
        request: &MaskedCompositeRequest<'_>,
    ) -> Result<RasterRef, BackendError> {
        self.call("masked_composite", |backend| backend.masked_composite(request))
    }

    fn reduce_region(
        &self,
        request: &ReduceRegionRequest<'_>,
    ) -> Result<Vec<GroupSum>, BackendError> {
        self.call("reduce_region", |backend| backend.reduce_region(request))
    }

    fn sample_page(&self, request: &SamplePageRequest<'_>) -> Result<SamplePage, BackendError> {
        self.call("sample_page", |backend| backend.sample_page(request))
    }

    fn polygon_area(&self, polygon: &Polygon<f64>) -> Result<f64, BackendError> {
        self.call("polygon_area", |backend| backend.polygon_area(polygon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::geometry::polygon_from_ring;

    fn zero_delay_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 2.0,
        }
    }

    fn test_polygon() -> Polygon<f64> {
        polygon_from_ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).unwrap()
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        };
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for_attempt(4), None);
    }

    #[test]
    fn test_delay_respects_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        };
        assert!(policy.delay_for_attempt(6).unwrap() <= Duration::from_secs(5));
    }

    #[test]
    fn test_transient_failures_are_retried_to_success() {
        let backend = MemoryBackend::new(10.0);
        backend.fail_next(BackendError::Transport("reset".into()));
        backend.fail_next(BackendError::Timeout("slow".into()));

        let retrying = RetryingBackend::new(backend, zero_delay_policy(3));
        let area = retrying.polygon_area(&test_polygon()).unwrap();

        assert!(area > 0.0);
        assert_eq!(retrying.inner().calls(), 3);
    }

    #[test]
    fn test_non_transient_failures_are_not_retried() {
        let backend = MemoryBackend::new(10.0);
        backend.fail_next(BackendError::Contract("bad grid".into()));

        let retrying = RetryingBackend::new(backend, zero_delay_policy(3));
        let err = retrying.polygon_area(&test_polygon()).unwrap_err();

        assert!(matches!(err, BackendError::Contract(_)));
        assert_eq!(retrying.inner().calls(), 1);
    }

    #[test]
    fn test_exhausted_attempts_surface_the_error() {
        let backend = MemoryBackend::new(10.0);
        for _ in 0..5 {
            backend.fail_next(BackendError::Transport("reset".into()));
        }

        let retrying = RetryingBackend::new(backend, zero_delay_policy(3));
        let err = retrying.polygon_area(&test_polygon()).unwrap_err();

        assert!(err.is_transient());
        assert_eq!(retrying.inner().calls(), 3);
    }

    #[test]
    fn test_none_policy_gives_single_attempt() {
        assert_eq!(RetryPolicy::none().delay_for_attempt(1), None);
    }
}
