//! Timeout and circuit-breaker wrapper around a candidate source.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{CandidateSource, DataError, DataSource};
use crate::domain::Candidate;
use crate::timeout::run_with_timeout;

/// Default deadline for a fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct GuardedSource {
    inner: Arc<dyn CandidateSource>,
    timeout: Duration,
    breaker: Arc<CircuitBreaker>,
}

impl GuardedSource {
    pub fn new(inner: Arc<dyn CandidateSource>) -> Self {
        Self {
            inner,
            timeout: DEFAULT_FETCH_TIMEOUT,
            breaker: Arc::new(CircuitBreaker::default()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share a breaker between several guarded sources.
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Fetch a pool, treating every failure as "no data".
    ///
    /// Errors and timeouts are logged and turned into an empty pool, which the
    /// selection pipeline answers with an empty result.
    pub fn fetch_pool(&self) -> Vec<Candidate> {
        match self.fetch() {
            Ok(pool) => {
                info!(source = self.inner.name(), candidates = pool.len(), "candidate pool fetched");
                pool
            }
            Err(e) => {
                warn!(source = self.inner.name(), error = %e, "candidate source unavailable, using empty pool");
                Vec::new()
            }
        }
    }
}

impl CandidateSource for GuardedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> DataSource {
        self.inner.kind()
    }

    fn fetch(&self) -> Result<Vec<Candidate>, DataError> {
        if !self.breaker.is_allowed() {
            return Err(DataError::CircuitBreakerOpen {
                remaining_secs: self.breaker.remaining_cooldown().as_secs(),
            });
        }

        let inner = Arc::clone(&self.inner);
        let result = run_with_timeout(self.timeout, move || inner.fetch())
            .unwrap_or(Err(DataError::Timeout(self.timeout)));

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(_) => self.breaker.record_failure(),
        }
        result
    }
}
