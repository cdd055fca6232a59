//! Candidate source trait and structured error types.
//!
//! The CandidateSource trait abstracts over where a candidate pool comes from
//! (synthetic market, a fixed universe, a future real feed) so we can swap
//! implementations and mock for tests.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Candidate;

/// Structured error types for data operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("candidate source unavailable: {0}")]
    Unavailable(String),

    #[error("candidate source timed out after {0:?}")]
    Timeout(Duration),

    #[error("hard stop: candidate source blocked (circuit breaker open, {remaining_secs}s left)")]
    CircuitBreakerOpen { remaining_secs: u64 },

    #[error("universe error: {0}")]
    Universe(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Where a pool came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Synthetic,
    Universe,
    Fixture,
}

/// Supplier of a fresh candidate pool.
///
/// Implementations are blocking. Timeouts and breaker handling live in
/// [`GuardedSource`](super::GuardedSource), not here.
pub trait CandidateSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn kind(&self) -> DataSource;

    /// Fetch the current candidate pool.
    fn fetch(&self) -> Result<Vec<Candidate>, DataError>;
}

/// A source that returns a fixed pool. Handy for tests and replaying an
/// exported selection.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pool: Vec<Candidate>,
}

impl StaticSource {
    pub fn new(pool: Vec<Candidate>) -> Self {
        Self { pool }
    }
}

impl CandidateSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn kind(&self) -> DataSource {
        DataSource::Fixture
    }

    fn fetch(&self) -> Result<Vec<Candidate>, DataError> {
        Ok(self.pool.clone())
    }
}
