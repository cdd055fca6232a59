//! Candidate source resolution for the runner.
//!
//! Builds the guarded source every command fetches from:
//! 1. If `data.universe` is set → synthetic features over that universe
//! 2. Otherwise → a synthetic universe of `data.pool_size` ids
//!
//! Either way the source is wrapped in a [`GuardedSource`] with the
//! configured timeout and circuit breaker, so fetch failures degrade to an
//! empty pool.

use std::sync::Arc;

use compass_core::data::{CircuitBreaker, DataError, GuardedSource, SyntheticSource, Universe};
use thiserror::Error;
use tracing::info;

use crate::config::DataSection;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load universe: {0}")]
    Universe(#[from] DataError),
}

/// Build the configured candidate source for `seed`.
pub fn candidate_source(section: &DataSection, seed: u64) -> Result<GuardedSource, LoadError> {
    let mut synthetic = SyntheticSource::new(seed).with_pool_size(section.pool_size);
    if let Some(path) = &section.universe {
        let universe = Universe::from_file(path)?;
        info!(path = %path.display(), members = universe.len(), "loaded universe");
        synthetic = synthetic.with_universe(universe);
    }

    let breaker = Arc::new(CircuitBreaker::new(
        section.breaker_threshold,
        section.breaker_cooldown(),
    ));
    Ok(GuardedSource::new(Arc::new(synthetic))
        .with_timeout(section.timeout())
        .with_breaker(breaker))
}
