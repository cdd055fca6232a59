//! Deterministic synthetic market.
//!
//! Every candidate's attributes are drawn from an RNG seeded by
//! `(seed, "market", id)`, so a candidate looks the same regardless of pool
//! size or generation order.

use rand::seq::SliceRandom;
use rand::Rng;

use super::provider::{CandidateSource, DataError, DataSource};
use super::universe::{synthetic_id, Universe, SECTORS};
use crate::domain::{keys, Candidate, RawFeatures};
use crate::rng::RngHierarchy;
use crate::scoring::Rating;

/// Default number of generated candidates.
pub const DEFAULT_POOL_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    hierarchy: RngHierarchy,
    pool_size: usize,
    universe: Option<Universe>,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            hierarchy: RngHierarchy::new(seed),
            pool_size: DEFAULT_POOL_SIZE,
            universe: None,
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Pin ids and sectors to a universe. The pool size is then the
    /// universe size.
    pub fn with_universe(mut self, universe: Universe) -> Self {
        self.universe = Some(universe);
        self
    }

    /// Generate one candidate. `sector` of `None` draws a random sector.
    pub fn generate(&self, id: &str, sector: Option<&str>) -> Candidate {
        let mut rng = self.hierarchy.rng_for("market", id, 0);

        let category = match sector {
            Some(s) => s.to_string(),
            None => SECTORS[rng.gen_range(0..SECTORS.len())].to_string(),
        };
        let rating = Rating::ALL
            .choose(&mut rng)
            .copied()
            .unwrap_or(Rating::Hold);

        let features = RawFeatures::new()
            .with(keys::PRICE, round2(rng.gen_range(5.0..100.0)))
            .with(keys::PCT_CHANGE, round2(rng.gen_range(-10.0..10.0)))
            .with(keys::PE, round2(rng.gen_range(10.0..50.0)))
            .with(keys::ROE, round2(rng.gen_range(5.0..25.0)))
            .with(keys::PROFIT_GROWTH, round2(rng.gen_range(-20.0..50.0)))
            .with(keys::VOLUME_CHANGE, round2(rng.gen_range(-30.0..50.0)))
            .with(keys::RATING, rating.as_str());

        Candidate::new(id, format!("Synthetic {id}"), category).with_features(features)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl CandidateSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn kind(&self) -> DataSource {
        match self.universe {
            Some(_) => DataSource::Universe,
            None => DataSource::Synthetic,
        }
    }

    fn fetch(&self) -> Result<Vec<Candidate>, DataError> {
        let pool = match &self.universe {
            Some(u) => u
                .members()
                .into_iter()
                .map(|(id, sector)| self.generate(id, Some(sector)))
                .collect(),
            None => (0..self.pool_size)
                .map(|i| self.generate(&synthetic_id(i), None))
                .collect(),
        };
        Ok(pool)
    }
}
