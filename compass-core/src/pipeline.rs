//! Selection pipeline — the one entry point for a selection request.
//!
//! Per request: normalize context → score every candidate → attach composite →
//! preference filter (composite as backfill key) → top-K.
//!
//! The pipeline holds only its configuration. Every call rebuilds scores from
//! the input pool; nothing is cached between requests.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::composite::{CompositeIndexer, CompositeWeights};
use crate::domain::{Candidate, ScoredCandidate, ScoringContext};
use crate::filter::{PreferenceFilter, DEFAULT_MIN_POOL};
use crate::fingerprint::RequestFingerprint;
use crate::rng::ResidualSource;
use crate::scoring::{ScoreCalculator, ScoringConfig};
use crate::select::TopKSelector;
use crate::timeout::CancelToken;

/// Malformed input or an aborted request. Data and context problems are
/// recovered inside the pipeline and never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("duplicate candidate identifier '{0}'")]
    DuplicateCandidate(String),

    #[error("candidate at position {0} has an empty identifier")]
    EmptyIdentifier(usize),

    #[error("selection cancelled after scoring {scored} of {total} candidates")]
    Cancelled { scored: usize, total: usize },
}

/// Explicit pipeline configuration, built once by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum size of the preference-filtered pool (`M`).
    pub min_pool: usize,
    pub scoring: ScoringConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_pool: DEFAULT_MIN_POOL,
            scoring: ScoringConfig::default(),
        }
    }
}

/// Output of one selection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Highest composite first. `len == min(k, eligible_size)`.
    pub picks: Vec<ScoredCandidate>,
    pub weights: CompositeWeights,
    pub context: ScoringContext,
    pub k: usize,
    pub pool_size: usize,
    /// Size of the pool after the preference filter.
    pub eligible_size: usize,
    pub fingerprint: RequestFingerprint,
}

impl SelectionResult {
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.picks.iter().map(|p| p.id()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionPipeline {
    config: PipelineConfig,
    calculator: ScoreCalculator,
    indexer: CompositeIndexer,
    filter: PreferenceFilter,
    selector: TopKSelector,
}

impl SelectionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            calculator: ScoreCalculator::new(config.scoring.clone()),
            indexer: CompositeIndexer,
            filter: PreferenceFilter::new(config.min_pool),
            selector: TopKSelector,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn filter(&self) -> &PreferenceFilter {
        &self.filter
    }

    pub fn select(
        &self,
        pool: &[Candidate],
        ctx: &ScoringContext,
        k: usize,
        residual: &dyn ResidualSource,
    ) -> Result<SelectionResult, SelectionError> {
        self.select_with_cancel(pool, ctx, k, residual, &CancelToken::new())
    }

    /// Like [`select`](Self::select), checking `cancel` before each
    /// candidate is scored.
    pub fn select_with_cancel(
        &self,
        pool: &[Candidate],
        ctx: &ScoringContext,
        k: usize,
        residual: &dyn ResidualSource,
        cancel: &CancelToken,
    ) -> Result<SelectionResult, SelectionError> {
        let ctx = ctx.normalized();
        let fingerprint =
            RequestFingerprint::compute(pool, &ctx, k, self.config.min_pool, &residual.label());
        let weights = self.indexer.weights(&ctx);

        if pool.is_empty() {
            warn!(fingerprint = fingerprint.short(), "empty candidate pool, returning empty selection");
            return Ok(SelectionResult {
                picks: Vec::new(),
                weights,
                context: ctx,
                k,
                pool_size: 0,
                eligible_size: 0,
                fingerprint,
            });
        }

        let scored = self.score_pool(pool, &ctx, residual, cancel)?;
        let eligible = self
            .filter
            .apply_by(scored, &ctx.preference, |c: &ScoredCandidate| c.composite);
        let eligible_size = eligible.len();
        let picks = self.selector.select(eligible, k);

        info!(
            fingerprint = fingerprint.short(),
            trend = %ctx.trend,
            risk = %ctx.risk,
            preference = %ctx.preference,
            pool = pool.len(),
            eligible = eligible_size,
            picks = picks.len(),
            "selection complete"
        );

        Ok(SelectionResult {
            picks,
            weights,
            context: ctx,
            k,
            pool_size: pool.len(),
            eligible_size,
            fingerprint,
        })
    }

    /// Validate the pool and score every candidate, attaching its composite.
    ///
    /// Output order follows the input order.
    pub fn score_pool(
        &self,
        pool: &[Candidate],
        ctx: &ScoringContext,
        residual: &dyn ResidualSource,
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredCandidate>, SelectionError> {
        validate_pool(pool)?;

        let weights = self.indexer.weights(ctx);
        let mut scored = Vec::with_capacity(pool.len());
        let mut defaulted_features = 0usize;

        for (i, candidate) in pool.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(SelectionError::Cancelled {
                    scored: i,
                    total: pool.len(),
                });
            }
            let scoring = self.calculator.score(candidate, residual);
            defaulted_features += scoring.defaulted.len();
            scored.push(ScoredCandidate {
                candidate: candidate.clone(),
                composite: weights.apply(&scoring.dimensions),
                dimensions: scoring.dimensions,
                defaulted: scoring.defaulted,
            });
        }

        if defaulted_features > 0 {
            warn!(
                defaulted_features,
                candidates = pool.len(),
                "missing features replaced by defaults"
            );
        }
        Ok(scored)
    }
}

fn validate_pool(pool: &[Candidate]) -> Result<(), SelectionError> {
    let mut seen = HashSet::with_capacity(pool.len());
    for (i, c) in pool.iter().enumerate() {
        if c.id.trim().is_empty() {
            return Err(SelectionError::EmptyIdentifier(i));
        }
        if !seen.insert(c.id.as_str()) {
            return Err(SelectionError::DuplicateCandidate(c.id.clone()));
        }
    }
    Ok(())
}
