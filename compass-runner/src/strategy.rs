//! Selection strategies.
//!
//! - **Compass**: the selection pipeline (composite-ranked), with a seeded
//!   forecast attached to each pick.
//! - **AI**: score → predictor → up-probability threshold by trend/risk →
//!   preference filter keyed on probability → top-K by probability.
//!
//! Collaborator failures (no data, predictor error or timeout) produce an
//! empty run and a warning. Malformed input surfaces as [`StrategyError`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use compass_core::predictor::{
    predict_with_timeout, FeatureVector, LogisticPredictor, Prediction, Predictor, SeededForecaster,
};
use compass_core::timeout::CancelToken;
use compass_core::{
    Candidate, CompositeIndexer, CompositeWeights, RiskAppetite, RngHierarchy, ScoredCandidate,
    ScoringContext, SeededResidual, Selectable, SelectionError, SelectionPipeline, TopKSelector,
    Trend,
};
use compass_core::fingerprint::RequestFingerprint;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{CompassConfig, StrategySection};

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("unknown strategy '{0}' (expected compass or ai)")]
    UnknownStrategy(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Compass,
    Ai,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compass => "compass",
            Self::Ai => "ai",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compass" | "tianrenheyi" | "天人合一" => Ok(Self::Compass),
            "ai" | "model" => Ok(Self::Ai),
            other => Err(StrategyError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecast attached to a pick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Expected percentage change.
    pub expected_change: f64,
    /// Only set by the AI strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    #[serde(flatten)]
    pub scored: ScoredCandidate,
    pub forecast: Forecast,
}

impl Pick {
    pub fn id(&self) -> &str {
        self.scored.id()
    }
}

/// Result of running one strategy once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    pub strategy: StrategyKind,
    pub context: ScoringContext,
    pub weights: CompositeWeights,
    pub picks: Vec<Pick>,
    pub pool_size: usize,
    pub eligible_size: usize,
    /// Probability cut-off used by the AI strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<RequestFingerprint>,
}

impl StrategyRun {
    fn empty(strategy: StrategyKind, ctx: ScoringContext, pool_size: usize) -> Self {
        Self {
            weights: CompositeIndexer.weights(&ctx),
            strategy,
            context: ctx,
            picks: Vec::new(),
            pool_size,
            eligible_size: 0,
            threshold: None,
            fingerprint: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

/// Up-probability threshold for a context. Candidates must be strictly
/// above it.
pub fn ai_threshold(section: &StrategySection, trend: Trend, risk: RiskAppetite) -> f64 {
    match (trend, risk) {
        (Trend::Up, RiskAppetite::Aggressive) => section.up_aggressive_threshold,
        (Trend::Down, RiskAppetite::Conservative) => section.down_conservative_threshold,
        _ => section.default_threshold,
    }
}

/// A scored candidate with its model output, for the AI filter and selector.
struct Predicted {
    scored: ScoredCandidate,
    prediction: Prediction,
}

impl Selectable for Predicted {
    fn id(&self) -> &str {
        self.scored.id()
    }

    fn category(&self) -> &str {
        self.scored.category()
    }
}

/// Runs strategies against a candidate pool.
#[derive(Clone)]
pub struct StrategyRunner {
    pipeline: SelectionPipeline,
    section: StrategySection,
    predictor: Arc<dyn Predictor>,
}

impl StrategyRunner {
    pub fn new(config: &CompassConfig) -> Self {
        Self {
            pipeline: SelectionPipeline::new(config.pipeline()),
            section: config.strategy.clone(),
            predictor: Arc::new(LogisticPredictor::default()),
        }
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn Predictor>) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn pipeline(&self) -> &SelectionPipeline {
        &self.pipeline
    }

    /// Run `kind` once. All randomness is drawn from `rng`.
    pub fn run(
        &self,
        kind: StrategyKind,
        pool: &[Candidate],
        ctx: &ScoringContext,
        k: usize,
        rng: RngHierarchy,
    ) -> Result<StrategyRun, StrategyError> {
        let run = match kind {
            StrategyKind::Compass => self.run_compass(pool, ctx, k, rng)?,
            StrategyKind::Ai => self.run_ai(pool, ctx, k, rng)?,
        };
        info!(
            strategy = %kind,
            picks = run.picks.len(),
            pool = run.pool_size,
            "strategy run complete"
        );
        Ok(run)
    }

    fn run_compass(
        &self,
        pool: &[Candidate],
        ctx: &ScoringContext,
        k: usize,
        rng: RngHierarchy,
    ) -> Result<StrategyRun, StrategyError> {
        let selection = self
            .pipeline
            .select(pool, ctx, k, &SeededResidual::from_hierarchy(rng))?;

        let features: Vec<FeatureVector> = selection.picks.iter().map(FeatureVector::from_scored).collect();
        let forecasts = match SeededForecaster::from_hierarchy(rng).predict(&features) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "forecast failed, returning empty run");
                return Ok(StrategyRun::empty(StrategyKind::Compass, selection.context, pool.len()));
            }
        };

        let picks = selection
            .picks
            .into_iter()
            .zip(forecasts)
            .map(|(scored, p)| Pick {
                scored,
                forecast: Forecast {
                    expected_change: p.expected_change,
                    up_probability: None,
                },
            })
            .collect();

        Ok(StrategyRun {
            strategy: StrategyKind::Compass,
            context: selection.context,
            weights: selection.weights,
            picks,
            pool_size: selection.pool_size,
            eligible_size: selection.eligible_size,
            threshold: None,
            fingerprint: Some(selection.fingerprint),
        })
    }

    fn run_ai(
        &self,
        pool: &[Candidate],
        ctx: &ScoringContext,
        k: usize,
        rng: RngHierarchy,
    ) -> Result<StrategyRun, StrategyError> {
        let ctx = ctx.normalized();
        if pool.is_empty() {
            warn!("empty candidate pool, returning empty run");
            return Ok(StrategyRun::empty(StrategyKind::Ai, ctx, 0));
        }

        let scored = self.pipeline.score_pool(
            pool,
            &ctx,
            &SeededResidual::from_hierarchy(rng),
            &CancelToken::new(),
        )?;
        let features: Vec<FeatureVector> = scored.iter().map(FeatureVector::from_scored).collect();
        let predictions = match predict_with_timeout(
            Arc::clone(&self.predictor),
            features,
            self.section.predictor_timeout(),
        ) {
            Ok(p) => p,
            Err(e) => {
                warn!(predictor = self.predictor.name(), error = %e, "prediction failed, returning empty run");
                return Ok(StrategyRun::empty(StrategyKind::Ai, ctx, pool.len()));
            }
        };

        let threshold = ai_threshold(&self.section, ctx.trend, ctx.risk);
        let passing: Vec<Predicted> = scored
            .into_iter()
            .zip(predictions)
            .filter(|(_, p)| p.up_probability > threshold)
            .map(|(scored, prediction)| Predicted { scored, prediction })
            .collect();
        let passing_count = passing.len();

        let probability = |c: &Predicted| c.prediction.up_probability;
        let eligible = self
            .pipeline
            .filter()
            .apply_by(passing, &ctx.preference, probability);
        let eligible_size = eligible.len();
        let picks = TopKSelector
            .select_by(eligible, k, probability)
            .into_iter()
            .map(|c| Pick {
                forecast: Forecast {
                    expected_change: c.prediction.expected_change,
                    up_probability: Some(c.prediction.up_probability),
                },
                scored: c.scored,
            })
            .collect();

        info!(threshold, passing = passing_count, eligible = eligible_size, "ai strategy filtered");

        Ok(StrategyRun {
            strategy: StrategyKind::Ai,
            weights: CompositeIndexer.weights(&ctx),
            context: ctx,
            picks,
            pool_size: pool.len(),
            eligible_size,
            threshold: Some(threshold),
            fingerprint: None,
        })
    }
}
