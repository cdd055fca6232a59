//! Predictor contract and the built-in predictors.
//!
//! A predictor maps scored feature vectors to an up-probability and an
//! expected percentage change. The pipeline treats it as a black box; model
//! training is not part of this crate.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{keys, ScoredCandidate};
use crate::rng::RngHierarchy;
use crate::timeout::run_with_timeout;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("predictor returned {got} predictions for {expected} inputs")]
    LengthMismatch { expected: usize, got: usize },

    #[error("predictor timed out after {0:?}")]
    Timeout(Duration),

    #[error("prediction failed: {0}")]
    Failed(String),
}

/// Model input for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub id: String,
    pub sky: f64,
    pub earth: f64,
    pub human: f64,
    pub pe: f64,
    pub roe: f64,
    pub profit_growth: f64,
}

/// Fallbacks for missing ratios (calibration midpoints).
const PE_FALLBACK: f64 = 30.0;
const ROE_FALLBACK: f64 = 15.0;
const GROWTH_FALLBACK: f64 = 15.0;

impl FeatureVector {
    pub fn from_scored(c: &ScoredCandidate) -> Self {
        let f = &c.candidate.features;
        Self {
            id: c.candidate.id.clone(),
            sky: c.dimensions.sky,
            earth: c.dimensions.earth,
            human: c.dimensions.human,
            pe: f.number(keys::PE).unwrap_or(PE_FALLBACK),
            roe: f.number(keys::ROE).unwrap_or(ROE_FALLBACK),
            profit_growth: f.number(keys::PROFIT_GROWTH).unwrap_or(GROWTH_FALLBACK),
        }
    }

    fn values(&self) -> [f64; 6] {
        [self.sky, self.earth, self.human, self.pe, self.roe, self.profit_growth]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability of a price rise, [0, 1].
    pub up_probability: f64,
    /// Expected percentage change.
    pub expected_change: f64,
}

pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    /// One prediction per input, same order.
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<Prediction>, PredictError>;
}

/// Run `predictor` on a worker thread with a deadline.
///
/// A timeout is reported as [`PredictError::Timeout`]; callers treat it as a
/// recoverable failure.
pub fn predict_with_timeout(
    predictor: Arc<dyn Predictor>,
    batch: Vec<FeatureVector>,
    timeout: Duration,
) -> Result<Vec<Prediction>, PredictError> {
    let expected = batch.len();
    let out = run_with_timeout(timeout, move || predictor.predict(&batch))
        .ok_or(PredictError::Timeout(timeout))??;
    if out.len() != expected {
        return Err(PredictError::LengthMismatch {
            expected,
            got: out.len(),
        });
    }
    Ok(out)
}

// ─── Logistic predictor ──────────────────────────────────────────────

/// Linear coefficients over the z-scored feature columns
/// (sky, earth, human, pe, roe, profit_growth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticCoefficients {
    pub intercept: f64,
    pub weights: [f64; 6],
    pub change_intercept: f64,
    pub change_weights: [f64; 6],
}

impl Default for LogisticCoefficients {
    fn default() -> Self {
        Self {
            intercept: 0.0,
            weights: [0.6, 0.8, 0.5, -0.3, 0.4, 0.3],
            change_intercept: 2.5,
            change_weights: [0.9, 1.2, 0.75, -0.45, 0.6, 0.45],
        }
    }
}

/// Fixed-coefficient logistic model over batch-standardized features.
#[derive(Debug, Clone, Default)]
pub struct LogisticPredictor {
    coefficients: LogisticCoefficients,
}

impl LogisticPredictor {
    pub fn new(coefficients: LogisticCoefficients) -> Self {
        Self { coefficients }
    }
}

/// Column means and standard deviations of a batch.
fn column_stats(batch: &[FeatureVector]) -> [(f64, f64); 6] {
    let n = batch.len() as f64;
    let mut stats = [(0.0, 0.0); 6];
    for (col, stat) in stats.iter_mut().enumerate() {
        let mean = batch.iter().map(|v| v.values()[col]).sum::<f64>() / n;
        let var = batch
            .iter()
            .map(|v| (v.values()[col] - mean).powi(2))
            .sum::<f64>()
            / n;
        *stat = (mean, var.sqrt());
    }
    stats
}

fn dot(weights: &[f64; 6], z: &[f64; 6]) -> f64 {
    weights.iter().zip(z).map(|(w, x)| w * x).sum()
}

impl Predictor for LogisticPredictor {
    fn name(&self) -> &str {
        "logistic"
    }

    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<Prediction>, PredictError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let stats = column_stats(batch);
        let c = &self.coefficients;

        Ok(batch
            .iter()
            .map(|v| {
                let raw = v.values();
                let mut z = [0.0; 6];
                for (i, (mean, sd)) in stats.iter().enumerate() {
                    z[i] = if *sd > f64::EPSILON { (raw[i] - mean) / sd } else { 0.0 };
                }
                let logit = c.intercept + dot(&c.weights, &z);
                Prediction {
                    up_probability: 1.0 / (1.0 + (-logit).exp()),
                    expected_change: c.change_intercept + dot(&c.change_weights, &z),
                }
            })
            .collect())
    }
}

// ─── Seeded forecaster ───────────────────────────────────────────────

pub const FORECAST_MIN: f64 = -5.0;
pub const FORECAST_MAX: f64 = 10.0;

/// Expected change drawn uniformly from `[FORECAST_MIN, FORECAST_MAX)` per
/// candidate id. The up-probability is the draw's position in that range.
#[derive(Debug, Clone, Copy)]
pub struct SeededForecaster {
    hierarchy: RngHierarchy,
}

impl SeededForecaster {
    pub fn new(seed: u64) -> Self {
        Self {
            hierarchy: RngHierarchy::new(seed),
        }
    }

    pub fn from_hierarchy(hierarchy: RngHierarchy) -> Self {
        Self { hierarchy }
    }
}

impl Predictor for SeededForecaster {
    fn name(&self) -> &str {
        "seeded_forecast"
    }

    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<Prediction>, PredictError> {
        Ok(batch
            .iter()
            .map(|v| {
                let change = self
                    .hierarchy
                    .rng_for("forecast", &v.id, 0)
                    .gen_range(FORECAST_MIN..FORECAST_MAX);
                Prediction {
                    up_probability: (change - FORECAST_MIN) / (FORECAST_MAX - FORECAST_MIN),
                    expected_change: change,
                }
            })
            .collect())
    }
}
