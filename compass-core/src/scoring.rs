//! Dimension scoring — derives the sky, earth and human scores of a candidate
//! from its raw features.
//!
//! - **Sky** (market): policy support for the candidate's category, recent
//!   price change, and a residual term for unobserved macro factors.
//! - **Earth** (fundamental): valuation, profitability and growth ratios.
//! - **Human** (sentiment): volume change and the analyst rating.
//!
//! Ratios are clip-rescaled onto a common 0–80 sub-scale before weighting.
//! A missing feature never fails the batch: it contributes a documented
//! default and its key is recorded on the result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{keys, Candidate, DimensionScores};
use crate::rng::ResidualSource;

/// Top of the common sub-scale that ratios are rescaled onto.
pub const SUB_SCALE_MAX: f64 = 80.0;

/// Sub-score used when a numeric feature is missing (sub-scale midpoint).
pub const MISSING_SUB_SCORE: f64 = SUB_SCALE_MAX / 2.0;

/// Policy support used for categories absent from the table.
pub const DEFAULT_POLICY_SUPPORT: f64 = 60.0;

const SKY_POLICY_WEIGHT: f64 = 0.4;
const SKY_CHANGE_WEIGHT: f64 = 0.3;
const SKY_RESIDUAL_WEIGHT: f64 = 0.3;

const EARTH_PE_WEIGHT: f64 = 0.3;
const EARTH_ROE_WEIGHT: f64 = 0.4;
const EARTH_GROWTH_WEIGHT: f64 = 0.3;

const HUMAN_VOLUME_WEIGHT: f64 = 0.5;
const HUMAN_RATING_WEIGHT: f64 = 0.5;

// ─── Rescaling ───────────────────────────────────────────────────────

/// Which end of a calibration range is favourable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Higher raw values score higher.
    Ascending,
    /// Lower raw values score higher.
    Descending,
}

/// Calibration range for one ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub lo: f64,
    pub hi: f64,
    pub direction: Direction,
}

impl Calibration {
    pub const fn new(lo: f64, hi: f64, direction: Direction) -> Self {
        Self { lo, hi, direction }
    }

    /// `clip(((asc ? r-lo : hi-r) / (hi-lo)) * 80, 0, 80)`
    pub fn rescale(&self, r: f64) -> f64 {
        let span = self.hi - self.lo;
        if span <= 0.0 {
            return MISSING_SUB_SCORE;
        }
        let distance = match self.direction {
            Direction::Ascending => r - self.lo,
            Direction::Descending => self.hi - r,
        };
        (distance / span * SUB_SCALE_MAX).clamp(0.0, SUB_SCALE_MAX)
    }
}

pub const PCT_CHANGE_RANGE: Calibration = Calibration::new(-10.0, 10.0, Direction::Ascending);
pub const PE_RANGE: Calibration = Calibration::new(10.0, 50.0, Direction::Descending);
pub const ROE_RANGE: Calibration = Calibration::new(5.0, 25.0, Direction::Ascending);
pub const PROFIT_GROWTH_RANGE: Calibration = Calibration::new(-20.0, 50.0, Direction::Ascending);
pub const VOLUME_CHANGE_RANGE: Calibration = Calibration::new(-30.0, 50.0, Direction::Ascending);

// ─── Analyst rating ──────────────────────────────────────────────────

/// Qualitative analyst rating with its fixed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Buy,
    Accumulate,
    Hold,
    Reduce,
    Sell,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::Buy,
        Rating::Accumulate,
        Rating::Hold,
        Rating::Reduce,
        Rating::Sell,
    ];

    pub fn score(&self) -> f64 {
        match self {
            Self::Buy => 90.0,
            Self::Accumulate => 75.0,
            Self::Hold => 60.0,
            Self::Reduce => 45.0,
            Self::Sell => 30.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Accumulate => "accumulate",
            Self::Hold => "hold",
            Self::Reduce => "reduce",
            Self::Sell => "sell",
        }
    }

    /// Parse a rating label (English or the original tool's labels).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "buy" | "买入" => Some(Self::Buy),
            "accumulate" | "overweight" | "增持" => Some(Self::Accumulate),
            "hold" | "neutral" | "持有" => Some(Self::Hold),
            "reduce" | "underweight" | "减持" => Some(Self::Reduce),
            "sell" | "卖出" => Some(Self::Sell),
            _ => None,
        }
    }
}

// ─── Config ──────────────────────────────────────────────────────────

/// Tunable tables for the score calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Policy support per category, [0, 100].
    pub policy_support: BTreeMap<String, f64>,
    /// Policy support for categories absent from the table.
    pub default_policy_support: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let policy_support = [
            ("energy", 85.0),
            ("telecom", 80.0),
            ("metals", 70.0),
            ("consumer", 65.0),
            ("finance", 60.0),
            ("real_estate", 45.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            policy_support,
            default_policy_support: DEFAULT_POLICY_SUPPORT,
        }
    }
}

// ─── Calculator ──────────────────────────────────────────────────────

/// Output of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoring {
    pub dimensions: DimensionScores,
    /// Feature keys that were missing and replaced by their default.
    pub defaulted: Vec<String>,
}

/// Computes the three dimension scores of a candidate.
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn policy_support(&self, category: &str) -> f64 {
        self.config
            .policy_support
            .get(category)
            .copied()
            .unwrap_or(self.config.default_policy_support)
    }

    pub fn score(&self, candidate: &Candidate, residual: &dyn ResidualSource) -> Scoring {
        let mut defaulted = Vec::new();
        let features = &candidate.features;

        let mut sub_score = |key: &str, calibration: &Calibration| match features.number(key) {
            Some(v) => calibration.rescale(v),
            None => {
                defaulted.push(key.to_string());
                MISSING_SUB_SCORE
            }
        };

        let change = sub_score(keys::PCT_CHANGE, &PCT_CHANGE_RANGE);
        let pe = sub_score(keys::PE, &PE_RANGE);
        let roe = sub_score(keys::ROE, &ROE_RANGE);
        let growth = sub_score(keys::PROFIT_GROWTH, &PROFIT_GROWTH_RANGE);
        let volume = sub_score(keys::VOLUME_CHANGE, &VOLUME_CHANGE_RANGE);

        let rating = match features.label(keys::RATING).and_then(Rating::from_label) {
            Some(r) => r,
            None => {
                defaulted.push(keys::RATING.to_string());
                Rating::Hold
            }
        };

        let sky = SKY_POLICY_WEIGHT * self.policy_support(&candidate.category)
            + SKY_CHANGE_WEIGHT * change
            + SKY_RESIDUAL_WEIGHT * residual.residual(&candidate.id);
        let earth = EARTH_PE_WEIGHT * pe + EARTH_ROE_WEIGHT * roe + EARTH_GROWTH_WEIGHT * growth;
        let human = HUMAN_VOLUME_WEIGHT * volume + HUMAN_RATING_WEIGHT * rating.score();

        if !defaulted.is_empty() {
            debug!(candidate = %candidate.id, missing = ?defaulted, "substituted default sub-scores");
        }

        Scoring {
            dimensions: DimensionScores { sky, earth, human },
            defaulted,
        }
    }
}
