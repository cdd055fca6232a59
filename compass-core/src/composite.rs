//! Composite index — blends the three dimension scores with trend- and
//! risk-dependent weights.
//!
//! Weight assignment is a fixed decision table, not learned:
//!
//! | trend | earth | sky | human |
//! |-------|-------|-----|-------|
//! | up    | 0.5   | 0.2 | 0.3   |
//! | down  | 0.3   | 0.5 | 0.2   |
//! | flat  | 0.3   | 0.3 | 0.4   |
//!
//! Risk adjustment is multiplicative and applied *before* renormalization:
//! aggressive scales earth ×1.2 and human ×1.1, conservative scales sky ×1.2.
//! The order lookup → adjust → renormalize is part of the contract.

use serde::{Deserialize, Serialize};

use crate::domain::{DimensionScores, RiskAppetite, ScoringContext, Trend};

/// Final (or intermediate) weights of the three dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub sky: f64,
    pub earth: f64,
    pub human: f64,
}

impl CompositeWeights {
    pub fn sum(&self) -> f64 {
        self.sky + self.earth + self.human
    }

    /// Base weights from the trend decision table.
    pub fn for_trend(trend: Trend) -> Self {
        match trend {
            Trend::Up => Self {
                earth: 0.5,
                sky: 0.2,
                human: 0.3,
            },
            Trend::Down => Self {
                earth: 0.3,
                sky: 0.5,
                human: 0.2,
            },
            Trend::Flat => Self {
                earth: 0.3,
                sky: 0.3,
                human: 0.4,
            },
        }
    }

    /// Apply the risk multipliers (no renormalization).
    pub fn adjusted_for(self, risk: RiskAppetite) -> Self {
        match risk {
            RiskAppetite::Aggressive => Self {
                earth: self.earth * 1.2,
                human: self.human * 1.1,
                ..self
            },
            RiskAppetite::Conservative => Self {
                sky: self.sky * 1.2,
                ..self
            },
            RiskAppetite::Balanced => self,
        }
    }

    /// Divide each weight by the sum so they add up to 1.
    pub fn normalized(self) -> Self {
        let total = self.sum();
        Self {
            sky: self.sky / total,
            earth: self.earth / total,
            human: self.human / total,
        }
    }

    pub fn apply(&self, scores: &DimensionScores) -> f64 {
        self.sky * scores.sky + self.earth * scores.earth + self.human * scores.human
    }
}

/// Turns dimension scores into a composite ranking score.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeIndexer;

impl CompositeIndexer {
    /// Final normalized weights for a context: table → risk → renormalize.
    pub fn weights(&self, ctx: &ScoringContext) -> CompositeWeights {
        CompositeWeights::for_trend(ctx.trend)
            .adjusted_for(ctx.risk)
            .normalized()
    }

    pub fn composite(&self, scores: &DimensionScores, ctx: &ScoringContext) -> f64 {
        self.weights(ctx).apply(scores)
    }
}
