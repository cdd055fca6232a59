use serde::{Deserialize, Serialize};

use super::features::RawFeatures;

/// One selectable item (a stock) as supplied by a candidate source.
///
/// Candidates are plain value records rebuilt for every request; they carry
/// no identity across requests beyond their `id` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Identifier, unique within a batch.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Categorical attribute used by the preference filter (sector).
    pub category: String,
    /// Raw inputs for the score calculator.
    #[serde(default)]
    pub features: RawFeatures,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            features: RawFeatures::new(),
        }
    }

    pub fn with_features(mut self, features: RawFeatures) -> Self {
        self.features = features;
        self
    }
}

/// The three independent dimension scores, nominal range [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    /// Market / macro dimension.
    pub sky: f64,
    /// Fundamental dimension.
    pub earth: f64,
    /// Sentiment dimension.
    pub human: f64,
}

impl DimensionScores {
    pub fn min(&self) -> f64 {
        self.sky.min(self.earth).min(self.human)
    }

    pub fn max(&self) -> f64 {
        self.sky.max(self.earth).max(self.human)
    }
}

/// A candidate enriched with its dimension scores and composite index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub dimensions: DimensionScores,
    pub composite: f64,
    /// Feature keys that were missing and replaced by their default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<String>,
}

impl ScoredCandidate {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    pub fn category(&self) -> &str {
        &self.candidate.category
    }
}
