//! Domain types: candidates, raw features, dimension scores, scoring context.

pub mod candidate;
pub mod context;
pub mod features;

pub use candidate::{Candidate, DimensionScores, ScoredCandidate};
pub use context::{Preference, RiskAppetite, ScoringContext, Trend, UnknownValue};
pub use features::{keys, FeatureValue, RawFeatures};
