//! Compass Core — scored candidate selection.
//!
//! This crate contains the selection engine and its collaborator contracts:
//! - Domain types (candidates, raw features, dimension scores, scoring context)
//! - Dimension scoring (sky / earth / human)
//! - Composite index with trend- and risk-dependent weights
//! - Preference filter with backfill and top-K selection
//! - The selection pipeline that runs them in sequence
//! - Candidate sources, predictors, and the seeded randomness behind both

pub mod composite;
pub mod data;
pub mod domain;
pub mod filter;
pub mod fingerprint;
pub mod pipeline;
pub mod predictor;
pub mod rng;
pub mod scoring;
pub mod select;
pub mod timeout;

pub use composite::{CompositeIndexer, CompositeWeights};
pub use domain::{Candidate, DimensionScores, Preference, RiskAppetite, ScoredCandidate, ScoringContext, Trend};
pub use filter::PreferenceFilter;
pub use pipeline::{PipelineConfig, SelectionError, SelectionPipeline, SelectionResult};
pub use rng::{FixedResidual, ResidualSource, RngHierarchy, SeededResidual};
pub use scoring::{ScoreCalculator, ScoringConfig};
pub use select::{Selectable, TopKSelector};
