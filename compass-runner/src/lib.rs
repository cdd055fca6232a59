//! Compass Runner — strategies, backtesting, performance series, and export.
//!
//! This crate builds on `compass-core` to provide:
//! - TOML configuration for every stage
//! - Candidate source resolution (synthetic, universe-pinned, guarded)
//! - The Compass and AI strategies with per-pick forecasts
//! - Per-pick match scores and risk tips
//! - A repeated-run backtester and a seeded performance series
//! - JSON / CSV / Markdown artifacts

pub mod advice;
pub mod backtest;
pub mod config;
pub mod export;
pub mod metrics;
pub mod performance;
pub mod source;
pub mod strategy;

pub use advice::{advise, Advice, MatchLevel};
pub use backtest::{Backtester, BacktestSummary, IterationResult};
pub use config::{CompassConfig, ConfigError};
pub use export::{save_artifacts, SelectionReport, SCHEMA_VERSION};
pub use metrics::CurveMetrics;
pub use performance::{PerformancePoint, PerformanceSeries, PerformanceSummary};
pub use source::{candidate_source, LoadError};
pub use strategy::{Forecast, Pick, StrategyError, StrategyKind, StrategyRun, StrategyRunner};
