//! Repeated-run backtester.
//!
//! Runs a strategy `iterations` times, each on a fresh pool and with its own
//! child RNG, then simulates a daily value path for each pick basket:
//!
//! - total return: mean expected change of the picks (%)
//! - win rate: share of picks with a positive expected change
//! - max drawdown, Sharpe: from the simulated basket path
//!
//! Iterations are independent, so they run in parallel; the per-iteration
//! seeds make the output identical either way.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use compass_core::{Candidate, RngHierarchy, ScoringContext};

use crate::config::BacktestSection;
use crate::metrics::{self, CurveMetrics};
use crate::strategy::{StrategyError, StrategyKind, StrategyRun, StrategyRunner};

/// Statistics of one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    pub iteration: usize,
    pub picks: usize,
    /// Mean expected change of the picks, in percent.
    pub total_return: f64,
    pub win_rate: f64,
    /// Negative fraction.
    pub max_drawdown: f64,
    pub sharpe: f64,
}

/// Averages over the non-empty iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub strategy: StrategyKind,
    pub context: ScoringContext,
    pub iterations: usize,
    pub non_empty_runs: usize,
    pub avg_total_return: f64,
    pub avg_win_rate: f64,
    pub avg_max_drawdown: f64,
    pub avg_sharpe: f64,
    pub runs: Vec<IterationResult>,
}

pub struct Backtester {
    runner: StrategyRunner,
    section: BacktestSection,
    parallel: bool,
}

impl Backtester {
    pub fn new(runner: StrategyRunner, section: BacktestSection) -> Self {
        Self {
            runner,
            section,
            parallel: true,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run the backtest. `pool_for` supplies a fresh pool per iteration from
    /// that iteration's RNG.
    pub fn run<F>(
        &self,
        kind: StrategyKind,
        ctx: &ScoringContext,
        k: usize,
        rng: RngHierarchy,
        pool_for: F,
    ) -> Result<BacktestSummary, StrategyError>
    where
        F: Fn(RngHierarchy) -> Vec<Candidate> + Send + Sync,
    {
        let one = |i: usize| -> Result<Option<IterationResult>, StrategyError> {
            let child = rng.child("backtest", i as u64);
            let pool = pool_for(child);
            let run = self.runner.run(kind, &pool, ctx, k, child)?;
            Ok(self.evaluate(i, &run, child))
        };

        let results: Vec<Option<IterationResult>> = if self.parallel {
            (0..self.section.iterations)
                .into_par_iter()
                .map(one)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            (0..self.section.iterations)
                .map(one)
                .collect::<Result<Vec<_>, _>>()?
        };

        let runs: Vec<IterationResult> = results.into_iter().flatten().collect();
        let avg = |f: fn(&IterationResult) -> f64| {
            metrics::mean(&runs.iter().map(f).collect::<Vec<_>>())
        };

        let summary = BacktestSummary {
            strategy: kind,
            context: ctx.normalized(),
            iterations: self.section.iterations,
            non_empty_runs: runs.len(),
            avg_total_return: avg(|r| r.total_return),
            avg_win_rate: avg(|r| r.win_rate),
            avg_max_drawdown: avg(|r| r.max_drawdown),
            avg_sharpe: avg(|r| r.sharpe),
            runs,
        };

        info!(
            strategy = %kind,
            iterations = summary.iterations,
            non_empty = summary.non_empty_runs,
            avg_return = summary.avg_total_return,
            "backtest complete"
        );
        Ok(summary)
    }

    /// Statistics of one run; `None` for a run without picks.
    fn evaluate(&self, iteration: usize, run: &StrategyRun, rng: RngHierarchy) -> Option<IterationResult> {
        if run.picks.is_empty() {
            return None;
        }
        let changes: Vec<f64> = run.picks.iter().map(|p| p.forecast.expected_change).collect();
        let path = simulate_path(&changes, &self.section, rng);
        let m = CurveMetrics::compute(&path);

        Some(IterationResult {
            iteration,
            picks: changes.len(),
            total_return: metrics::mean(&changes),
            win_rate: metrics::win_rate(&changes),
            max_drawdown: m.max_drawdown,
            sharpe: m.sharpe,
        })
    }
}

/// Daily value path (starting at 100) of an equal-weight basket whose picks
/// drift toward their expected change over the horizon, plus uniform noise.
pub fn simulate_path(expected_changes: &[f64], section: &BacktestSection, rng: RngHierarchy) -> Vec<f64> {
    let days = section.horizon_days.max(1);
    let mut draws = rng.rng_for("path", "", 0);
    let mut path = Vec::with_capacity(days + 1);
    let mut value = 100.0;
    path.push(value);

    for _ in 0..days {
        let daily: f64 = expected_changes
            .iter()
            .map(|c| {
                let noise = if section.daily_noise > 0.0 {
                    draws.gen_range(-section.daily_noise..section.daily_noise)
                } else {
                    0.0
                };
                c / 100.0 / days as f64 + noise
            })
            .sum::<f64>()
            / expected_changes.len().max(1) as f64;
        value *= 1.0 + daily;
        path.push(value);
    }
    path
}
