//! Historical performance series — strategy vs benchmark index.
//!
//! Both series are seeded random walks of cumulative return (percentage
//! points) over business days. The series is illustrative; it is not derived
//! from the picks.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use compass_core::RngHierarchy;

use crate::config::{DriftRange, PerformanceSection};
use crate::metrics::CurveMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    /// Cumulative strategy return, percent.
    pub strategy_return: f64,
    /// Cumulative benchmark return, percent.
    pub index_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub final_strategy_return: f64,
    pub final_index_return: f64,
    /// Strategy minus benchmark, percentage points.
    pub excess_return: f64,
    /// Metrics of the value curve `100 + cumulative strategy return`.
    pub strategy: CurveMetrics,
    pub index: CurveMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSeries {
    pub points: Vec<PerformancePoint>,
    pub summary: PerformanceSummary,
}

/// Monday–Friday dates from `start` to `end`, inclusive.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

fn random_walk(days: usize, drift: DriftRange, rng: RngHierarchy, key: &str) -> Vec<f64> {
    let mut draws = rng.rng_for("performance", key, 0);
    let mut cumulative = 0.0;
    let mut out = Vec::with_capacity(days);
    for i in 0..days {
        if i > 0 {
            cumulative += draws.gen_range(drift.min..drift.max);
        }
        out.push(cumulative);
    }
    out
}

pub fn generate(section: &PerformanceSection, rng: RngHierarchy) -> PerformanceSeries {
    let dates = business_days(section.start, section.end);
    let strategy = random_walk(dates.len(), section.strategy_drift, rng, "strategy");
    let index = random_walk(dates.len(), section.index_drift, rng, "index");

    let points: Vec<PerformancePoint> = dates
        .into_iter()
        .zip(strategy.iter().zip(&index))
        .map(|(date, (&s, &i))| PerformancePoint {
            date,
            strategy_return: s,
            index_return: i,
        })
        .collect();

    let as_curve = |xs: &[f64]| xs.iter().map(|x| 100.0 + x).collect::<Vec<_>>();
    let final_strategy_return = strategy.last().copied().unwrap_or(0.0);
    let final_index_return = index.last().copied().unwrap_or(0.0);

    let summary = PerformanceSummary {
        final_strategy_return,
        final_index_return,
        excess_return: final_strategy_return - final_index_return,
        strategy: CurveMetrics::compute(&as_curve(&strategy)),
        index: CurveMetrics::compute(&as_curve(&index)),
    };

    info!(
        days = points.len(),
        strategy = final_strategy_return,
        index = final_index_return,
        "performance series generated"
    );
    PerformanceSeries { points, summary }
}
