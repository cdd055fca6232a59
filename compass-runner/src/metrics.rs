//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: value curve or return list in, scalar out.
//! No dependencies on the strategies, data sources, or pipeline.

use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Summary statistics of a value curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveMetrics {
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub volatility: f64,
}

impl CurveMetrics {
    pub fn compute(curve: &[f64]) -> Self {
        let returns = daily_returns(curve);
        Self {
            total_return: total_return(curve),
            max_drawdown: max_drawdown(curve),
            sharpe: sharpe_ratio(curve, 0.0),
            volatility: std_dev(&returns) * TRADING_DAYS.sqrt(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(curve: &[f64]) -> f64 {
    match (curve.first(), curve.last()) {
        (Some(&initial), Some(&final_value)) if curve.len() >= 2 && initial > 0.0 => {
            (final_value - initial) / initial
        }
        _ => 0.0,
    }
}

/// Annualized Sharpe ratio from daily returns.
///
/// Sharpe = mean(daily returns - rf) / std(daily returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 points.
pub fn sharpe_ratio(curve: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean(&excess) / std) * TRADING_DAYS.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if the curve is constant or monotonically increasing.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }
    let mut peak = curve[0];
    let mut max_dd = 0.0_f64;

    for &v in curve {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((v - peak) / peak);
        }
    }
    max_dd
}

/// Fraction of values strictly above zero.
pub fn win_rate(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| v > 0.0).count() as f64 / values.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Compute daily returns from a value curve.
pub fn daily_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
