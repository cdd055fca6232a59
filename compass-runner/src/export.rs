//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for strategy runs:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: picks table and performance series for external analysis tools
//! - **Markdown**: human-readable selection report
//!
//! All persisted artifacts include a `schema_version` field. Newer versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::advice::{advise, Advice};
use crate::backtest::BacktestSummary;
use crate::performance::PerformanceSeries;
use crate::strategy::StrategyRun;

/// Current artifact schema version.
pub const SCHEMA_VERSION: u32 = 1;

pub const DISCLAIMER: &str =
    "For demonstration only. Scores are heuristic and partly random; this is not investment advice.";

/// A strategy run together with the advice for each pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub schema_version: u32,
    pub seed: u64,
    pub run: StrategyRun,
    /// Same order as `run.picks`.
    pub advice: Vec<Advice>,
}

impl SelectionReport {
    pub fn new(run: StrategyRun, seed: u64) -> Self {
        let advice = run.picks.iter().map(|p| advise(p, &run.context)).collect();
        Self {
            schema_version: SCHEMA_VERSION,
            seed,
            run,
            advice,
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &SelectionReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SelectionReport to JSON")
}

/// Deserialize a `SelectionReport`, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<SelectionReport> {
    let report: SelectionReport =
        serde_json::from_str(json).context("failed to deserialize SelectionReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

pub fn export_backtest_json(summary: &BacktestSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize BacktestSummary to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the picks of a report as CSV.
///
/// Columns: rank, id, name, category, sky, earth, human, composite,
/// expected_change, up_probability, match_score, match_level, risk_tips
pub fn export_picks_csv(report: &SelectionReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "rank",
        "id",
        "name",
        "category",
        "sky",
        "earth",
        "human",
        "composite",
        "expected_change",
        "up_probability",
        "match_score",
        "match_level",
        "risk_tips",
    ])?;

    for (i, (pick, advice)) in report.run.picks.iter().zip(&report.advice).enumerate() {
        let c = &pick.scored.candidate;
        let d = &pick.scored.dimensions;
        wtr.write_record([
            &(i + 1).to_string(),
            &c.id,
            &c.name,
            &c.category,
            &format!("{:.2}", d.sky),
            &format!("{:.2}", d.earth),
            &format!("{:.2}", d.human),
            &format!("{:.4}", pick.scored.composite),
            &format!("{:.2}", pick.forecast.expected_change),
            &pick
                .forecast
                .up_probability
                .map(|p| format!("{p:.4}"))
                .unwrap_or_default(),
            &format!("{:.0}", advice.match_score),
            advice.match_level.as_str(),
            &advice.risk_tips.join("; "),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a performance series as CSV with date, strategy and index columns.
pub fn export_performance_csv(series: &PerformanceSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "strategy_return", "index_return"])?;
    for p in &series.points {
        wtr.write_record([
            &p.date.to_string(),
            &format!("{:.4}", p.strategy_return),
            &format!("{:.4}", p.index_return),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a selection.
///
/// Creates a directory named `{strategy}_{timestamp}/` under `output_dir`
/// containing:
/// - `selection.json` — the full `SelectionReport`
/// - `picks.csv` — picks with scores, forecast and advice
/// - `report.md` — Markdown report
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &SelectionReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.run.strategy,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("selection.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("picks.csv"), export_picks_csv(report)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    Ok(run_dir)
}

/// Load a `SelectionReport` from an artifact directory's selection.json.
pub fn load_artifacts(dir: &Path) -> Result<SelectionReport> {
    let path = dir.join("selection.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(report: &SelectionReport) -> String {
    let run = &report.run;
    let mut md = String::with_capacity(2048);

    md.push_str("# Selection Report\n\n");

    md.push_str("## Request\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Strategy | {} |\n", run.strategy));
    md.push_str(&format!("| Trend | {} |\n", run.context.trend));
    md.push_str(&format!("| Risk | {} |\n", run.context.risk));
    md.push_str(&format!("| Preference | {} |\n", run.context.preference));
    md.push_str(&format!("| Seed | {} |\n", report.seed));
    md.push_str(&format!(
        "| Pool / eligible | {} / {} |\n",
        run.pool_size, run.eligible_size
    ));
    md.push_str(&format!(
        "| Weights (sky / earth / human) | {:.3} / {:.3} / {:.3} |\n",
        run.weights.sky, run.weights.earth, run.weights.human
    ));
    if let Some(t) = run.threshold {
        md.push_str(&format!("| Probability threshold | {t:.2} |\n"));
    }
    if let Some(fp) = &run.fingerprint {
        md.push_str(&format!("| Fingerprint | {} |\n", fp.short()));
    }
    md.push('\n');

    md.push_str("## Picks\n\n");
    if run.picks.is_empty() {
        md.push_str("No candidates were selected.\n\n");
    } else {
        md.push_str("| # | Id | Name | Category | Sky | Earth | Human | Composite | Forecast | Match |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- | --- | --- |\n");
        for (i, (p, a)) in run.picks.iter().zip(&report.advice).enumerate() {
            let c = &p.scored.candidate;
            let d = &p.scored.dimensions;
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.1} | {:.1} | {:.1} | {:.2} | {:+.2}% | {:.0} ({}) |\n",
                i + 1,
                c.id,
                c.name,
                c.category,
                d.sky,
                d.earth,
                d.human,
                p.scored.composite,
                p.forecast.expected_change,
                a.match_score,
                a.match_level.as_str()
            ));
        }
        md.push('\n');

        md.push_str("## Risk Tips\n\n");
        for (p, a) in run.picks.iter().zip(&report.advice) {
            md.push_str(&format!("- **{}**: {}\n", p.id(), a.risk_tips.join("; ")));
        }
        md.push('\n');
    }

    md.push_str(&format!("_{DISCLAIMER}_\n"));
    md
}
