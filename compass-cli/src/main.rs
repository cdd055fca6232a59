//! Compass CLI — candidate selection, backtest, performance and config commands.
//!
//! Commands:
//! - `select` — run a strategy once and print or save the picks
//! - `backtest` — repeat a strategy over fresh pools and summarise
//! - `performance` — print the strategy vs index performance series
//! - `config show` — print the effective configuration
//! - `config init` — write a default configuration file

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use compass_core::{RngHierarchy, ScoringContext};
use compass_runner::config::DEFAULT_CONFIG_FILE;
use compass_runner::export::{self, SelectionReport, DISCLAIMER};
use compass_runner::{
    candidate_source, performance, Backtester, BacktestSummary, CompassConfig, PerformanceSeries,
    StrategyKind, StrategyRunner,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "compass",
    about = "Compass — multi-dimensional candidate selection"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Only log warnings and errors (RUST_LOG still wins).
    #[arg(long, short, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Request options shared by `select` and `backtest`.
#[derive(Args, Clone)]
struct RequestArgs {
    /// Strategy: compass or ai.
    #[arg(long, default_value = "compass")]
    strategy: String,

    /// Market trend: up, flat or down.
    #[arg(long, default_value = "flat")]
    trend: String,

    /// Risk appetite: aggressive, balanced or conservative.
    #[arg(long, default_value = "balanced")]
    risk: String,

    /// Category preference, or "all".
    #[arg(long, default_value = "all")]
    preference: String,

    /// Number of picks. Defaults to `[selection] top_k`.
    #[arg(long)]
    top_k: Option<usize>,

    /// Master seed. Defaults to `[selection] seed`.
    #[arg(long)]
    seed: Option<u64>,

    /// Print JSON instead of the text report.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the top-K candidates for a trend, risk appetite and preference.
    Select {
        #[command(flatten)]
        request: RequestArgs,

        /// Save selection.json, picks.csv and report.md under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run a strategy repeatedly and report average statistics.
    Backtest {
        #[command(flatten)]
        request: RequestArgs,

        /// Number of iterations. Defaults to `[backtest] iterations`.
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Print the strategy vs index cumulative return series.
    Performance {
        /// Master seed. Defaults to `[selection] seed`.
        #[arg(long)]
        seed: Option<u64>,

        /// Write the series as CSV to this path.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Configuration file commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Write the default configuration to the config path.
    Init {
        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // An existing file may be malformed; init must not load it.
    if let Commands::Config {
        action: ConfigAction::Init { force },
    } = cli.command
    {
        return run_config_init(&cli.config, force);
    }

    let (config, found) = CompassConfig::load_or_default(&cli.config)?;
    let _log_guard = logging::init(&config.logging, cli.quiet)?;
    if !found {
        warn!(path = %cli.config.display(), "config file not found, using defaults");
    }

    match cli.command {
        Commands::Select {
            request,
            output_dir,
        } => run_select(&config, &request, output_dir.as_deref()),
        Commands::Backtest {
            request,
            iterations,
        } => run_backtest(config, &request, iterations),
        Commands::Performance { seed, csv, json } => {
            run_performance(&config, seed, csv.as_deref(), json)
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Init { force },
        } => run_config_init(&cli.config, force),
    }
}

fn parse_request(config: &CompassConfig, request: &RequestArgs) -> Result<(StrategyKind, ScoringContext, usize, u64)> {
    let kind: StrategyKind = request.strategy.parse()?;
    let ctx = ScoringContext::parse(&request.trend, &request.risk, &request.preference);
    let k = request.top_k.unwrap_or(config.selection.top_k);
    let seed = request.seed.unwrap_or(config.selection.seed);
    Ok((kind, ctx, k, seed))
}

fn run_select(config: &CompassConfig, request: &RequestArgs, output_dir: Option<&Path>) -> Result<()> {
    let (kind, ctx, k, seed) = parse_request(config, request)?;

    let pool = candidate_source(&config.data, seed)?.fetch_pool();
    let run = StrategyRunner::new(config).run(kind, &pool, &ctx, k, RngHierarchy::new(seed))?;
    let report = SelectionReport::new(run, seed);

    if request.json {
        println!("{}", export::export_json(&report)?);
    } else {
        print_selection(&report);
    }

    if let Some(dir) = output_dir {
        let run_dir = export::save_artifacts(&report, dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
        if !request.json {
            println!("Artifacts saved to: {}", run_dir.display());
        }
    }
    Ok(())
}

fn run_backtest(mut config: CompassConfig, request: &RequestArgs, iterations: Option<usize>) -> Result<()> {
    let (kind, ctx, k, seed) = parse_request(&config, request)?;
    if let Some(n) = iterations {
        if n == 0 {
            bail!("--iterations must be at least 1");
        }
        config.backtest.iterations = n;
    }

    // Fail on a bad universe file before fanning out.
    candidate_source(&config.data, seed)?;

    let data = config.data.clone();
    let pool_for = move |h: RngHierarchy| {
        candidate_source(&data, h.master_seed())
            .map(|s| s.fetch_pool())
            .unwrap_or_default()
    };

    let summary = Backtester::new(StrategyRunner::new(&config), config.backtest.clone())
        .run(kind, &ctx, k, RngHierarchy::new(seed), pool_for)?;

    if request.json {
        println!("{}", export::export_backtest_json(&summary)?);
    } else {
        print_backtest(&summary);
    }
    Ok(())
}

fn run_performance(config: &CompassConfig, seed: Option<u64>, csv: Option<&Path>, json: bool) -> Result<()> {
    let seed = seed.unwrap_or(config.selection.seed);
    let series = performance::generate(&config.performance, RngHierarchy::new(seed));

    if let Some(path) = csv {
        std::fs::write(path, export::export_performance_csv(&series)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "performance csv written");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        print_performance(&series);
    }
    Ok(())
}

fn run_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    std::fs::write(path, CompassConfig::default().to_toml()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

// ─── Text output ────────────────────────────────────────────────────

fn print_selection(report: &SelectionReport) {
    let run = &report.run;
    println!();
    println!("=== Selection ===");
    println!("Strategy:       {}", run.strategy);
    println!(
        "Context:        trend={} risk={} preference={}",
        run.context.trend, run.context.risk, run.context.preference
    );
    println!(
        "Weights:        sky={:.3} earth={:.3} human={:.3}",
        run.weights.sky, run.weights.earth, run.weights.human
    );
    println!("Pool:           {} ({} eligible)", run.pool_size, run.eligible_size);
    if let Some(t) = run.threshold {
        println!("Threshold:      p > {t:.2}");
    }
    if let Some(fp) = &run.fingerprint {
        println!("Fingerprint:    {}", fp.short());
    }
    println!();

    if run.picks.is_empty() {
        println!("No candidates selected.");
    } else {
        println!(
            "{:>3} {:<8} {:<18} {:<12} {:>6} {:>6} {:>6} {:>9} {:>9} {:>6}",
            "#", "Id", "Name", "Category", "Sky", "Earth", "Human", "Composite", "Forecast", "Match"
        );
        println!("{}", "-".repeat(92));
        for (i, (p, a)) in run.picks.iter().zip(&report.advice).enumerate() {
            let c = &p.scored.candidate;
            let d = &p.scored.dimensions;
            println!(
                "{:>3} {:<8} {:<18} {:<12} {:>6.1} {:>6.1} {:>6.1} {:>9.2} {:>8.2}% {:>6.0}",
                i + 1,
                c.id,
                truncate(&c.name, 18),
                truncate(&c.category, 12),
                d.sky,
                d.earth,
                d.human,
                p.scored.composite,
                p.forecast.expected_change,
                a.match_score
            );
            println!("    {} match; {}", a.match_level.as_str(), a.risk_tips.join("; "));
        }
    }
    println!();
    println!("{DISCLAIMER}");
    println!();
}

fn print_backtest(s: &BacktestSummary) {
    println!();
    println!("=== Backtest ===");
    println!("Strategy:       {}", s.strategy);
    println!(
        "Context:        trend={} risk={} preference={}",
        s.context.trend, s.context.risk, s.context.preference
    );
    println!("Iterations:     {} ({} with picks)", s.iterations, s.non_empty_runs);
    println!();
    println!("--- Averages ---");
    println!("Total Return:   {:.2}%", s.avg_total_return);
    println!("Win Rate:       {:.1}%", s.avg_win_rate * 100.0);
    println!("Max Drawdown:   {:.2}%", s.avg_max_drawdown * 100.0);
    println!("Sharpe:         {:.3}", s.avg_sharpe);
    println!();
    println!("{DISCLAIMER}");
    println!();
}

fn print_performance(series: &PerformanceSeries) {
    let s = &series.summary;
    println!();
    println!("=== Performance ===");
    if let (Some(first), Some(last)) = (series.points.first(), series.points.last()) {
        println!("Period:         {} to {} ({} days)", first.date, last.date, series.points.len());
    }
    println!("Strategy:       {:+.2}%", s.final_strategy_return);
    println!("Index:          {:+.2}%", s.final_index_return);
    println!("Excess:         {:+.2}%", s.excess_return);
    println!();
    println!("--- Strategy curve ---");
    println!("Max Drawdown:   {:.2}%", s.strategy.max_drawdown * 100.0);
    println!("Sharpe:         {:.3}", s.strategy.sharpe);
    println!("Volatility:     {:.2}%", s.strategy.volatility * 100.0);
    println!();
    println!("{DISCLAIMER}");
    println!();
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

