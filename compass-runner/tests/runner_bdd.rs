//! BDD scenarios for the runner.
//!
//! - Configured selection through to saved artifacts
//! - AI strategy thresholds by trend and risk
//! - Backtest determinism across seeds and parallelism
//! - Performance series over a configured window

use chrono::NaiveDate;
use compass_core::{RngHierarchy, ScoringContext};
use compass_runner::config::{BacktestSection, PerformanceSection};
use compass_runner::export::{self, SelectionReport};
use compass_runner::{
    candidate_source, performance, Backtester, CompassConfig, MatchLevel, StrategyKind,
    StrategyRunner,
};

fn config(toml: &str) -> CompassConfig {
    CompassConfig::from_toml(toml).expect("config should parse")
}

#[test]
fn bdd_scenario_configured_selection_saves_artifacts() {
    // GIVEN a config with a smaller pool and K = 5
    let config = config(
        r#"
        [selection]
        top_k = 5
        seed = 7

        [data]
        pool_size = 40
        "#,
    );
    let pool = candidate_source(&config.data, config.selection.seed)
        .unwrap()
        .fetch_pool();
    assert_eq!(pool.len(), 40);

    // WHEN the compass strategy runs for an energy preference
    let ctx = ScoringContext::parse("up", "aggressive", "energy");
    let run = StrategyRunner::new(&config)
        .run(
            StrategyKind::Compass,
            &pool,
            &ctx,
            config.selection.top_k,
            RngHierarchy::new(config.selection.seed),
        )
        .unwrap();
    let report = SelectionReport::new(run, config.selection.seed);

    // THEN five picks are returned, each with advice
    assert_eq!(report.run.picks.len(), 5);
    assert_eq!(report.advice.len(), 5);
    for a in &report.advice {
        assert!((0.0..=100.0).contains(&a.match_score));
        assert_eq!(a.match_level, MatchLevel::from_score(a.match_score));
        assert!(!a.risk_tips.is_empty());
    }

    // AND the artifacts land in a strategy-stamped directory
    let dir = tempfile::tempdir().unwrap();
    let run_dir = export::save_artifacts(&report, dir.path()).unwrap();
    let md = std::fs::read_to_string(run_dir.join("report.md")).unwrap();
    assert!(md.contains("| Preference | energy |"));
    let csv = std::fs::read_to_string(run_dir.join("picks.csv")).unwrap();
    assert_eq!(csv.lines().count(), 6);
}

#[test]
fn bdd_scenario_same_seed_same_selection() {
    // GIVEN the default config
    let config = CompassConfig::default();
    let runner = StrategyRunner::new(&config);
    let ctx = ScoringContext::default();

    // WHEN the same request runs twice with the same seed
    let run = |seed: u64| {
        let pool = candidate_source(&config.data, seed).unwrap().fetch_pool();
        runner
            .run(StrategyKind::Compass, &pool, &ctx, 10, RngHierarchy::new(seed))
            .unwrap()
    };
    let a = run(42);
    let b = run(42);

    // THEN picks, forecasts and fingerprints match
    assert_eq!(a, b);

    // AND a different seed changes the fingerprint
    assert_ne!(a.fingerprint, run(43).fingerprint);
}

#[test]
fn bdd_scenario_ai_threshold_tightens_when_conservative_in_downtrend() {
    // GIVEN the default pool and predictor
    let config = CompassConfig::default();
    let pool = candidate_source(&config.data, 42).unwrap().fetch_pool();
    let runner = StrategyRunner::new(&config);

    // WHEN the AI strategy runs in two contexts
    let loose = runner
        .run(StrategyKind::Ai, &pool, &ScoringContext::parse("flat", "balanced", "all"), 100, RngHierarchy::new(42))
        .unwrap();
    let strict = runner
        .run(StrategyKind::Ai, &pool, &ScoringContext::parse("down", "conservative", "all"), 100, RngHierarchy::new(42))
        .unwrap();

    // THEN each pick clears its threshold strictly
    assert_eq!(loose.threshold, Some(0.65));
    assert_eq!(strict.threshold, Some(0.8));
    for (run, t) in [(&loose, 0.65), (&strict, 0.8)] {
        for p in &run.picks {
            assert!(p.forecast.up_probability.unwrap() > t);
        }
    }
}

#[test]
fn bdd_scenario_backtest_is_deterministic() {
    // GIVEN a backtester configured for 8 iterations
    let config = config("[backtest]\niterations = 8\n");
    let make = || Backtester::new(StrategyRunner::new(&config), config.backtest.clone());
    let data = config.data.clone();
    let pool_for = move |h: RngHierarchy| {
        candidate_source(&data, h.master_seed())
            .map(|s| s.fetch_pool())
            .unwrap_or_default()
    };

    // WHEN it runs in parallel and sequentially with the same seed
    let ctx = ScoringContext::parse("up", "balanced", "all");
    let par = make()
        .run(StrategyKind::Compass, &ctx, 10, RngHierarchy::new(3), &pool_for)
        .unwrap();
    let seq = make()
        .with_parallelism(false)
        .run(StrategyKind::Compass, &ctx, 10, RngHierarchy::new(3), &pool_for)
        .unwrap();

    // THEN the summaries are identical and every iteration is reported
    assert_eq!(par, seq);
    assert_eq!(par.iterations, 8);
    assert_eq!(par.runs.len(), 8);
    assert!((0.0..=1.0).contains(&par.avg_win_rate));

    // AND the summary serializes for export
    let json = export::export_backtest_json(&par).unwrap();
    assert!(json.contains("\"avg_total_return\""));
}

#[test]
fn bdd_scenario_backtest_iteration_count_from_section() {
    // GIVEN a backtest section with a single iteration
    let section = BacktestSection {
        iterations: 1,
        ..BacktestSection::default()
    };
    let runner = StrategyRunner::new(&CompassConfig::default());

    // WHEN run on an empty pool
    let summary = Backtester::new(runner, section)
        .run(StrategyKind::Ai, &ScoringContext::default(), 10, RngHierarchy::new(1), |_| Vec::new())
        .unwrap();

    // THEN no iteration counts as non-empty
    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.non_empty_runs, 0);
}

#[test]
fn bdd_scenario_performance_series_over_a_quarter() {
    // GIVEN a performance window of Q1 2024
    let section = PerformanceSection {
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        ..PerformanceSection::default()
    };

    // WHEN the series is generated
    let series = performance::generate(&section, RngHierarchy::new(42));

    // THEN it has one point per business day, starting at zero
    assert_eq!(series.points.len(), 65);
    assert_eq!(series.points[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(series.points[0].strategy_return, 0.0);

    // AND the CSV export carries every point
    let csv = export::export_performance_csv(&series).unwrap();
    assert_eq!(csv.lines().count(), 66);
}
