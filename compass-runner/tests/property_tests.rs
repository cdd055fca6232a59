//! Property tests for advice and metrics.

use compass_core::{
    Candidate, DimensionScores, Preference, RiskAppetite, ScoredCandidate, ScoringContext, Trend,
};
use compass_runner::advice::{match_score, risk_tips};
use compass_runner::metrics::{max_drawdown, total_return, win_rate};
use compass_runner::{Forecast, MatchLevel, Pick};
use proptest::prelude::*;

fn pick(sky: f64, earth: f64, human: f64, change: f64) -> Pick {
    Pick {
        scored: ScoredCandidate {
            candidate: Candidate::new("P", "Prop", "energy"),
            dimensions: DimensionScores { sky, earth, human },
            composite: 0.0,
            defaulted: Vec::new(),
        },
        forecast: Forecast {
            expected_change: change,
            up_probability: None,
        },
    }
}

fn trend() -> impl Strategy<Value = Trend> {
    prop_oneof![Just(Trend::Up), Just(Trend::Flat), Just(Trend::Down)]
}

fn risk() -> impl Strategy<Value = RiskAppetite> {
    prop_oneof![
        Just(RiskAppetite::Aggressive),
        Just(RiskAppetite::Balanced),
        Just(RiskAppetite::Conservative)
    ]
}

proptest! {
    #[test]
    fn match_score_is_bounded(
        sky in 0.0..100.0f64,
        earth in 0.0..100.0f64,
        human in 0.0..100.0f64,
        change in -5.0..10.0f64,
        t in trend(),
        r in risk(),
    ) {
        let ctx = ScoringContext::new(t, r, Preference::All);
        let s = match_score(&pick(sky, earth, human, change), &ctx);
        prop_assert!((0.0..=100.0).contains(&s));
        // at most two 10-point deductions
        prop_assert!(s >= 80.0);
        prop_assert_ne!(MatchLevel::from_score(s), MatchLevel::Low);
    }

    #[test]
    fn risk_tips_never_empty(sky in 0.0..100.0f64, change in -5.0..15.0f64) {
        let tips = risk_tips(&pick(sky, 50.0, 50.0, change));
        prop_assert!(!tips.is_empty() && tips.len() <= 2);
    }

    #[test]
    fn drawdown_is_non_positive(curve in prop::collection::vec(1.0..200.0f64, 0..60)) {
        let dd = max_drawdown(&curve);
        prop_assert!(dd <= 0.0 && dd > -1.0);
    }

    #[test]
    fn drawdown_bounds_total_loss(curve in prop::collection::vec(1.0..200.0f64, 2..60)) {
        let tr = total_return(&curve);
        if tr < 0.0 {
            prop_assert!(max_drawdown(&curve) <= tr + 1e-12);
        }
    }

    #[test]
    fn win_rate_is_a_fraction(values in prop::collection::vec(-10.0..10.0f64, 0..50)) {
        let w = win_rate(&values);
        prop_assert!((0.0..=1.0).contains(&w));
    }
}
