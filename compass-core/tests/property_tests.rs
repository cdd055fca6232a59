//! Property tests for selection invariants.
//!
//! Uses proptest to verify:
//! 1. Composite weights — sum to 1 for every context
//! 2. Convexity — composite lies within [min, max] of the dimension scores
//! 3. Top-K — returns min(K, len) candidates in ranking order
//! 4. Preference filter — no duplicates; enough matches come back unmodified
//! 5. Idempotence — same pool + context + fixed residual → same result

use std::collections::HashSet;

use compass_core::domain::{keys, RawFeatures};
use compass_core::select::rank_order;
use compass_core::{
    Candidate, CompositeIndexer, FixedResidual, PipelineConfig, Preference, PreferenceFilter,
    RiskAppetite, SelectionPipeline, Selectable, ScoringContext, TopKSelector, Trend,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

const CATEGORIES: [&str; 4] = ["energy", "finance", "consumer", "metals"];

fn arb_trend() -> impl Strategy<Value = Trend> {
    prop::sample::select(Trend::ALL.to_vec())
}

fn arb_risk() -> impl Strategy<Value = RiskAppetite> {
    prop::sample::select(RiskAppetite::ALL.to_vec())
}

fn arb_preference() -> impl Strategy<Value = Preference> {
    prop_oneof![
        Just(Preference::All),
        prop::sample::select(CATEGORIES.to_vec()).prop_map(|c| Preference::Category(c.into())),
    ]
}

fn arb_context() -> impl Strategy<Value = ScoringContext> {
    (arb_trend(), arb_risk(), arb_preference())
        .prop_map(|(t, r, p)| ScoringContext::new(t, r, p))
}

/// Features with occasional gaps, so defaults are exercised too.
fn arb_features() -> impl Strategy<Value = RawFeatures> {
    (
        prop::option::of(-15.0..15.0_f64),
        prop::option::of(0.0..80.0_f64),
        prop::option::of(0.0..30.0_f64),
        prop::option::of(-40.0..80.0_f64),
        prop::option::of(-50.0..100.0_f64),
        prop::option::of(prop::sample::select(vec!["buy", "accumulate", "hold", "reduce", "sell", "??"])),
    )
        .prop_map(|(chg, pe, roe, growth, vol, rating)| {
            let mut f = RawFeatures::new();
            if let Some(v) = chg {
                f.insert(keys::PCT_CHANGE, v);
            }
            if let Some(v) = pe {
                f.insert(keys::PE, v);
            }
            if let Some(v) = roe {
                f.insert(keys::ROE, v);
            }
            if let Some(v) = growth {
                f.insert(keys::PROFIT_GROWTH, v);
            }
            if let Some(v) = vol {
                f.insert(keys::VOLUME_CHANGE, v);
            }
            if let Some(r) = rating {
                f.insert(keys::RATING, r);
            }
            f
        })
}

/// Pool of candidates with unique ids `C000…`.
fn arb_pool(max: usize) -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec((prop::sample::select(CATEGORIES.to_vec()), arb_features()), 0..max).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (cat, f))| {
                    Candidate::new(format!("C{i:03}"), format!("Name {i}"), cat).with_features(f)
                })
                .collect()
        },
    )
}

#[derive(Debug, Clone)]
struct Item {
    id: String,
    category: String,
    score: f64,
}

impl Selectable for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        &self.category
    }
}

/// Items whose ids may repeat and whose scores tie often.
fn arb_items() -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec(
        (0..30u32, prop::sample::select(CATEGORIES.to_vec()), 0..10u32),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(id, cat, score)| Item {
                id: format!("I{id:02}"),
                category: cat.to_string(),
                score: score as f64,
            })
            .collect()
    })
}

// ── 1–2. Composite ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn weights_sum_to_one(ctx in arb_context()) {
        let w = CompositeIndexer.weights(&ctx);
        prop_assert!((w.sum() - 1.0).abs() < 1e-12);
        prop_assert!(w.sky > 0.0 && w.earth > 0.0 && w.human > 0.0);
    }

    #[test]
    fn composite_is_convex(ctx in arb_context(), pool in arb_pool(30)) {
        let pipeline = SelectionPipeline::default();
        let scored = pipeline
            .score_pool(&pool, &ctx, &FixedResidual(75.0), &Default::default())
            .unwrap();
        for c in &scored {
            prop_assert!(c.composite >= c.dimensions.min() - 1e-9);
            prop_assert!(c.composite <= c.dimensions.max() + 1e-9);
        }
    }
}

// ── 3. Top-K ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn top_k_length_and_order(items in arb_items(), k in 0usize..50) {
        let n = items.len();
        let out = TopKSelector.select_by(items, k, |i| i.score);
        prop_assert_eq!(out.len(), k.min(n));
        for pair in out.windows(2) {
            prop_assert_ne!(
                rank_order(&pair[0], &pair[1], &|i: &Item| i.score),
                std::cmp::Ordering::Greater
            );
        }
    }
}

// ── 4. Preference filter ─────────────────────────────────────────────

proptest! {
    #[test]
    fn filter_never_adds_duplicates(
        items in arb_items(),
        cat in prop::sample::select(CATEGORIES.to_vec()),
        m in 0usize..20,
    ) {
        let matching_ids: Vec<String> = items
            .iter()
            .filter(|i| i.category == cat)
            .map(|i| i.id.clone())
            .collect();
        let out = PreferenceFilter::new(m)
            .apply_by(items, &Preference::Category(cat.into()), |i| i.score);

        // Duplicates can only come from the matching set itself.
        let backfilled = &out[matching_ids.len().min(out.len())..];
        let mut seen: HashSet<&str> = matching_ids.iter().map(|s| s.as_str()).collect();
        for item in backfilled {
            prop_assert!(seen.insert(item.id.as_str()), "duplicate {}", item.id);
        }
    }

    #[test]
    fn enough_matches_returned_unmodified(
        items in arb_items(),
        cat in prop::sample::select(CATEGORIES.to_vec()),
        m in 0usize..5,
    ) {
        let matching: Vec<String> = items
            .iter()
            .filter(|i| i.category == cat)
            .map(|i| i.id.clone())
            .collect();
        prop_assume!(matching.len() >= m);
        let out = PreferenceFilter::new(m)
            .apply_by(items, &Preference::Category(cat.into()), |i| i.score);
        let ids: Vec<String> = out.into_iter().map(|i| i.id).collect();
        prop_assert_eq!(ids, matching);
    }
}

// ── 5. Pipeline ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn pipeline_is_idempotent(ctx in arb_context(), pool in arb_pool(40), k in 0usize..15) {
        let pipeline = SelectionPipeline::new(PipelineConfig { min_pool: 5, ..Default::default() });
        let a = pipeline.select(&pool, &ctx, k, &FixedResidual(80.0)).unwrap();
        let b = pipeline.select(&pool, &ctx, k, &FixedResidual(80.0)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn result_length_is_min_of_k_and_eligible(ctx in arb_context(), pool in arb_pool(40), k in 0usize..15) {
        let pipeline = SelectionPipeline::new(PipelineConfig { min_pool: 5, ..Default::default() });
        let r = pipeline.select(&pool, &ctx, k, &FixedResidual(80.0)).unwrap();
        prop_assert_eq!(r.len(), k.min(r.eligible_size));
        let unique: HashSet<&str> = r.ids().into_iter().collect();
        prop_assert_eq!(unique.len(), r.len());
        for pair in r.picks.windows(2) {
            prop_assert!(pair[0].composite >= pair[1].composite);
        }
    }
}
