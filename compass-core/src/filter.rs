//! Preference filter with backfill.
//!
//! Keeps the candidates whose category matches the requested preference. When
//! fewer than `min_pool` match, the shortfall is backfilled from the rest of
//! the pool in ranking order. The filter never fails and never yields the same
//! identifier twice.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Preference;
use crate::select::{sort_ranked, Selectable};

/// Default minimum size of a filtered pool.
pub const DEFAULT_MIN_POOL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceFilter {
    pub min_pool: usize,
}

impl Default for PreferenceFilter {
    fn default() -> Self {
        Self {
            min_pool: DEFAULT_MIN_POOL,
        }
    }
}

impl PreferenceFilter {
    pub fn new(min_pool: usize) -> Self {
        Self { min_pool }
    }

    /// Filter `pool` by `preference`, backfilling by `key` (descending,
    /// identifier ascending on ties).
    pub fn apply_by<T, F>(&self, pool: Vec<T>, preference: &Preference, key: F) -> Vec<T>
    where
        T: Selectable,
        F: Fn(&T) -> f64,
    {
        let wanted = match preference {
            Preference::All => return pool,
            Preference::Category(c) => c.as_str(),
        };

        let (mut matching, mut other): (Vec<T>, Vec<T>) =
            pool.into_iter().partition(|c| c.category() == wanted);

        if matching.len() >= self.min_pool {
            return matching;
        }

        let shortfall = self.min_pool - matching.len();
        let mut seen: HashSet<String> = matching.iter().map(|c| c.id().to_string()).collect();

        sort_ranked(&mut other, key);
        let matched = matching.len();
        for candidate in other {
            if matching.len() - matched == shortfall {
                break;
            }
            if seen.insert(candidate.id().to_string()) {
                matching.push(candidate);
            }
        }

        debug!(
            preference = wanted,
            matched,
            backfilled = matching.len() - matched,
            min_pool = self.min_pool,
            "preference filter backfilled"
        );
        matching
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::test_support::{item, Item};

    fn energy() -> Preference {
        Preference::Category("energy".into())
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    fn mixed_pool() -> Vec<Item> {
        vec![
            item("E1", "energy", 10.0),
            item("F1", "finance", 90.0),
            item("E2", "energy", 20.0),
            item("F2", "finance", 80.0),
            item("C1", "consumer", 85.0),
            item("E3", "energy", 30.0),
            item("C2", "consumer", 80.0),
        ]
    }

    #[test]
    fn wildcard_returns_pool_unchanged() {
        let pool = mixed_pool();
        let out = PreferenceFilter::new(3).apply_by(pool.clone(), &Preference::All, |i| i.score);
        assert_eq!(out, pool);
    }

    #[test]
    fn enough_matches_returned_unmodified() {
        let out = PreferenceFilter::new(3).apply_by(mixed_pool(), &energy(), |i| i.score);
        assert_eq!(ids(&out), vec!["E1", "E2", "E3"]);
    }

    #[test]
    fn shortfall_backfilled_by_key_with_id_tiebreak() {
        let out = PreferenceFilter::new(5).apply_by(mixed_pool(), &energy(), |i| i.score);
        // two slots: F1 (90), C1 (85)
        assert_eq!(ids(&out), vec!["E1", "E2", "E3", "F1", "C1"]);

        // F2 and C2 tie at 80; C2 sorts first
        let out = PreferenceFilter::new(6).apply_by(mixed_pool(), &energy(), |i| i.score);
        assert_eq!(ids(&out), vec!["E1", "E2", "E3", "F1", "C1", "C2"]);
    }

    #[test]
    fn short_other_returns_what_exists() {
        let out = PreferenceFilter::new(50).apply_by(mixed_pool(), &energy(), |i| i.score);
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn no_matches_backfills_entirely() {
        let pool = mixed_pool();
        let pref = Preference::Category("telecom".into());
        let out = PreferenceFilter::new(2).apply_by(pool, &pref, |i| i.score);
        assert_eq!(ids(&out), vec!["F1", "C1"]);
    }

    #[test]
    fn backfill_skips_duplicate_identifiers() {
        let pool = vec![
            item("E1", "energy", 10.0),
            item("E1", "finance", 99.0),
            item("X", "finance", 50.0),
            item("X", "consumer", 50.0),
            item("Y", "consumer", 40.0),
        ];
        let out = PreferenceFilter::new(4).apply_by(pool, &energy(), |i| i.score);
        assert_eq!(ids(&out), vec!["E1", "X", "Y"]);
    }

    #[test]
    fn category_match_is_exact() {
        let pool = vec![item("A", "Energy", 1.0), item("B", "energy", 2.0)];
        let out = PreferenceFilter::new(1).apply_by(pool, &energy(), |i| i.score);
        assert_eq!(ids(&out), vec!["B"]);
    }
}
