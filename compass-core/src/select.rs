//! Top-K selection with a deterministic tie-break.
//!
//! Ordering is always "key descending, identifier ascending" so that equal
//! scores never depend on input order.

use std::cmp::Ordering;

use crate::domain::ScoredCandidate;

/// Anything that can flow through the filter and selector stages.
pub trait Selectable {
    fn id(&self) -> &str;
    fn category(&self) -> &str;
}

impl Selectable for ScoredCandidate {
    fn id(&self) -> &str {
        &self.candidate.id
    }

    fn category(&self) -> &str {
        &self.candidate.category
    }
}

/// Ranking order shared by the filter backfill and the selector.
pub fn rank_order<T, F>(a: &T, b: &T, key: &F) -> Ordering
where
    T: Selectable,
    F: Fn(&T) -> f64,
{
    key(b).total_cmp(&key(a)).then_with(|| a.id().cmp(b.id()))
}

/// Sort a pool in ranking order, in place.
pub fn sort_ranked<T, F>(pool: &mut [T], key: F)
where
    T: Selectable,
    F: Fn(&T) -> f64,
{
    pool.sort_by(|a, b| rank_order(a, b, &key));
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TopKSelector;

impl TopKSelector {
    /// Top `k` of `pool` by `key`. `k` larger than the pool returns the whole
    /// pool, sorted.
    pub fn select_by<T, F>(&self, mut pool: Vec<T>, k: usize, key: F) -> Vec<T>
    where
        T: Selectable,
        F: Fn(&T) -> f64,
    {
        sort_ranked(&mut pool, key);
        pool.truncate(k);
        pool
    }

    /// Top `k` by composite score.
    pub fn select(&self, pool: Vec<ScoredCandidate>, k: usize) -> Vec<ScoredCandidate> {
        self.select_by(pool, k, |c| c.composite)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{item, Item};
    use super::*;

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn returns_top_k_descending() {
        let pool = vec![
            item("A", "x", 10.0),
            item("B", "x", 30.0),
            item("C", "x", 20.0),
            item("D", "x", 40.0),
        ];
        let out = TopKSelector.select_by(pool, 2, |i| i.score);
        assert_eq!(ids(&out), vec!["D", "B"]);
    }

    #[test]
    fn ties_broken_by_identifier_ascending() {
        let pool = vec![
            item("C", "x", 50.0),
            item("A", "x", 50.0),
            item("B", "x", 50.0),
            item("Z", "x", 60.0),
        ];
        let out = TopKSelector.select_by(pool, 3, |i| i.score);
        assert_eq!(ids(&out), vec!["Z", "A", "B"]);
    }

    #[test]
    fn k_larger_than_pool_returns_whole_pool() {
        let pool = vec![item("A", "x", 1.0), item("B", "x", 2.0)];
        let out = TopKSelector.select_by(pool, 10, |i| i.score);
        assert_eq!(ids(&out), vec!["B", "A"]);
    }

    #[test]
    fn empty_pool_returns_empty() {
        let out = TopKSelector.select_by(Vec::<Item>::new(), 5, |i| i.score);
        assert!(out.is_empty());
    }

    #[test]
    fn k_zero_returns_empty() {
        let pool = vec![item("A", "x", 1.0)];
        assert!(TopKSelector.select_by(pool, 0, |i| i.score).is_empty());
    }

    #[test]
    fn order_does_not_depend_on_input_order() {
        let forward = vec![
            item("A", "x", 5.0),
            item("B", "x", 5.0),
            item("C", "x", 7.0),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(
            TopKSelector.select_by(forward, 3, |i| i.score),
            TopKSelector.select_by(reversed, 3, |i| i.score)
        );
    }
}
