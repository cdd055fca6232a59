use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known raw feature keys consumed by the score calculator.
pub mod keys {
    /// Latest price (informational only).
    pub const PRICE: &str = "price";
    /// Recent percentage price change.
    pub const PCT_CHANGE: &str = "pct_change";
    /// Valuation ratio (price / earnings).
    pub const PE: &str = "pe";
    /// Profitability ratio (return on equity, %).
    pub const ROE: &str = "roe";
    /// Net profit growth rate (%).
    pub const PROFIT_GROWTH: &str = "profit_growth";
    /// Percentage change in traded volume.
    pub const VOLUME_CHANGE: &str = "volume_change";
    /// Qualitative analyst rating label.
    pub const RATING: &str = "rating";
}

/// A single raw feature: either numeric or a categorical label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Label(String),
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        Self::Label(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        Self::Label(v)
    }
}

/// Named raw features of a candidate.
///
/// Lookups never fail: a missing key, a value of the wrong kind, or a
/// non-finite number all read as `None` and are handled by the caller's
/// documented default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFeatures(BTreeMap<String, FeatureValue>);

impl RawFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<FeatureValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<FeatureValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Finite numeric value for `key`, if any.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(FeatureValue::Number(v)) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Label value for `key`, if any.
    pub fn label(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(FeatureValue::Label(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
