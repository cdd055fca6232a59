use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// An unrecognized context value (InvalidContext). Always recovered by
/// falling back to the field's default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {field} '{value}'")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

/// Market trend regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    #[default]
    Flat,
    Down,
}

impl Trend {
    pub const ALL: [Trend; 3] = [Trend::Up, Trend::Flat, Trend::Down];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Flat => "flat",
            Self::Down => "down",
        }
    }
}

impl FromStr for Trend {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "bull" | "uptrend" | "上涨趋势" | "牛市" => Ok(Self::Up),
            "flat" | "sideways" | "range" | "震荡整理" | "震荡市" => Ok(Self::Flat),
            "down" | "bear" | "downtrend" | "下跌趋势" | "熊市" => Ok(Self::Down),
            _ => Err(UnknownValue {
                field: "trend",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk appetite of the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskAppetite {
    Aggressive,
    #[default]
    Balanced,
    Conservative,
}

impl RiskAppetite {
    pub const ALL: [RiskAppetite; 3] = [
        RiskAppetite::Aggressive,
        RiskAppetite::Balanced,
        RiskAppetite::Conservative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Balanced => "balanced",
            Self::Conservative => "conservative",
        }
    }
}

impl FromStr for RiskAppetite {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggressive" | "high" | "激进型" | "高风险" => Ok(Self::Aggressive),
            "balanced" | "medium" | "moderate" | "平衡型" | "中风险" => Ok(Self::Balanced),
            "conservative" | "low" | "稳健型" | "保守型" | "低风险" => Ok(Self::Conservative),
            _ => Err(UnknownValue {
                field: "risk",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RiskAppetite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wildcard spellings that mean "no category preference".
const WILDCARDS: [&str; 4] = ["all", "*", "全行业", "全部"];

/// Categorical preference filter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Preference {
    #[default]
    All,
    Category(String),
}

impl Preference {
    /// Build a preference from free text. Blank input and the wildcard
    /// spellings map to [`Preference::All`].
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || WILDCARDS.iter().any(|w| w.eq_ignore_ascii_case(trimmed)) {
            Self::All
        } else {
            Self::Category(trimmed.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Re-parse a category so that wildcard or padded values collapse to
    /// their canonical form.
    pub fn normalized(&self) -> Self {
        match self {
            Self::All => Self::All,
            Self::Category(c) => Self::parse(c),
        }
    }
}

impl From<String> for Preference {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Preference> for String {
    fn from(p: Preference) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Category(c) => f.write_str(c),
        }
    }
}

/// Per-request scoring parameters, supplied by the caller and never mutated
/// by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScoringContext {
    pub trend: Trend,
    pub risk: RiskAppetite,
    pub preference: Preference,
}

impl ScoringContext {
    pub fn new(trend: Trend, risk: RiskAppetite, preference: Preference) -> Self {
        Self {
            trend,
            risk,
            preference,
        }
    }

    /// Build a context from raw strings. Unrecognized trend or risk values
    /// fall back to `flat` / `balanced` and are logged.
    pub fn parse(trend: &str, risk: &str, preference: &str) -> Self {
        Self {
            trend: parse_or_default(trend),
            risk: parse_or_default(risk),
            preference: Preference::parse(preference),
        }
    }

    /// Canonical copy of this context.
    pub fn normalized(&self) -> Self {
        Self {
            trend: self.trend,
            risk: self.risk,
            preference: self.preference.normalized(),
        }
    }
}

fn parse_or_default<T>(raw: &str) -> T
where
    T: FromStr<Err = UnknownValue> + Default + fmt::Display,
{
    match raw.parse::<T>() {
        Ok(v) => v,
        Err(e) => {
            let fallback = T::default();
            warn!(error = %e, fallback = %fallback, "invalid scoring context value, using default");
            fallback
        }
    }
}
