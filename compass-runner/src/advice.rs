//! Per-pick advice: how well a pick matches the request, and risk tips.

use serde::{Deserialize, Serialize};

use compass_core::{RiskAppetite, ScoringContext, Trend};

use crate::strategy::Pick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLevel {
    High,
    Medium,
    Low,
}

impl MatchLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::High
        } else if score >= 60.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub match_score: f64,
    pub match_level: MatchLevel,
    pub risk_tips: Vec<String>,
}

/// Match score in [0, 100], starting from 100.
pub fn match_score(pick: &Pick, ctx: &ScoringContext) -> f64 {
    let d = pick.scored.dimensions;
    let change = pick.forecast.expected_change;
    let mut score: f64 = 100.0;

    if d.sky > 80.0 {
        score += 10.0;
    } else if d.sky < 60.0 {
        score -= 10.0;
    }

    if change > 5.0 {
        score += 10.0;
    } else if change < 3.0 {
        score -= 10.0;
    }

    if ctx.risk == RiskAppetite::Balanced && d.earth > 60.0 && d.earth < 80.0 {
        score += 5.0;
    }
    if ctx.trend == Trend::Flat && d.human > 70.0 && d.human < 90.0 {
        score += 5.0;
    }

    score.clamp(0.0, 100.0)
}

pub fn risk_tips(pick: &Pick) -> Vec<String> {
    let mut tips = Vec::new();
    if pick.forecast.expected_change > 10.0 {
        tips.push("large expected gain; watch for a pullback".to_string());
    }
    if pick.scored.dimensions.sky < 60.0 {
        tips.push("weak market score; elevated risk".to_string());
    }
    if tips.is_empty() {
        tips.push("size the position prudently".to_string());
    }
    tips
}

pub fn advise(pick: &Pick, ctx: &ScoringContext) -> Advice {
    let score = match_score(pick, ctx);
    Advice {
        match_score: score,
        match_level: MatchLevel::from_score(score),
        risk_tips: risk_tips(pick),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Forecast;
    use compass_core::{Candidate, DimensionScores, Preference, ScoredCandidate};

    fn pick(sky: f64, earth: f64, human: f64, change: f64) -> Pick {
        Pick {
            scored: ScoredCandidate {
                candidate: Candidate::new("A", "Alpha", "energy"),
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

    fn ctx(trend: Trend, risk: RiskAppetite) -> ScoringContext {
        ScoringContext::new(trend, risk, Preference::All)
    }

    #[test]
    fn strong_pick_is_capped_at_100() {
        let p = pick(85.0, 70.0, 80.0, 6.0);
        assert_eq!(match_score(&p, &ctx(Trend::Flat, RiskAppetite::Balanced)), 100.0);
    }

    #[test]
    fn weak_pick_loses_twenty() {
        let p = pick(55.0, 40.0, 40.0, 1.0);
        let s = match_score(&p, &ctx(Trend::Up, RiskAppetite::Aggressive));
        assert_eq!(s, 80.0);
        assert_eq!(MatchLevel::from_score(s), MatchLevel::High);
    }

    #[test]
    fn neutral_band_is_unchanged() {
        // sky in [60, 80], change in [3, 5]
        let p = pick(70.0, 50.0, 50.0, 4.0);
        assert_eq!(match_score(&p, &ctx(Trend::Down, RiskAppetite::Conservative)), 100.0);
    }

    #[test]
    fn levels() {
        assert_eq!(MatchLevel::from_score(80.0), MatchLevel::High);
        assert_eq!(MatchLevel::from_score(79.9), MatchLevel::Medium);
        assert_eq!(MatchLevel::from_score(60.0), MatchLevel::Medium);
        assert_eq!(MatchLevel::from_score(59.9), MatchLevel::Low);
    }

    #[test]
    fn risk_tips_rules() {
        assert_eq!(risk_tips(&pick(50.0, 0.0, 0.0, 12.0)).len(), 2);
        assert_eq!(
            risk_tips(&pick(70.0, 0.0, 0.0, 4.0)),
            vec!["size the position prudently".to_string()]
        );
        let tips = risk_tips(&pick(70.0, 0.0, 0.0, 11.0));
        assert_eq!(tips.len(), 1);
        assert!(tips[0].contains("pullback"));
    }

    #[test]
    fn advise_combines_score_and_tips() {
        let a = advise(&pick(55.0, 40.0, 40.0, 1.0), &ctx(Trend::Up, RiskAppetite::Balanced));
        assert_eq!(a.match_score, 80.0);
        assert_eq!(a.match_level, MatchLevel::High);
        assert_eq!(a.risk_tips.len(), 1);
    }
}
