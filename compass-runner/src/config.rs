//! Compass configuration file.
//!
//! Loaded once at start-up from TOML and passed by value into the pipeline,
//! strategies and backtester. Every field has a default, so a partial file (or
//! no file) is valid.
//!
//! ```toml
//! [selection]
//! top_k = 10
//! min_pool = 10
//! seed = 42
//!
//! [scoring.policy_support]
//! energy = 85.0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use compass_core::scoring::ScoringConfig;
use compass_core::PipelineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "compass.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSection {
    pub top_k: usize,
    /// Minimum preference-filtered pool size (`M`).
    pub min_pool: usize,
    pub seed: u64,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_pool: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub pool_size: usize,
    pub timeout_ms: u64,
    pub breaker_threshold: u32,
    pub breaker_cooldown_secs: u64,
    /// Optional universe TOML pinning ids and sectors.
    pub universe: Option<PathBuf>,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            pool_size: 100,
            timeout_ms: 5_000,
            breaker_threshold: 3,
            breaker_cooldown_secs: 30 * 60,
            universe: None,
        }
    }
}

impl DataSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }
}

/// Up-probability thresholds of the AI strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub up_aggressive_threshold: f64,
    pub down_conservative_threshold: f64,
    pub default_threshold: f64,
    pub predictor_timeout_ms: u64,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            up_aggressive_threshold: 0.7,
            down_conservative_threshold: 0.8,
            default_threshold: 0.65,
            predictor_timeout_ms: 5_000,
        }
    }
}

impl StrategySection {
    pub fn predictor_timeout(&self) -> Duration {
        Duration::from_millis(self.predictor_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub iterations: usize,
    /// Trading days in each simulated holding path.
    pub horizon_days: usize,
    /// Half-width of the uniform daily noise around the expected drift.
    pub daily_noise: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            iterations: 10,
            horizon_days: 20,
            daily_noise: 0.02,
        }
    }
}

/// Daily increments of the cumulative-return series, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSection {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub strategy_drift: DriftRange,
    pub index_drift: DriftRange,
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            strategy_drift: DriftRange { min: -0.5, max: 1.0 },
            index_drift: DriftRange { min: -0.5, max: 0.8 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Plain-text log file; `None` logs to stderr only.
    pub file: Option<PathBuf>,
    /// Rotate the file at start-up once it exceeds this size.
    pub max_size_mb: u64,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: Some(PathBuf::from("compass.log")),
            max_size_mb: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassConfig {
    pub selection: SelectionSection,
    pub data: DataSection,
    pub scoring: ScoringConfig,
    pub strategy: StrategySection,
    pub backtest: BacktestSection,
    pub performance: PerformanceSection,
    pub logging: LoggingSection,
}

impl CompassConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load `path`, falling back to defaults if it does not exist. The flag
    /// is whether the file was found; reporting a missing file is left to the
    /// caller. A file that exists but is malformed is still an error.
    pub fn load_or_default(path: &Path) -> Result<(Self, bool), ConfigError> {
        if path.exists() {
            Ok((Self::from_file(path)?, true))
        } else {
            Ok((Self::default(), false))
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            min_pool: self.selection.min_pool,
            scoring: self.scoring.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.strategy;
        for (name, v) in [
            ("strategy.up_aggressive_threshold", s.up_aggressive_threshold),
            ("strategy.down_conservative_threshold", s.down_conservative_threshold),
            ("strategy.default_threshold", s.default_threshold),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {v}")));
            }
        }
        let default_support = self.scoring.default_policy_support;
        if !(0.0..=100.0).contains(&default_support) {
            return Err(ConfigError::Invalid(format!(
                "scoring.default_policy_support must be in [0, 100], got {default_support}"
            )));
        }
        for (category, v) in &self.scoring.policy_support {
            if !(0.0..=100.0).contains(v) {
                return Err(ConfigError::Invalid(format!(
                    "scoring.policy_support.{category} must be in [0, 100], got {v}"
                )));
            }
        }
        if self.performance.end < self.performance.start {
            return Err(ConfigError::Invalid(format!(
                "performance.end {} is before performance.start {}",
                self.performance.end, self.performance.start
            )));
        }
        for (name, d) in [
            ("performance.strategy_drift", self.performance.strategy_drift),
            ("performance.index_drift", self.performance.index_drift),
        ] {
            // also rejects nan and ranges whose width overflows
            if !(d.min < d.max && (d.max - d.min).is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "{name}: min and max must be finite with min below max, got {}..{}",
                    d.min, d.max
                )));
            }
        }
        let noise = self.backtest.daily_noise;
        if !(0.0..=1.0).contains(&noise) {
            return Err(ConfigError::Invalid(format!(
                "backtest.daily_noise must be in [0, 1], got {noise}"
            )));
        }
        Ok(())
    }
}
