//! Universe configuration — sector-organized candidate id lists.
//!
//! The universe is stored as a TOML file mapping each sector to its member
//! ids. When supplied, it pins which ids the synthetic source generates and
//! which sector each belongs to.
//!
//! ```toml
//! [sectors]
//! energy = ["STK001", "STK002"]
//! finance = ["STK003"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::provider::DataError;

/// Sector names used by the synthetic market.
pub const SECTORS: [&str; 6] = ["finance", "consumer", "energy", "telecom", "real_estate", "metals"];

/// The complete universe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Universe(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content).map_err(|e| DataError::Universe(format!("parse TOML: {e}")))
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, DataError> {
        toml::to_string_pretty(self).map_err(|e| DataError::Universe(format!("serialize: {e}")))
    }

    /// `(id, sector)` pairs, sorted by id. An id listed under several
    /// sectors keeps the first sector in name order.
    pub fn members(&self) -> Vec<(&str, &str)> {
        let mut by_id: BTreeMap<&str, &str> = BTreeMap::new();
        for (sector, ids) in &self.sectors {
            for id in ids {
                by_id.entry(id.as_str()).or_insert(sector.as_str());
            }
        }
        by_id.into_iter().collect()
    }

    /// Ids for a specific sector.
    pub fn sector_ids(&self, sector: &str) -> Option<&[String]> {
        self.sectors.get(sector).map(|v| v.as_slice())
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.keys().map(|s| s.as_str()).collect()
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.values().all(|v| v.is_empty())
    }

    /// `count` ids `STK001…` assigned to [`SECTORS`] round-robin.
    pub fn synthetic(count: usize) -> Self {
        let mut sectors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for i in 0..count {
            sectors
                .entry(SECTORS[i % SECTORS.len()].to_string())
                .or_default()
                .push(synthetic_id(i));
        }
        Self { sectors }
    }
}

/// Id of the `index`-th synthetic candidate (`STK001` for index 0).
pub fn synthetic_id(index: usize) -> String {
    format!("STK{:03}", index + 1)
}
