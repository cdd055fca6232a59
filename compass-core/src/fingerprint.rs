//! Request fingerprinting — deterministic identification of a selection request.
//!
//! Two requests with the same pool, context, K, minimum pool size and residual
//! source produce the same fingerprint. Used for idempotence checks and to
//! correlate log lines with exported artifacts.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use crate::domain::{Candidate, ScoringContext};

/// BLAKE3 hex digest of a canonical request description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestFingerprint(pub String);

impl RequestFingerprint {
    /// Fingerprint a request.
    ///
    /// Candidate ids are sorted first, so pool order does not matter. Features
    /// are included (BTreeMap-backed, deterministic key order).
    pub fn compute(
        pool: &[Candidate],
        ctx: &ScoringContext,
        k: usize,
        min_pool: usize,
        residual_label: &str,
    ) -> Self {
        let mut members: Vec<&Candidate> = pool.iter().collect();
        members.sort_by(|a, b| a.id.cmp(&b.id));

        let canonical = json!({
            "context": ctx,
            "k": k,
            "min_pool": min_pool,
            "residual": residual_label,
            "pool": members,
        });

        Self(blake3::hash(canonical.to_string().as_bytes()).to_hex().to_string())
    }

    /// First 12 hex digits, for log lines and directory names.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
