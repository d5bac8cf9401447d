use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
pub const RELEVANCE_COMPARISON_EPSILON: f64 = 1e-6;
pub const DEFAULT_SHARD_COUNT: usize = 8;

/// Tunables of a [`SearchServer`](crate::SearchServer).
///
/// Missing fields fall back to their defaults when deserialized, so an empty
/// JSON object is a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Upper bound on the number of documents a ranked search returns.
    pub max_results: usize,
    /// Relevance values closer than this are ranked by rating instead.
    pub relevance_epsilon: f64,
    /// Number of independently locked partitions used by parallel ranking.
    pub shard_count: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULT_DOCUMENT_COUNT,
            relevance_epsilon: RELEVANCE_COMPARISON_EPSILON,
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }
}

impl SearchOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut options: SearchOptions = serde_json::from_str(json)?;
        options.shard_count = options.shard_count.max(1);
        Ok(options)
    }

    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count.max(1);
        self
    }
}
