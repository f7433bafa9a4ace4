/// Single-slot cache of the last successful verification (chrome.storage.local)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::ResultSummary;

/// The one entry kept under `lastVerification`; each write replaces it whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedVerification {
    /// Milliseconds since the epoch
    pub timestamp: f64,
    pub data: Value,
}

impl CachedVerification {
    pub fn new(timestamp: f64, data: Value) -> Self {
        CachedVerification { timestamp, data }
    }

    /// Parse whatever the store returned for the cache key
    ///
    /// Missing, null or foreign-shaped values all read as an empty slot.
    pub fn from_stored(stored: Option<Value>) -> Option<CachedVerification> {
        let stored = stored.filter(|v| !v.is_null())?;
        match serde_json::from_value::<CachedVerification>(stored) {
            Ok(entry) if !entry.data.is_null() => Some(entry),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Ignoring unreadable cache entry: {}", e);
                None
            }
        }
    }

    pub fn summary(&self) -> Option<ResultSummary> {
        ResultSummary::from_payload(&self.data)
    }
}
