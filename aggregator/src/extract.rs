//! Turns one raw upstream response into one [`CallOutcome`].
//!
//! The upstream document looks like:
//!
//! ```json
//! {
//!   "metadata": {"actualSizeMB": 12.5, ...},
//!   "items": [{"available": true, ...}, {"available": false, ...}]
//! }
//! ```
//!
//! Every field may be absent or null and counts as zero. Datasets produced for
//! the hotel and user demos name the collection `hotels` or `users` and the
//! flag `active`. Those names are read only when `items` / `available` are
//! absent.

use crate::outcome::{CallOutcome, SuccessDetail};
use crate::upstream::UpstreamError;
use hyper::body::Bytes;
use serde::Deserialize;
use std::time::Instant;

#[derive(Deserialize)]
struct UpstreamDocument {
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    items: Option<Vec<Entity>>,
    #[serde(default)]
    hotels: Option<Vec<Entity>>,
    #[serde(default)]
    users: Option<Vec<Entity>>,
}

impl UpstreamDocument {
    fn into_entities(self) -> Vec<Entity> {
        self.items
            .or(self.hotels)
            .or(self.users)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Metadata {
    #[serde(default, rename = "actualSizeMB")]
    actual_size_mb: Option<f64>,
}

#[derive(Deserialize)]
struct Entity {
    #[serde(default)]
    available: Option<bool>,
    #[serde(default)]
    active: Option<bool>,
}

impl Entity {
    fn is_available(&self) -> bool {
        self.available.or(self.active) == Some(true)
    }
}

/// Counts extracted from a parsed upstream document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentSummary {
    pub entity_count: u64,
    pub available_count: u64,
    pub size_mb: f64,
}

impl DocumentSummary {
    pub fn from_slice(body: &[u8]) -> Result<Self, UpstreamError> {
        let mut document: UpstreamDocument = serde_json::from_slice(body)?;
        let size_mb = document
            .metadata
            .take()
            .and_then(|metadata| metadata.actual_size_mb)
            .unwrap_or(0.0);
        let entities = document.into_entities();

        Ok(Self {
            entity_count: entities.len() as u64,
            available_count: entities.iter().filter(|entity| entity.is_available()).count() as u64,
            size_mb,
        })
    }
}

/// Settles one call. `started_at` is the instant that call was dispatched.
pub fn extract_outcome(response: Result<Bytes, UpstreamError>, started_at: Instant) -> CallOutcome {
    match response.and_then(|body| DocumentSummary::from_slice(&body)) {
        Ok(summary) => CallOutcome::Success(SuccessDetail {
            latency: started_at.elapsed(),
            entity_count: summary.entity_count,
            available_count: summary.available_count,
            size_mb: summary.size_mb,
        }),
        Err(e) => CallOutcome::failure(format!("Call failed: {e}")),
    }
}
