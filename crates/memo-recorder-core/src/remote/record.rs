use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One saved clip as described by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingRecord {
    /// Opaque identifier assigned by the store.
    #[serde(rename = "_id")]
    pub id: String,
    /// Locator the audio is played back from.
    pub path: String,
    /// Any further fields the store sends, kept as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordingRecord {
    /// A record with no extra fields.
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            extra: Map::new(),
        }
    }
}

/// Snapshot of the store's list as of the last successful refresh.
///
/// Replaced wholesale on refresh; never mutated in place.
pub type RecordingsList = Arc<[RecordingRecord]>;
