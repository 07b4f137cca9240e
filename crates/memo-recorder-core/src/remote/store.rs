use crate::{
    CoreError, CoreResult,
    remote::{
        RecordingRecord, RecordingsList, StoreEndpoint,
        endpoint::{DELETE_ROUTE, RECORDINGS_ROUTE},
    },
};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Client-side cache of the store's recordings list.
///
/// The store is the only source of truth: every mutation is followed by a
/// full refresh and the cached list is swapped whole, never patched.
pub struct RecordingsStore {
    endpoint: StoreEndpoint,
    list: watch::Sender<RecordingsList>,
}

impl RecordingsStore {
    /// Creates a store with an empty cache. Call [`Self::refresh`] to populate it.
    pub fn new(endpoint: StoreEndpoint) -> Self {
        let (list, _) = watch::channel(RecordingsList::from(Vec::new()));
        Self { endpoint, list }
    }

    /// Snapshot of the cached list.
    pub fn recordings(&self) -> RecordingsList {
        self.list.borrow().clone()
    }

    /// Receiver notified every time the cache is replaced.
    pub fn subscribe(&self) -> watch::Receiver<RecordingsList> {
        self.list.subscribe()
    }

    /// Cached record with the given id.
    pub fn find(&self, id: &str) -> Option<RecordingRecord> {
        self.list.borrow().iter().find(|r| r.id == id).cloned()
    }

    /// Endpoint this store talks to.
    pub fn endpoint(&self) -> &StoreEndpoint {
        &self.endpoint
    }

    /// Re-fetches the full list and replaces the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FetchFailed`]; the cache is left as it was.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> CoreResult<()> {
        let response = self
            .endpoint
            .client()
            .get(self.endpoint.route(RECORDINGS_ROUTE))
            .send()
            .await
            .map_err(|e| CoreError::FetchFailed {
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Store rejected list request");
            return Err(CoreError::FetchFailed {
                source: format!("Store responded with {}", status).into(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let records = response
            .json::<Vec<RecordingRecord>>()
            .await
            .map_err(|e| CoreError::FetchFailed {
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let count = records.len();
        self.list.send_replace(RecordingsList::from(records));

        debug!(count, "Recordings list refreshed");

        Ok(())
    }

    /// Deletes a recording, then refreshes.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DeleteFailed`] if the store did not confirm the delete;
    ///   the cache is unchanged.
    /// - [`CoreError::FetchFailed`] if the delete succeeded but the follow-up
    ///   refresh did not; the previous cache is kept.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> CoreResult<()> {
        if id.is_empty() {
            return Err(CoreError::DeleteFailed {
                id: String::new(),
                source: "Recording id is empty".into(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let response = self
            .endpoint
            .client()
            .delete(self.endpoint.route_with(DELETE_ROUTE, id))
            .send()
            .await
            .map_err(|e| CoreError::DeleteFailed {
                id: id.to_string(),
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Store rejected delete");
            return Err(CoreError::DeleteFailed {
                id: id.to_string(),
                source: format!("Store responded with {}", status).into(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!(id, "Recording deleted");

        self.refresh().await
    }

    /// Reconciles after an upload by refetching, never by appending `record`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FetchFailed`] if the refresh fails.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn record_created(&self, record: &RecordingRecord) -> CoreResult<()> {
        debug!("Refreshing after upload");
        self.refresh().await
    }
}
