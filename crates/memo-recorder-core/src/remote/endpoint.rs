use crate::{CoreError, CoreResult};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use reqwest::{Client, Url};
use tracing::{info, instrument};

pub(crate) const RECORDINGS_ROUTE: &[&str] = &["api", "recordings"];
pub(crate) const UPLOAD_ROUTE: &[&str] = &["api", "upload"];
pub(crate) const DELETE_ROUTE: &[&str] = &["api", "delete"];

/// Base URL and shared HTTP client for the remote recordings store.
#[derive(Debug, Clone)]
pub struct StoreEndpoint {
    base: Url,
    client: Client,
}

impl StoreEndpoint {
    /// Builds an endpoint for `base_url`.
    ///
    /// `timeout` bounds each request; `None` leaves requests unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidEndpoint`] if the URL is not an absolute
    /// http(s) URL or the client cannot be constructed.
    #[track_caller]
    #[instrument(skip(base_url))]
    pub fn new(base_url: &str, timeout: Option<Duration>) -> CoreResult<Self> {
        let base = Url::parse(base_url).map_err(|e| CoreError::InvalidEndpoint {
            reason: format!("Failed to parse '{}': {}", base_url, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(CoreError::InvalidEndpoint {
                reason: format!("'{}' is not an http(s) base URL", base_url),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| CoreError::InvalidEndpoint {
            reason: format!("Failed to build HTTP client: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(base_url = %base, "Store endpoint configured");

        Ok(Self { base, client })
    }

    /// URL the store serves a recording's audio from.
    pub fn media_url(&self, path: &str) -> Url {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.join(&segments)
    }

    pub(crate) fn route(&self, route: &[&str]) -> Url {
        self.join(route)
    }

    pub(crate) fn route_with(&self, route: &[&str], last: &str) -> Url {
        let mut url = self.join(route);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(last);
        }
        url
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
