use crate::config::{default_base_url, default_request_timeout_secs};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Remote recordings store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store; routes and media paths resolve against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds. Zero disables the timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl StoreConfig {
    /// Timeout handed to the HTTP client, if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
