mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod session_config;
mod store_config;

pub(crate) use {
    audio_config::AudioConfig, config::Config, session_config::SessionConfig,
    store_config::StoreConfig,
};

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

pub(crate) fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

pub(crate) fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}
