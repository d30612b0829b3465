//! Application configuration.

use crate::events::EventController;

/// Environment variable naming the analysis service base URL.
pub const API_URL_ENV: &str = "CYSTOVIEW_API_URL";

/// Default base URL when the environment does not override it.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Configuration for a CystoView session.
///
/// Construct with [`CystoViewConfig::from_env`] (or [`Default::default`]) and
/// adjust fields before launching the UI.
#[derive(Clone)]
pub struct CystoViewConfig {
    /// Window title.
    pub title: String,
    /// Base URL of the analysis service, without trailing slash.
    pub api_base: String,
    /// Snap search half-window for manual peak placement, in seconds.
    pub snap_window_secs: f64,
    /// Minimum spacing between two committed peaks, in seconds.
    pub peak_dedupe_secs: f64,
    /// Tolerance when comparing the draft range against the committed
    /// window for the range-selection gate.
    pub window_epsilon: f64,
    /// Optional event controller; attach before launch to observe the
    /// session from embedding code.
    pub events: Option<EventController>,
}

impl Default for CystoViewConfig {
    fn default() -> Self {
        Self {
            title: "CystoView".to_string(),
            api_base: DEFAULT_API_URL.to_string(),
            snap_window_secs: 10.0,
            peak_dedupe_secs: crate::data::peaks::DEDUPE_WINDOW_SEC,
            window_epsilon: 1e-9,
            events: None,
        }
    }
}

impl CystoViewConfig {
    /// Build a config taking the service endpoint from `CYSTOVIEW_API_URL`
    /// when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim().trim_end_matches('/').to_string();
            if !url.is_empty() {
                config.api_base = url;
            }
        }
        config
    }

    /// Emit an event if an [`EventController`] is attached.
    pub fn emit(&self, event: crate::events::SessionEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_localhost() {
        let config = CystoViewConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_URL);
        assert!(config.snap_window_secs > 0.0);
    }
}
