// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use crate::errors::PlacesError;
use crate::services::{PipelineSettings, RetryPolicy};
use dotenv::dotenv;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default Google Maps API root; places and geocoding live under it
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Places API Key
    pub google_places_api_key: String,

    /// Google Maps API root URL (overridable for tests and proxies)
    pub google_places_base_url: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Directory for generated spreadsheets when no --output is given
    pub output_dir: PathBuf,

    /// Maximum result pages per run (upstream serves at most 3)
    pub max_pages: u32,

    /// Retries after a transient failure before giving up
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled per retry
    pub backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds
    pub backoff_max_ms: u64,

    /// Retries after a rate-limit response
    pub max_quota_retries: u32,

    /// Wait after a rate-limit response without a Retry-After hint
    pub quota_delay_secs: u64,

    /// Longest rate-limit wait, even when Retry-After asks for more
    pub max_quota_delay_secs: u64,

    /// Wait before following a next-page token
    pub page_delay_ms: u64,

    /// Client-side request pacing
    pub requests_per_second: u32,

    /// Total API calls allowed in one run
    pub max_requests: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Values that failed to parse and fell back to defaults; logged once the
    /// logger is up
    warnings: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut vars = VarReader {
            lookup,
            warnings: Vec::new(),
        };

        Config {
            google_places_api_key: vars
                .text("GOOGLE_PLACES_API_KEY")
                .map(|key| key.trim().to_string())
                .unwrap_or_default(),

            google_places_base_url: vars
                .text("GOOGLE_PLACES_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),

            log_level: vars
                .text("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string()),

            output_dir: vars
                .text("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),

            max_pages: vars.parse_or("MAX_PAGES", 3),
            max_retries: vars.parse_or("MAX_RETRIES", 3),
            backoff_base_ms: vars.parse_or("BACKOFF_BASE_MS", 500),
            backoff_max_ms: vars.parse_or("BACKOFF_MAX_MS", 8000),
            max_quota_retries: vars.parse_or("MAX_QUOTA_RETRIES", 3),
            quota_delay_secs: vars.parse_or("QUOTA_DELAY_SECS", 2),
            max_quota_delay_secs: vars.parse_or("MAX_QUOTA_DELAY_SECS", 60),
            page_delay_ms: vars.parse_or("PAGE_DELAY_MS", 2000),
            requests_per_second: vars.parse_or("REQUESTS_PER_SECOND", 50),
            max_requests: vars.parse_or("MAX_REQUESTS", 1000),
            request_timeout_secs: vars.parse_or("REQUEST_TIMEOUT_SECS", 10),

            warnings: vars.warnings,
        }
    }

    /// Emit collected warnings through the logger
    /// DOCUMENTATION: Configuration is read before logging is initialized, so
    /// call this right after `env_logger::init()`
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures the run can start safely; a missing API key is an
    /// authentication failure raised before any network call
    pub fn validate(&self) -> Result<(), PlacesError> {
        if self.google_places_api_key.is_empty() {
            return Err(PlacesError::Auth(
                "GOOGLE_PLACES_API_KEY is not set".to_string(),
            ));
        }

        if self.max_pages == 0 {
            return Err(PlacesError::InvalidArgument(
                "MAX_PAGES must be at least 1".to_string(),
            ));
        }

        if self.requests_per_second == 0 {
            return Err(PlacesError::InvalidArgument(
                "REQUESTS_PER_SECOND must be at least 1".to_string(),
            ));
        }

        if self.backoff_max_ms < self.backoff_base_ms {
            log::warn!(
                "BACKOFF_MAX_MS ({}) is below BACKOFF_BASE_MS ({}); every retry waits {}ms",
                self.backoff_max_ms,
                self.backoff_base_ms,
                self.backoff_max_ms
            );
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_backoff: Duration::from_millis(self.backoff_base_ms),
            max_backoff: Duration::from_millis(self.backoff_max_ms),
            max_quota_retries: self.max_quota_retries,
            quota_delay: Duration::from_secs(self.quota_delay_secs),
            max_quota_delay: Duration::from_secs(self.max_quota_delay_secs),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_pages: self.max_pages,
            page_delay: Duration::from_millis(self.page_delay_ms),
            retry: self.retry_policy(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Variable source that remembers values it had to ignore
struct VarReader<F> {
    lookup: F,
    warnings: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> VarReader<F> {
    fn text(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn parse_or<T: FromStr + Display>(&mut self, key: &str, default: T) -> T {
        let Some(raw) = (self.lookup)(key) else {
            return default;
        };

        match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                self.warnings.push(format!(
                    "Ignoring unparseable configuration value {}={:?}; using default {}",
                    key, raw, default
                ));
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[("GOOGLE_PLACES_API_KEY", "test_key")]);

        assert_eq!(config.google_places_api_key, "test_key");
        assert_eq!(config.google_places_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.requests_per_second, 50);
        assert_eq!(config.max_requests, 1000);
        assert!(config.validate().is_ok());

        let settings = config.pipeline_settings();
        assert_eq!(settings.page_delay, Duration::from_secs(2));
        assert_eq!(settings.retry.base_backoff, Duration::from_millis(500));
        assert_eq!(settings.retry.quota_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config_with(&[
            ("GOOGLE_PLACES_API_KEY", "k"),
            ("MAX_PAGES", "5"),
            ("BACKOFF_BASE_MS", "not-a-number"),
            ("OUTPUT_DIR", "/tmp/places"),
        ]);

        assert_eq!(config.max_pages, 5);
        assert_eq!(config.backoff_base_ms, 500);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/places"));
    }

    #[test]
    fn test_unparseable_values_are_reported() {
        let config = config_with(&[
            ("GOOGLE_PLACES_API_KEY", "k"),
            ("MAX_PAGES", "abc"),
            ("BACKOFF_BASE_MS", "oops"),
            ("MAX_RETRIES", "4"),
        ]);

        assert_eq!(config.max_pages, 3);
        assert_eq!(config.max_retries, 4);

        let warnings = &config.warnings;
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("MAX_PAGES"));
        assert!(warnings[0].contains("\"abc\""));
        assert!(warnings[0].contains("default 3"));
        assert!(warnings[1].contains("BACKOFF_BASE_MS"));

        assert!(config_with(&[("MAX_PAGES", " 2 ")]).warnings.is_empty());
    }

    #[test]
    fn test_quota_delay_cap_reaches_retry_policy() {
        let config = config_with(&[("MAX_QUOTA_DELAY_SECS", "15")]);
        assert_eq!(config.retry_policy().max_quota_delay, Duration::from_secs(15));
        assert_eq!(
            config_with(&[]).retry_policy().max_quota_delay,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_missing_api_key_is_auth_error() {
        let config = config_with(&[]);
        assert!(matches!(config.validate(), Err(PlacesError::Auth(_))));

        let config = config_with(&[("GOOGLE_PLACES_API_KEY", "   ")]);
        assert!(matches!(config.validate(), Err(PlacesError::Auth(_))));
    }

    #[test]
    fn test_zero_page_bound_rejected() {
        let config = config_with(&[("GOOGLE_PLACES_API_KEY", "k"), ("MAX_PAGES", "0")]);
        assert!(matches!(
            config.validate(),
            Err(PlacesError::InvalidArgument(_))
        ));
    }
}
