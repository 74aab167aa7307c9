// src/services/google_places_client.rs
// DOCUMENTATION: Google Places API client
// PURPOSE: Fetch raw nearby-search pages and classify upstream failures

use crate::config::Config;
use crate::errors::PlacesError;
use crate::models::{RawGeometry, RawPlace};
use async_trait::async_trait;
use geo_types::Point;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One page of upstream search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Results in upstream order
    pub results: Vec<RawPlace>,
    /// Cursor for the next page, absent on the last page
    pub next_page_token: Option<String>,
}

/// Boundary the pipeline fetches pages through
/// DOCUMENTATION: Implementations classify failures into the error taxonomy:
/// Transient and QuotaExceeded are retried by the caller, everything else is final
#[async_trait]
pub trait PlacesClient: Send + Sync {
    async fn search(
        &self,
        location: &str,
        radius_m: u32,
        place_type: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<SearchPage, PlacesError>;
}

/// Tunables for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Google Maps API root (".../maps/api")
    pub base_url: String,
    /// Client-side pacing
    pub requests_per_second: u32,
    /// Total calls this client may make
    pub max_requests: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: crate::config::env::DEFAULT_BASE_URL.to_string(),
            requests_per_second: 50,
            max_requests: 1000,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ClientOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.google_places_base_url.clone(),
            requests_per_second: config.requests_per_second,
            max_requests: config.max_requests,
            timeout: config.request_timeout(),
        }
    }
}

/// Google Places API client
/// DOCUMENTATION: Handles authentication, pacing and API calls to Google Places
pub struct GooglePlacesClient {
    /// HTTP client for making requests
    client: Client,
    /// Google Places API key
    api_key: String,
    /// Base URL for Google Maps APIs
    base_url: String,
    /// Request pacing
    limiter: DefaultDirectRateLimiter,
    /// Request budget for this client
    max_requests: u32,
    requests_made: AtomicU32,
    /// Geocoded free-text locations
    geocoded: Mutex<HashMap<String, Point<f64>>>,
}

/// Response from Google Places Nearby Search
#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    #[serde(default)]
    results: Vec<RawPlace>,
    status: String,
    next_page_token: Option<String>,
    error_message: Option<String>,
}

/// Response from the Geocoding API
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: RawGeometry,
}

impl GooglePlacesClient {
    /// Create new Google Places API client
    /// DOCUMENTATION: Initializes client with API key and options
    pub fn new(api_key: impl Into<String>, options: ClientOptions) -> Result<Self, PlacesError> {
        let rate = NonZeroU32::new(options.requests_per_second).ok_or_else(|| {
            PlacesError::InvalidArgument("requests per second must be at least 1".to_string())
        })?;

        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| PlacesError::Upstream(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: options.base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            max_requests: options.max_requests,
            requests_made: AtomicU32::new(0),
            geocoded: Mutex::new(HashMap::new()),
        })
    }

    /// Number of HTTP calls issued so far
    pub fn requests_made(&self) -> u32 {
        self.requests_made.load(Ordering::SeqCst)
    }

    /// Resolve a location to a point
    /// DOCUMENTATION: "lat,lng" is used as-is; anything else is geocoded once
    /// and remembered for the lifetime of the client
    pub async fn resolve_location(&self, location: &str) -> Result<Point<f64>, PlacesError> {
        if let Some(point) = parse_coordinates(location) {
            return Ok(point);
        }

        let cached = self
            .geocoded
            .lock()
            .ok()
            .and_then(|cache| cache.get(location).copied());
        if let Some(point) = cached {
            return Ok(point);
        }

        let point = self.geocode(location).await?;
        if let Ok(mut cache) = self.geocoded.lock() {
            cache.insert(location.to_string(), point);
        }
        Ok(point)
    }

    async fn geocode(&self, location: &str) -> Result<Point<f64>, PlacesError> {
        let url = format!("{}/geocode/json", self.base_url);
        let params = [
            ("address", location.to_string()),
            ("key", self.api_key.clone()),
        ];

        log::debug!("Geocoding location: {}", location);

        let response: GeocodeResponse = self.get_json(&url, &params).await?;

        if response.status == "ZERO_RESULTS" {
            return Err(PlacesError::InvalidArgument(format!(
                "Could not geocode location: {}",
                location
            )));
        }
        check_status(&response.status, response.error_message, false)?;

        let point = response
            .results
            .first()
            .and_then(|result| result.geometry.location)
            .map(|loc| Point::new(loc.lng, loc.lat))
            .ok_or_else(|| {
                PlacesError::InvalidArgument(format!("Could not geocode location: {}", location))
            })?;

        log::info!(
            "Geocoded '{}' to lat={}, lng={}",
            location,
            point.y(),
            point.x()
        );
        Ok(point)
    }

    /// Issue one paced, budgeted GET and decode its JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, PlacesError> {
        let made = self.requests_made.fetch_add(1, Ordering::SeqCst);
        if made >= self.max_requests {
            log::error!("Request budget of {} calls exhausted", self.max_requests);
            return Err(PlacesError::RequestBudgetExceeded(self.max_requests));
        }

        self.limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                log::warn!("Google Places API request failed: {}", e);
                classify_transport_error(e)
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(PlacesError::QuotaExceeded { retry_after });
        }

        if status.is_server_error() {
            return Err(PlacesError::Transient(format!("HTTP {}", status)));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PlacesError::Auth(format!("HTTP {}", status)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Google Places API error {}: {}", status, body);
            return Err(PlacesError::Upstream(format!(
                "API error {}: {}",
                status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            log::error!("Failed to parse Google Places response: {}", e);
            classify_transport_error(e)
        })
    }
}

#[async_trait]
impl PlacesClient for GooglePlacesClient {
    /// Perform nearby search for places
    /// DOCUMENTATION: Searches for places near a location
    ///
    /// # Arguments
    /// * `location` - Free-text address or "lat,lng"
    /// * `radius_m` - Search radius in meters (max 50000)
    /// * `place_type` - Optional type filter (e.g., "restaurant", "bar")
    /// * `page_token` - Cursor from the previous page; when present only the
    ///   token is sent, as the upstream API requires
    async fn search(
        &self,
        location: &str,
        radius_m: u32,
        place_type: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<SearchPage, PlacesError> {
        let url = format!("{}/place/nearbysearch/json", self.base_url);

        let mut params = vec![("key", self.api_key.clone())];
        match page_token {
            Some(token) => params.push(("pagetoken", token.to_string())),
            None => {
                let center = self.resolve_location(location).await?;
                params.push(("location", format!("{},{}", center.y(), center.x())));
                params.push(("radius", radius_m.to_string()));
                if let Some(place_type) = place_type {
                    params.push(("type", place_type.to_string()));
                }
            }
        }

        log::debug!(
            "Google Places nearby search: location={}, radius={}, type={:?}, page_token={}",
            location,
            radius_m,
            place_type,
            page_token.is_some()
        );

        let response: NearbySearchResponse = self.get_json(&url, &params).await?;
        check_status(&response.status, response.error_message, page_token.is_some())?;

        log::info!(
            "Google Places search returned {} results",
            response.results.len()
        );

        Ok(SearchPage {
            results: response.results,
            next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
        })
    }
}

/// Map an upstream "status" field to the error taxonomy
fn check_status(
    status: &str,
    error_message: Option<String>,
    with_page_token: bool,
) -> Result<(), PlacesError> {
    let message = || error_message.clone().unwrap_or_else(|| status.to_string());

    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "OVER_QUERY_LIMIT" => {
            log::warn!("Google Places API quota exceeded");
            Err(PlacesError::QuotaExceeded { retry_after: None })
        }
        "REQUEST_DENIED" => {
            log::error!("Google Places API request denied: {}", message());
            Err(PlacesError::Auth(message()))
        }
        // Page tokens become valid a short while after they are issued
        "INVALID_REQUEST" if with_page_token => Err(PlacesError::Transient(format!(
            "page token not yet active: {}",
            message()
        ))),
        "UNKNOWN_ERROR" => Err(PlacesError::Transient(message())),
        other => {
            let msg = error_message
                .clone()
                .unwrap_or_else(|| format!("Unknown status: {}", other));
            log::error!("Google Places API unexpected status: {}", msg);
            Err(PlacesError::Upstream(msg))
        }
    }
}

fn classify_transport_error(e: reqwest::Error) -> PlacesError {
    if e.is_decode() || e.is_builder() {
        PlacesError::Upstream(format!("Parse error: {}", e))
    } else {
        PlacesError::Transient(format!("Request failed: {}", e))
    }
}

/// Parse "lat,lng" into a point (x = longitude, y = latitude)
pub fn parse_coordinates(location: &str) -> Option<Point<f64>> {
    let (lat, lng) = location.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;

    let valid = lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng);

    valid.then(|| Point::new(lng, lat))
}
