// src/models/place.rs
// DOCUMENTATION: Core data structures for places
// PURPOSE: Upstream result shapes, normalized records and the validated search query

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::category::{format_code, CategoryTable};
use crate::errors::PlacesError;

/// Upstream allows at most 50 km for nearby search
pub const MAX_RADIUS_METERS: i64 = 50_000;

/// Individual place as returned by the upstream search API
/// DOCUMENTATION: Every field is optional; a result missing its id, name or
/// coordinates is skipped rather than failing the run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPlace {
    /// Upstream unique place identifier
    #[serde(default)]
    pub place_id: Option<String>,
    /// Place name
    #[serde(default)]
    pub name: Option<String>,
    /// Short address (nearby search)
    #[serde(default)]
    pub vicinity: Option<String>,
    /// Full address (text search / details)
    #[serde(default)]
    pub formatted_address: Option<String>,
    /// Geographic location
    #[serde(default)]
    pub geometry: Option<RawGeometry>,
    /// Place types (e.g., ["restaurant", "food", "point_of_interest"])
    #[serde(default)]
    pub types: Vec<String>,
    /// Rating (0-5)
    #[serde(default)]
    pub rating: Option<f64>,
    /// Business status (OPERATIONAL, CLOSED_TEMPORARILY, etc.)
    #[serde(default)]
    pub business_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawGeometry {
    #[serde(default)]
    pub location: Option<RawLocation>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RawLocation {
    pub lat: f64,
    pub lng: f64,
}

impl RawPlace {
    /// Coordinates as (latitude, longitude), if present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.geometry
            .as_ref()
            .and_then(|geometry| geometry.location)
            .map(|location| (location.lat, location.lng))
    }
}

/// One normalized business entry
/// DOCUMENTATION: Immutable after construction. The category name is derived
/// from the category code at construction time and cannot be set on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceRecord {
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
    category_code: Option<u16>,
    category_name: String,
    rating: Option<f64>,
    place_id: String,
}

impl PlaceRecord {
    /// Build a record, resolving the category name through `categories`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        place_id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        latitude: f64,
        longitude: f64,
        category_code: Option<u16>,
        rating: Option<f64>,
        categories: &CategoryTable,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            latitude,
            longitude,
            category_code,
            category_name: categories.lookup_optional(category_code).to_string(),
            rating: rating.filter(|r| r.is_finite() && (0.0..=5.0).contains(r)),
            place_id: place_id.into(),
        }
    }

    /// Convert an upstream result into a record
    /// DOCUMENTATION: Maps RawPlace to PlaceRecord, classifying it by its types
    ///
    /// # Returns
    /// None when the result lacks a place id, a name, or coordinates
    pub fn from_raw(raw: &RawPlace, categories: &CategoryTable) -> Option<Self> {
        let place_id = raw.place_id.as_deref().filter(|id| !id.is_empty())?;
        let name = raw.name.as_deref().filter(|name| !name.is_empty())?;
        let (latitude, longitude) = raw.coordinates()?;

        // Prefer vicinity (what nearby search returns) over formatted_address
        let address = raw
            .vicinity
            .as_deref()
            .or(raw.formatted_address.as_deref())
            .unwrap_or_default();

        if let Some(rating) = raw.rating {
            if !(0.0..=5.0).contains(&rating) {
                log::debug!("Dropping out-of-range rating {} for {}", rating, place_id);
            }
        }

        Some(Self::new(
            place_id,
            name,
            address,
            latitude,
            longitude,
            categories.classify(&raw.types),
            raw.rating,
            categories,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn category_code(&self) -> Option<u16> {
        self.category_code
    }

    /// Zero-padded four digit code, if classified
    pub fn category_code_display(&self) -> Option<String> {
        self.category_code.map(format_code)
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    pub fn place_id(&self) -> &str {
        &self.place_id
    }
}

/// Validated location query for one run
/// DOCUMENTATION: Built from CLI arguments; radius stays signed so negative
/// input reaches validation instead of failing argument parsing
#[derive(Debug, Clone, Validate)]
pub struct SearchQuery {
    /// Free-text address or "lat,lng"
    #[validate(length(min = 1, max = 512))]
    pub location: String,

    /// Search radius in meters, 1..=MAX_RADIUS_METERS
    pub radius_m: i64,

    /// Place type filters; one search runs per type, none means unfiltered
    pub place_types: Vec<String>,
}

impl SearchQuery {
    pub fn new(location: impl AsRef<str>, radius_m: i64) -> Self {
        Self {
            location: location.as_ref().trim().to_string(),
            radius_m,
            place_types: Vec::new(),
        }
    }

    pub fn with_place_types<S: Into<String>>(mut self, place_types: impl IntoIterator<Item = S>) -> Self {
        self.place_types = place_types.into_iter().map(Into::into).collect();
        self
    }

    /// Type filter for each search the query expands to
    pub fn searches(&self) -> Vec<Option<&str>> {
        if self.place_types.is_empty() {
            vec![None]
        } else {
            self.place_types.iter().map(|t| Some(t.as_str())).collect()
        }
    }

    /// Validate and return the radius in the unsigned form the client takes
    pub fn checked_radius(&self) -> Result<u32, PlacesError> {
        self.validate()
            .map_err(|e| PlacesError::InvalidArgument(e.to_string()))?;

        if !(1..=MAX_RADIUS_METERS).contains(&self.radius_m) {
            return Err(PlacesError::InvalidArgument(format!(
                "radius must be between 1 and {} meters, got {}",
                MAX_RADIUS_METERS, self.radius_m
            )));
        }

        u32::try_from(self.radius_m)
            .map_err(|_| PlacesError::InvalidArgument(format!("radius {} out of range", self.radius_m)))
    }
}
