#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for resolved location strings.
//!
//! Two free OSM-backed providers, tried in order:
//!
//! 1. **Nominatim**: returns display names and an address type, 1 req/sec
//!    rate limit.
//! 2. **Photon**: `GeoJSON` feature collections, no display string.
//!
//! When both miss and the query contains a comma, the cascade retries
//! with the last segment (the country), so even an obscure locality gets
//! some dot on the globe.

pub mod display;
pub mod nominatim;
pub mod photon;

use artist_atlas_source::SourceError;

/// Address types specific enough to pin a single populated place.
const CITY_LEVEL_ADDRESS_TYPES: &[&str] = &[
    "city",
    "town",
    "village",
    "municipality",
    "suburb",
    "neighbourhood",
    "district",
    "borough",
    "locality",
];

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoResult {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Normalized display name, `"City, Country"` when possible.
    pub display_name: String,
    /// Provider's classification of the match (city, state, country, ...).
    pub address_type: Option<String>,
}

impl GeoResult {
    /// Whether the match is specific enough to be a populated place.
    #[must_use]
    pub fn is_city_level(&self) -> bool {
        self.address_type.as_deref().is_some_and(|address_type| {
            CITY_LEVEL_ADDRESS_TYPES
                .iter()
                .any(|city_type| city_type.eq_ignore_ascii_case(address_type))
        })
    }
}

/// Geocodes a free-form location string through the provider cascade.
///
/// Nominatim first, Photon second; when both miss and the query contains
/// a comma, both are retried against the last comma segment. Malformed
/// provider payloads are treated as misses.
///
/// # Errors
///
/// Returns [`SourceError`] if a request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn geocode_location(
    client: &reqwest::Client,
    query: &str,
) -> Result<Option<GeoResult>, SourceError> {
    if let Some(geo) = attempt_providers(client, query).await? {
        return Ok(Some(geo));
    }

    // Country fallback: the last comma segment of "City, Region, Country".
    if let Some((_, country)) = query.rsplit_once(',') {
        let country = country.trim();
        if !country.is_empty() {
            return attempt_providers(client, country).await;
        }
    }

    Ok(None)
}

/// Runs one query through both providers in order.
#[allow(clippy::future_not_send)]
async fn attempt_providers(
    client: &reqwest::Client,
    query: &str,
) -> Result<Option<GeoResult>, SourceError> {
    if let Some(geo) = nominatim::geocode_freeform(client, query).await? {
        return Ok(Some(geo));
    }
    photon::geocode_freeform(client, query).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_level_address_types() {
        let mut geo = GeoResult {
            latitude: 0.0,
            longitude: 0.0,
            display_name: "Somewhere".to_string(),
            address_type: Some("city".to_string()),
        };
        assert!(geo.is_city_level());

        geo.address_type = Some("Town".to_string());
        assert!(geo.is_city_level());

        geo.address_type = Some("state".to_string());
        assert!(!geo.is_city_level());

        geo.address_type = None;
        assert!(!geo.is_city_level());
    }
}
