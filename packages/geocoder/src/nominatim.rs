//! Nominatim / OpenStreetMap geocoder client.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum.
//! The resolver's in-request pacing keeps us under it.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use serde_json::Value;

use artist_atlas_source::{SourceError, retry};

use crate::{GeoResult, display};

/// Nominatim search endpoint of the public instance.
const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Geocodes a free-form location query using Nominatim.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn geocode_freeform(
    client: &reqwest::Client,
    query: &str,
) -> Result<Option<GeoResult>, SourceError> {
    let Some(body) = retry::get_json(|| {
        client
            .get(NOMINATIM_SEARCH_URL)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
    })
    .await?
    else {
        return Ok(None);
    };

    Ok(parse_response(&body))
}

/// Parses a Nominatim JSON response. Coordinates come back as strings.
fn parse_response(body: &Value) -> Option<GeoResult> {
    let first = body.as_array()?.first()?;

    let latitude = first
        .get("lat")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<f64>().ok())?;
    let longitude = first
        .get("lon")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<f64>().ok())?;

    let display_name = first
        .get("display_name")
        .and_then(Value::as_str)
        .map(display::normalize_display_name)?;

    let address_type = first
        .get("addresstype")
        .or_else(|| first.get("type"))
        .and_then(Value::as_str)
        .map(String::from);

    Some(GeoResult {
        latitude,
        longitude,
        display_name,
        address_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "40.3354",
            "lon": "-75.9263",
            "display_name": "West Reading, Berks County, Pennsylvania, United States",
            "addresstype": "city"
        }]);
        let result = parse_response(&body).unwrap();
        assert!((result.latitude - 40.3354).abs() < 1e-4);
        assert!((result.longitude - -75.9263).abs() < 1e-4);
        assert_eq!(result.display_name, "West Reading, United States");
        assert_eq!(result.address_type.as_deref(), Some("city"));
        assert!(result.is_city_level());
    }

    #[test]
    fn falls_back_to_type_field() {
        let body = serde_json::json!([{
            "lat": "48.8566",
            "lon": "2.3522",
            "display_name": "Paris, France",
            "type": "administrative"
        }]);
        let result = parse_response(&body).unwrap();
        assert_eq!(result.address_type.as_deref(), Some("administrative"));
        assert!(!result.is_city_level());
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).is_none());
    }

    #[test]
    fn malformed_coordinates_are_a_miss() {
        let body = serde_json::json!([{
            "lat": "not-a-number",
            "lon": "2.3522",
            "display_name": "Nowhere"
        }]);
        assert!(parse_response(&body).is_none());
    }
}
