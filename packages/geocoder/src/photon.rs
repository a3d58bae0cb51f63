//! Photon geocoder client.
//!
//! Photon serves `GeoJSON` feature collections and does not return a
//! display string, so results carry the original query as their display
//! name. Coordinates are `[lon, lat]` and must be swapped.
//!
//! See <https://photon.komoot.io/>

use serde_json::Value;

use artist_atlas_source::{SourceError, retry};

use crate::GeoResult;

/// Photon API endpoint of the public instance.
const PHOTON_API_URL: &str = "https://photon.komoot.io/api";

/// Geocodes a free-form location query using Photon.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn geocode_freeform(
    client: &reqwest::Client,
    query: &str,
) -> Result<Option<GeoResult>, SourceError> {
    let Some(body) =
        retry::get_json(|| client.get(PHOTON_API_URL).query(&[("q", query), ("limit", "1")]))
            .await?
    else {
        return Ok(None);
    };

    Ok(parse_response(&body, query))
}

/// Parses a Photon `GeoJSON` response, swapping `[lon, lat]`.
fn parse_response(body: &Value, query: &str) -> Option<GeoResult> {
    let first = body.get("features").and_then(Value::as_array)?.first()?;

    let coordinates = first
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array)?;
    let longitude = coordinates.first().and_then(Value::as_f64)?;
    let latitude = coordinates.get(1).and_then(Value::as_f64)?;

    let address_type = first
        .pointer("/properties/type")
        .and_then(Value::as_str)
        .map(String::from);

    Some(GeoResult {
        latitude,
        longitude,
        display_name: query.to_string(),
        address_type,
    })
}
