#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the artist atlas server.
//!
//! The NDJSON line format is the wire contract with the globe frontend:
//! one `{"artist", "location_name", "location_coord"}` object per line,
//! coordinates as `[lat, lon]` or `null`.

use serde::{Deserialize, Serialize};

use artist_atlas_resolver::ResolvedLocation;

/// Request body for the batch resolve and cache invalidation endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistsRequest {
    /// Artist names to resolve or invalidate.
    pub artists: Option<Vec<String>>,
}

/// One line of the NDJSON response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiArtistLine {
    /// The artist name exactly as it appeared in the request.
    pub artist: String,
    /// Resolved location name, or the `"Unknown"` sentinel.
    pub location_name: String,
    /// `[latitude, longitude]`, or `null`.
    pub location_coord: Option<(f64, f64)>,
}

impl ApiArtistLine {
    /// Builds a line from a resolved location.
    #[must_use]
    pub fn new(artist: &str, location: ResolvedLocation) -> Self {
        Self {
            artist: artist.to_string(),
            location_name: location.location_name,
            location_coord: location.location_coord,
        }
    }
}

/// Response body for the cache invalidation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDeleted {
    /// The artist names whose cache entries were deleted.
    pub deleted: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_serializes_with_wire_keys() {
        let line = ApiArtistLine::new(
            "Taylor Swift",
            ResolvedLocation {
                location_name: "West Reading, United States".to_string(),
                location_coord: Some((40.3354, -75.9263)),
            },
        );
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "artist": "Taylor Swift",
                "location_name": "West Reading, United States",
                "location_coord": [40.3354, -75.9263]
            })
        );
    }

    #[test]
    fn unknown_line_has_null_coordinates() {
        let line = ApiArtistLine::new("Nobody", ResolvedLocation::unknown());
        let json = serde_json::to_string(&line).unwrap();
        assert!(json.contains(r#""location_name":"Unknown""#));
        assert!(json.contains(r#""location_coord":null"#));
    }

    #[test]
    fn request_tolerates_missing_artists_field() {
        let request: ArtistsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.artists.is_none());
    }
}
