#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Artist origin resolution pipeline.
//!
//! One artist name goes in; one [`ResolvedLocation`] comes out. The
//! orchestrator works through a fixed fallback chain (MusicBrainz
//! search, relationship traversal, Wikidata, Wikipedia) and hands every
//! surviving location string to the geocoder cascade. Administrative
//! regions are snapped to their capital city first so the marker lands
//! on a populated place instead of the geographic centre of, say,
//! Western Australia.
//!
//! The pipeline is deliberately sequential: the upstreams cap out at
//! roughly one request per second each, so in-request fan-out would only
//! trade latency for retries.

pub mod area;

use serde::{Deserialize, Serialize};

use artist_atlas_geocoder::{GeoResult, geocode_location};
use artist_atlas_source::musicbrainz::{self, AreaContext, ArtistSearch};
use artist_atlas_source::{SourceError, wikidata, wikipedia};

/// A resolved artist origin in its cached, wire-level form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// Human-readable location, `"City, Country"` when possible.
    pub location_name: String,
    /// `[latitude, longitude]`, absent when geocoding failed.
    pub location_coord: Option<(f64, f64)>,
}

impl ResolvedLocation {
    /// Sentinel name for artists whose origin could not be determined.
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    /// The terminal "could not resolve" sentinel.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            location_name: Self::UNKNOWN_NAME.to_string(),
            location_coord: None,
        }
    }

    /// Whether this is the Unknown sentinel.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.location_name == Self::UNKNOWN_NAME
    }

    /// Whether this entry can be served as-is: it either has coordinates
    /// or is the Unknown sentinel.
    #[must_use]
    pub fn is_serviceable(&self) -> bool {
        self.location_coord.is_some() || self.is_unknown()
    }

    /// A named location that never got coordinates; eligible for a
    /// geocoding retry.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.location_coord.is_none() && !self.is_unknown()
    }

    fn from_geocode(geo: &GeoResult) -> Self {
        Self {
            location_name: geo.display_name.clone(),
            location_coord: Some((geo.latitude, geo.longitude)),
        }
    }

    fn named_only(location_name: &str) -> Self {
        Self {
            location_name: location_name.to_string(),
            location_coord: None,
        }
    }
}

/// Resolves an artist name to its geographic origin.
///
/// The fallback chain, with early exits:
///
/// 1. MusicBrainz search. Candidates that all failed the name gate
///    terminate at Unknown; trusting encyclopedic fallbacks there tends
///    to surface famous homonyms.
/// 2. A city-level MusicBrainz area geocodes directly.
/// 3. "Is person" relationship traversal, for performance names.
/// 4. An exact-match candidate with no area at all terminates at Unknown
///    (same homonym guard).
/// 5. Wikidata birthplace / formation location.
/// 6. Wikipedia infobox, with the capital snap for non-city results.
/// 7. Whatever MusicBrainz area remains, even country-level.
///
/// # Errors
///
/// Returns [`SourceError`] if an upstream request fails at the transport
/// level. Upstream misses are not errors; they fall through the chain.
#[allow(clippy::future_not_send)]
pub async fn resolve_artist(
    client: &reqwest::Client,
    name: &str,
) -> Result<ResolvedLocation, SourceError> {
    musicbrainz::pace().await;

    let candidate = match musicbrainz::search_artist(client, name).await? {
        ArtistSearch::AllRejected => {
            log::info!("{name}: all search candidates rejected by the name gate");
            return Ok(ResolvedLocation::unknown());
        }
        ArtistSearch::NoCandidates => None,
        ArtistSearch::Candidate(candidate) => Some(candidate),
    };

    let best_area = candidate
        .as_ref()
        .and_then(|c| area::choose_best_area(c.begin_area.clone(), c.area.clone()));

    if let Some(found) = &best_area {
        if area::is_city_level(found.area_type.as_deref()) {
            return geocode_musicbrainz_area(client, found).await;
        }
    }

    // Performance names ("Keli Holiday") carry no area of their own but
    // link to the person behind them.
    if let Some(candidate) = &candidate {
        if let Some(person) =
            musicbrainz::fetch_location_via_relationships(client, &candidate.mbid).await?
        {
            if let Some(found) = area::choose_best_area(person.begin_area, person.area) {
                if area::is_city_level(found.area_type.as_deref()) {
                    return geocode_musicbrainz_area(client, &found).await;
                }
            }
        }
    }

    if candidate.as_ref().is_some_and(|candidate| {
        candidate.exact_match && candidate.begin_area.is_none() && candidate.area.is_none()
    }) {
        log::info!("{name}: exact match without area, not consulting encyclopedic sources");
        return Ok(ResolvedLocation::unknown());
    }

    if let Some(place) = wikidata::fetch_birthplace(client, name).await? {
        return geocode_label(client, &place).await;
    }

    for query in [
        format!("{name} musician"),
        format!("{name} band"),
        name.to_string(),
    ] {
        if let Some(origin) = wikipedia::fetch_origin(client, &query).await? {
            return resolve_wikipedia_origin(client, &origin).await;
        }
    }

    if let Some(found) = &best_area {
        return geocode_musicbrainz_area(client, found).await;
    }

    Ok(ResolvedLocation::unknown())
}

/// Geocodes a MusicBrainz area with its hierarchy context.
///
/// Subdivisions snap to their capital city first. Everything else walks
/// the query attempts from most to least specific.
#[allow(clippy::future_not_send)]
async fn geocode_musicbrainz_area(
    client: &reqwest::Client,
    found: &musicbrainz::Area,
) -> Result<ResolvedLocation, SourceError> {
    let context = musicbrainz::resolve_area_context(client, &found.id).await?;

    if found.area_type.as_deref() == Some("Subdivision") {
        if let Some(capital) = wikidata::fetch_capital(client, &found.name).await? {
            let query = context.country.as_ref().map_or_else(
                || capital.clone(),
                |country| format!("{capital}, {country}"),
            );
            if let Some(geo) = geocode_location(client, &query).await? {
                return Ok(ResolvedLocation::from_geocode(&geo));
            }
        }
    }

    for query in area_query_attempts(&found.name, &context) {
        if let Some(geo) = geocode_location(client, &query).await? {
            return Ok(ResolvedLocation::from_geocode(&geo));
        }
    }

    Ok(ResolvedLocation::named_only(&full_area_string(
        &found.name,
        &context,
    )))
}

/// Query strings for an area, most specific first.
fn area_query_attempts(name: &str, context: &AreaContext) -> Vec<String> {
    let mut attempts = Vec::new();
    if let (Some(subdivision), Some(country)) = (&context.subdivision, &context.country) {
        attempts.push(format!("{name}, {subdivision}, {country}"));
    }
    if let Some(subdivision) = &context.subdivision {
        attempts.push(format!("{name}, {subdivision}"));
    }
    if let Some(country) = &context.country {
        attempts.push(format!("{name}, {country}"));
    }
    attempts.push(name.to_string());
    attempts
}

/// The fullest location string for an area, used when every geocode
/// attempt failed.
fn full_area_string(name: &str, context: &AreaContext) -> String {
    let mut segments = vec![name.to_string()];
    segments.extend(context.subdivision.clone());
    segments.extend(context.country.clone());
    segments.join(", ")
}

/// Geocodes a bare place label from Wikidata.
#[allow(clippy::future_not_send)]
async fn geocode_label(
    client: &reqwest::Client,
    label: &str,
) -> Result<ResolvedLocation, SourceError> {
    Ok(geocode_location(client, label).await?.map_or_else(
        || ResolvedLocation::named_only(label),
        |geo| ResolvedLocation::from_geocode(&geo),
    ))
}

/// Geocodes a Wikipedia infobox origin, applying the capital snap when
/// the direct geocode is missing or not city-level.
///
/// The first comma segment is treated as a putative subdivision; its
/// Wikidata capital, prefixed onto the original string, usually geocodes
/// to the populated place the infobox meant.
#[allow(clippy::future_not_send)]
async fn resolve_wikipedia_origin(
    client: &reqwest::Client,
    origin: &str,
) -> Result<ResolvedLocation, SourceError> {
    let direct = geocode_location(client, origin).await?;

    let needs_snap = direct.as_ref().map_or(true, |geo| !geo.is_city_level());
    if needs_snap {
        let subdivision = origin.split(',').next().unwrap_or(origin).trim();
        if !subdivision.is_empty() {
            if let Some(capital) = wikidata::fetch_capital(client, subdivision).await? {
                let snapped = geocode_location(client, &format!("{capital}, {origin}")).await?;
                if let Some(geo) = snapped {
                    return Ok(ResolvedLocation::from_geocode(&geo));
                }
            }
        }
    }

    Ok(direct.map_or_else(
        || ResolvedLocation::named_only(origin),
        |geo| ResolvedLocation::from_geocode(&geo),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sentinel_is_serviceable_but_not_partial() {
        let unknown = ResolvedLocation::unknown();
        assert!(unknown.is_unknown());
        assert!(unknown.is_serviceable());
        assert!(!unknown.is_partial());
    }

    #[test]
    fn named_entry_without_coordinates_is_partial() {
        let partial = ResolvedLocation::named_only("Smalltown, Nowhere");
        assert!(partial.is_partial());
        assert!(!partial.is_serviceable());
    }

    #[test]
    fn coordinates_make_an_entry_serviceable() {
        let resolved = ResolvedLocation {
            location_name: "Perth, Australia".to_string(),
            location_coord: Some((-31.95, 115.86)),
        };
        assert!(resolved.is_serviceable());
        assert!(!resolved.is_partial());
    }

    #[test]
    fn serializes_coordinates_as_array() {
        let resolved = ResolvedLocation {
            location_name: "West Reading, United States".to_string(),
            location_coord: Some((40.3354, -75.9263)),
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "location_name": "West Reading, United States",
                "location_coord": [40.3354, -75.9263]
            })
        );
    }

    #[test]
    fn unknown_round_trips_through_json() {
        let json = serde_json::to_string(&ResolvedLocation::unknown()).unwrap();
        let back: ResolvedLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ResolvedLocation::unknown());
        assert!(json.contains("null"));
    }

    #[test]
    fn area_attempts_run_most_to_least_specific() {
        let context = AreaContext {
            country: Some("Australia".to_string()),
            subdivision: Some("Western Australia".to_string()),
        };
        assert_eq!(
            area_query_attempts("Fremantle", &context),
            vec![
                "Fremantle, Western Australia, Australia",
                "Fremantle, Western Australia",
                "Fremantle, Australia",
                "Fremantle",
            ]
        );
    }

    #[test]
    fn area_attempts_without_context_is_bare_name() {
        assert_eq!(
            area_query_attempts("Atlantis", &AreaContext::default()),
            vec!["Atlantis"]
        );
    }

    #[test]
    fn full_area_string_joins_present_segments() {
        let context = AreaContext {
            country: Some("Australia".to_string()),
            subdivision: None,
        };
        assert_eq!(full_area_string("Perth", &context), "Perth, Australia");
        assert_eq!(full_area_string("Perth", &AreaContext::default()), "Perth");
    }
}
