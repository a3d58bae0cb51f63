//! MusicBrainz web service client.
//!
//! Three operations feed the resolver: artist search with the
//! name-verification gate, area hierarchy walks that derive a country and
//! subdivision for an area id, and "is person" relationship traversal
//! that resolves performance names to the underlying person.
//!
//! The public instance allows **1 request per second**; see
//! <https://musicbrainz.org/doc/MusicBrainz_API/Rate_Limiting>. Area and
//! relationship lookups pace themselves via [`pace`]; search callers are
//! expected to call [`pace`] before each search.

use serde_json::Value;

use crate::{SourceError, matcher, retry};

/// Base URL of the MusicBrainz web service.
const MB_BASE_URL: &str = "https://musicbrainz.org/ws/2";

/// Minimum search score for a candidate to be considered at all.
const MIN_SEARCH_SCORE: u64 = 70;

/// Maximum number of backward "part of" hops when walking an area
/// hierarchy. The data is not guaranteed to be a DAG.
const MAX_PARENT_DEPTH: u32 = 5;

/// Gap between successive requests against the public instance.
const REQUEST_PACE: std::time::Duration = std::time::Duration::from_millis(1100);

/// Relationship type id linking a performance name to the person behind
/// it ("is person").
const PERSON_RELATIONSHIP_TYPE_ID: &str = "dd9886f2-1dfe-4270-97db-283f6839a666";

/// An administrative area attached to an artist or another area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    /// MusicBrainz area id.
    pub id: String,
    /// Area name (e.g., "West Reading").
    pub name: String,
    /// Area type (e.g., "City", "Subdivision", "Country"), when known.
    pub area_type: Option<String>,
}

/// Country and subdivision names derived by walking an area hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaContext {
    /// Enclosing country name, when one was found.
    pub country: Option<String>,
    /// Enclosing first-order subdivision name, when one was found.
    pub subdivision: Option<String>,
}

/// The artist candidate that survived the score and name gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistCandidate {
    /// MusicBrainz artist id.
    pub mbid: String,
    /// Candidate name as returned by the search.
    pub name: String,
    /// Where the artist was born / founded, when known.
    pub begin_area: Option<Area>,
    /// The artist's main area (frequently the country), when known.
    pub area: Option<Area>,
    /// Whether the candidate name equals the query exactly.
    pub exact_match: bool,
}

/// Outcome of an artist search.
///
/// The resolver needs to distinguish "nothing came back" (encyclopedic
/// fallbacks are worth trying) from "candidates came back but none
/// survived the gate" (fallbacks would surface famous homonyms).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtistSearch {
    /// The search returned no candidates at all.
    NoCandidates,
    /// Every returned candidate was rejected by the score or name gate.
    AllRejected,
    /// The first candidate that survived both gates.
    Candidate(ArtistCandidate),
}

/// Raw area fields of the person behind a performance name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonAreas {
    /// The person's begin area, when known.
    pub begin_area: Option<Area>,
    /// The person's main area, when known.
    pub area: Option<Area>,
}

/// Sleeps for the per-request pacing interval.
pub async fn pace() {
    tokio::time::sleep(REQUEST_PACE).await;
}

/// Searches for an artist by name and applies the candidate gates.
///
/// Issues a quoted phrase query with limit 5 and walks the candidates in
/// returned order, skipping any with score below 70 or failing
/// [`matcher::verify_artist_match`] against the sort name (falling back
/// to the display name). The caller is responsible for pacing.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn search_artist(
    client: &reqwest::Client,
    name: &str,
) -> Result<ArtistSearch, SourceError> {
    let url = format!("{MB_BASE_URL}/artist");
    let query = format!("\"{name}\"");

    let Some(body) = retry::get_json(|| {
        client.get(&url).query(&[
            ("query", query.as_str()),
            ("fmt", "json"),
            ("limit", "5"),
        ])
    })
    .await?
    else {
        return Ok(ArtistSearch::NoCandidates);
    };

    Ok(pick_candidate(name, &body))
}

/// Walks the search candidates and returns the first that survives the
/// score and name gates.
fn pick_candidate(query: &str, body: &Value) -> ArtistSearch {
    let candidates = body
        .get("artists")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if candidates.is_empty() {
        return ArtistSearch::NoCandidates;
    }

    for candidate in candidates {
        let score = candidate.get("score").and_then(Value::as_u64).unwrap_or(0);
        if score < MIN_SEARCH_SCORE {
            continue;
        }

        let name = candidate.get("name").and_then(Value::as_str).unwrap_or("");
        let gate_name = candidate
            .get("sort-name")
            .and_then(Value::as_str)
            .unwrap_or(name);
        if !matcher::verify_artist_match(query, gate_name) {
            continue;
        }

        let Some(mbid) = candidate.get("id").and_then(Value::as_str) else {
            continue;
        };

        return ArtistSearch::Candidate(ArtistCandidate {
            mbid: mbid.to_string(),
            name: name.to_string(),
            begin_area: parse_area(candidate.get("begin-area")),
            area: parse_area(candidate.get("area")),
            exact_match: matcher::is_exact_match(query, name),
        });
    }

    ArtistSearch::AllRejected
}

/// Parses an embedded area object into an [`Area`].
fn parse_area(value: Option<&Value>) -> Option<Area> {
    let value = value?;
    let id = value.get("id").and_then(Value::as_str)?;
    let name = value.get("name").and_then(Value::as_str)?;
    Some(Area {
        id: id.to_string(),
        name: name.to_string(),
        area_type: value
            .get("type")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

/// One step of the area hierarchy walk.
#[derive(Debug, PartialEq, Eq)]
enum AreaStep {
    /// A country (and possibly subdivision) was derived.
    Resolved(AreaContext),
    /// No parent carries ISO codes; continue with this parent id.
    Recurse(String),
    /// The hierarchy ends without reaching a coded area.
    Dead,
}

/// Derives the country and subdivision for a MusicBrainz area id.
///
/// Fetches the area with its backward "part of" relationships. An area
/// that itself carries ISO 3166-1 codes is a country. Otherwise each
/// backward parent is inspected: ISO 3166-1 codes name the country
/// directly; ISO 3166-2 codes yield the country from their first two
/// characters and, for `Subdivision`-typed parents, the subdivision name.
/// When no parent carries codes the walk recurses into the first parent,
/// bounded by [`MAX_PARENT_DEPTH`].
///
/// Pacing is built in: each request is preceded by [`pace`].
///
/// # Errors
///
/// Returns [`SourceError`] if a request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn resolve_area_context(
    client: &reqwest::Client,
    area_id: &str,
) -> Result<AreaContext, SourceError> {
    let mut current = area_id.to_string();

    for _ in 0..=MAX_PARENT_DEPTH {
        pace().await;

        let url = format!("{MB_BASE_URL}/area/{current}");
        let Some(body) =
            retry::get_json(|| client.get(&url).query(&[("inc", "area-rels"), ("fmt", "json")]))
                .await?
        else {
            return Ok(AreaContext::default());
        };

        match classify_area(&body) {
            AreaStep::Resolved(context) => return Ok(context),
            AreaStep::Recurse(parent_id) => current = parent_id,
            AreaStep::Dead => return Ok(AreaContext::default()),
        }
    }

    Ok(AreaContext::default())
}

/// Classifies one area document of the hierarchy walk.
fn classify_area(body: &Value) -> AreaStep {
    if let Some(code) = iso_3166_1_code(body) {
        return AreaStep::Resolved(AreaContext {
            country: country_name(code),
            subdivision: None,
        });
    }

    let parents: Vec<&Value> = body
        .get("relations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter(|rel| {
            rel.get("type").and_then(Value::as_str) == Some("part of")
                && rel.get("direction").and_then(Value::as_str) == Some("backward")
        })
        .filter_map(|rel| rel.get("area"))
        .collect();

    for parent in &parents {
        let subdivision = (parent.get("type").and_then(Value::as_str) == Some("Subdivision"))
            .then(|| parent.get("name").and_then(Value::as_str))
            .flatten()
            .map(String::from);

        if let Some(code) = iso_3166_1_code(parent) {
            return AreaStep::Resolved(AreaContext {
                country: country_name(code),
                subdivision,
            });
        }

        // ISO 3166-2 codes ("AU-WA") are a last-resort country source:
        // the first two characters are the country code.
        if let Some(code) = parent
            .get("iso-3166-2-codes")
            .and_then(Value::as_array)
            .and_then(|codes| codes.first())
            .and_then(Value::as_str)
        {
            return AreaStep::Resolved(AreaContext {
                country: country_name(code.get(..2).unwrap_or(code)),
                subdivision,
            });
        }
    }

    parents
        .first()
        .and_then(|parent| parent.get("id").and_then(Value::as_str))
        .map_or(AreaStep::Dead, |id| AreaStep::Recurse(id.to_string()))
}

/// First ISO 3166-1 code attached to an area document, if any.
fn iso_3166_1_code(value: &Value) -> Option<&str> {
    value
        .get("iso-3166-1-codes")
        .and_then(Value::as_array)
        .and_then(|codes| codes.first())
        .and_then(Value::as_str)
}

/// English country name for an ISO 3166-1 alpha-2 code.
fn country_name(code: &str) -> Option<String> {
    isocountry::CountryCode::for_alpha2(code)
        .ok()
        .map(|country| country.name().to_string())
}

/// Resolves a performance name to the underlying person's areas.
///
/// Fetches the artist with its artist relationships, looks for the
/// "is person" relationship, and follows it with a fresh artist lookup.
/// Returns `None` when no such relationship exists.
///
/// Pacing is built in: each request is preceded by [`pace`].
///
/// # Errors
///
/// Returns [`SourceError`] if a request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn fetch_location_via_relationships(
    client: &reqwest::Client,
    mbid: &str,
) -> Result<Option<PersonAreas>, SourceError> {
    pace().await;

    let url = format!("{MB_BASE_URL}/artist/{mbid}");
    let Some(body) =
        retry::get_json(|| client.get(&url).query(&[("inc", "artist-rels"), ("fmt", "json")]))
            .await?
    else {
        return Ok(None);
    };

    let Some(person_id) = find_person_relationship(&body) else {
        return Ok(None);
    };

    pace().await;

    let url = format!("{MB_BASE_URL}/artist/{person_id}");
    let Some(body) = retry::get_json(|| client.get(&url).query(&[("fmt", "json")])).await? else {
        return Ok(None);
    };

    Ok(Some(PersonAreas {
        begin_area: parse_area(body.get("begin-area")),
        area: parse_area(body.get("area")),
    }))
}

/// Finds the artist id on the other end of the "is person" relationship.
fn find_person_relationship(body: &Value) -> Option<String> {
    body.get("relations")
        .and_then(Value::as_array)?
        .iter()
        .find(|rel| {
            rel.get("type-id").and_then(Value::as_str) == Some(PERSON_RELATIONSHIP_TYPE_ID)
        })
        .and_then(|rel| rel.pointer("/artist/id"))
        .and_then(Value::as_str)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_surviving_candidate() {
        let body = serde_json::json!({
            "artists": [
                {
                    "id": "low-score",
                    "name": "Taylor Swift Tribute",
                    "sort-name": "Taylor Swift Tribute",
                    "score": 45
                },
                {
                    "id": "20244d07-534f-4eff-b4d4-930878889970",
                    "name": "Taylor Swift",
                    "sort-name": "Swift, Taylor",
                    "score": 100,
                    "begin-area": {
                        "id": "3c2a8af0",
                        "name": "West Reading",
                        "type": "City"
                    },
                    "area": {
                        "id": "489ce91b",
                        "name": "United States",
                        "type": "Country"
                    }
                }
            ]
        });

        let ArtistSearch::Candidate(candidate) = pick_candidate("Taylor Swift", &body) else {
            panic!("expected a candidate");
        };
        assert_eq!(candidate.mbid, "20244d07-534f-4eff-b4d4-930878889970");
        assert_eq!(candidate.begin_area.as_ref().unwrap().name, "West Reading");
        assert_eq!(
            candidate.area.as_ref().unwrap().area_type.as_deref(),
            Some("Country")
        );
        assert!(candidate.exact_match);
    }

    #[test]
    fn rejects_single_word_partial_match() {
        let body = serde_json::json!({
            "artists": [{
                "id": "abc",
                "name": "Greg Brown",
                "sort-name": "Brown, Greg",
                "score": 100
            }]
        });
        assert_eq!(pick_candidate("GREG", &body), ArtistSearch::AllRejected);
    }

    #[test]
    fn empty_search_is_no_candidates() {
        let body = serde_json::json!({ "artists": [] });
        assert_eq!(
            pick_candidate("Completely Unknown Artist XYZ123", &body),
            ArtistSearch::NoCandidates
        );
    }

    #[test]
    fn exact_match_without_area_is_flagged() {
        let body = serde_json::json!({
            "artists": [{
                "id": "def",
                "name": "Keli Holiday",
                "sort-name": "Holiday, Keli",
                "score": 100
            }]
        });
        let ArtistSearch::Candidate(candidate) = pick_candidate("Keli Holiday", &body) else {
            panic!("expected a candidate");
        };
        assert!(candidate.exact_match);
        assert!(candidate.begin_area.is_none());
        assert!(candidate.area.is_none());
    }

    #[test]
    fn classifies_country_area() {
        let body = serde_json::json!({
            "id": "489ce91b",
            "name": "United States",
            "type": "Country",
            "iso-3166-1-codes": ["US"]
        });
        let AreaStep::Resolved(context) = classify_area(&body) else {
            panic!("expected a resolved context");
        };
        assert_eq!(context.country.as_deref(), Some("United States of America"));
        assert!(context.subdivision.is_none());
    }

    #[test]
    fn classifies_subdivision_parent_via_iso_3166_2() {
        let body = serde_json::json!({
            "id": "perth",
            "name": "Perth",
            "type": "City",
            "relations": [{
                "type": "part of",
                "direction": "backward",
                "area": {
                    "id": "wa",
                    "name": "Western Australia",
                    "type": "Subdivision",
                    "iso-3166-2-codes": ["AU-WA"]
                }
            }]
        });
        let AreaStep::Resolved(context) = classify_area(&body) else {
            panic!("expected a resolved context");
        };
        assert_eq!(context.country.as_deref(), Some("Australia"));
        assert_eq!(context.subdivision.as_deref(), Some("Western Australia"));
    }

    #[test]
    fn recurses_into_uncoded_parent() {
        let body = serde_json::json!({
            "id": "suburb",
            "name": "Some Suburb",
            "relations": [{
                "type": "part of",
                "direction": "backward",
                "area": { "id": "metro", "name": "Metro Region", "type": "District" }
            }]
        });
        assert_eq!(classify_area(&body), AreaStep::Recurse("metro".to_string()));
    }

    #[test]
    fn dead_ends_without_parents() {
        let body = serde_json::json!({ "id": "island", "name": "Nowhere" });
        assert_eq!(classify_area(&body), AreaStep::Dead);
    }

    #[test]
    fn ignores_forward_relations() {
        let body = serde_json::json!({
            "id": "state",
            "name": "Some State",
            "relations": [{
                "type": "part of",
                "direction": "forward",
                "area": { "id": "child", "name": "Child City", "type": "City" }
            }]
        });
        assert_eq!(classify_area(&body), AreaStep::Dead);
    }

    #[test]
    fn finds_person_relationship() {
        let body = serde_json::json!({
            "relations": [
                {
                    "type-id": "5be4c609-9afa-4ea0-910b-12ffb71e3821",
                    "artist": { "id": "not-this-one" }
                },
                {
                    "type-id": "dd9886f2-1dfe-4270-97db-283f6839a666",
                    "artist": { "id": "adam-hyde" }
                }
            ]
        });
        assert_eq!(
            find_person_relationship(&body).as_deref(),
            Some("adam-hyde")
        );
    }

    #[test]
    fn missing_person_relationship_is_none() {
        let body = serde_json::json!({ "relations": [] });
        assert!(find_person_relationship(&body).is_none());
    }
}
