//! Wikidata SPARQL client.
//!
//! Three fixed-shape queries, each `LIMIT 1` with English labels: person
//! birthplace (P19) or formation location (P740), band formation
//! location, and subdivision capital (P36). Results are plain place
//! labels; geocoding happens downstream.
//!
//! See <https://query.wikidata.org/>

use serde_json::Value;

use crate::{SourceError, retry};

/// Wikidata SPARQL endpoint.
const SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";

/// Escapes a name for interpolation into a SPARQL string literal.
fn escape_literal(name: &str) -> String {
    name.replace('"', "\\\"")
}

/// Birthplace or formation location of a human entity with a matching
/// English label.
fn person_birthplace_query(name: &str) -> String {
    let name = escape_literal(name);
    format!(
        r#"SELECT ?placeLabel WHERE {{
  ?person wdt:P31 wd:Q5 .
  ?person rdfs:label "{name}"@en .
  {{ ?person wdt:P19 ?place . }} UNION {{ ?person wdt:P740 ?place . }}
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en" . }}
}} LIMIT 1"#
    )
}

/// Formation location of a musical-group entity with a matching English
/// label.
fn band_formation_query(name: &str) -> String {
    let name = escape_literal(name);
    format!(
        r#"SELECT ?placeLabel WHERE {{
  ?band wdt:P31 wd:Q215380 .
  ?band rdfs:label "{name}"@en .
  ?band wdt:P740 ?place .
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en" . }}
}} LIMIT 1"#
    )
}

/// Capital city of a named subdivision.
fn subdivision_capital_query(name: &str) -> String {
    let name = escape_literal(name);
    format!(
        r#"SELECT ?capitalLabel WHERE {{
  ?subdivision rdfs:label "{name}"@en .
  ?subdivision wdt:P36 ?capital .
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en" . }}
}} LIMIT 1"#
    )
}

/// Runs a SPARQL query and returns the first binding of `variable`.
#[allow(clippy::future_not_send)]
async fn run_query(
    client: &reqwest::Client,
    sparql: &str,
    variable: &str,
) -> Result<Option<String>, SourceError> {
    let Some(body) = retry::get_json(|| {
        client
            .get(SPARQL_ENDPOINT)
            .query(&[("query", sparql), ("format", "json")])
    })
    .await?
    else {
        return Ok(None);
    };

    Ok(first_binding(&body, variable))
}

/// Extracts the first result binding of `variable` from a SPARQL JSON
/// response.
fn first_binding(body: &Value, variable: &str) -> Option<String> {
    body.pointer("/results/bindings/0")?
        .get(variable)?
        .get("value")?
        .as_str()
        .map(String::from)
}

/// Looks up an artist's birthplace or formation location.
///
/// Tries the person query first and falls back to the band query when it
/// comes back empty.
///
/// # Errors
///
/// Returns [`SourceError`] if a request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn fetch_birthplace(
    client: &reqwest::Client,
    name: &str,
) -> Result<Option<String>, SourceError> {
    if let Some(place) = run_query(client, &person_birthplace_query(name), "placeLabel").await? {
        return Ok(Some(place));
    }
    run_query(client, &band_formation_query(name), "placeLabel").await
}

/// Looks up the capital city of a subdivision.
///
/// # Errors
///
/// Returns [`SourceError`] if a request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn fetch_capital(
    client: &reqwest::Client,
    subdivision: &str,
) -> Result<Option<String>, SourceError> {
    run_query(client, &subdivision_capital_query(subdivision), "capitalLabel").await
}
