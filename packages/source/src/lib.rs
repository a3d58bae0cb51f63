#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Upstream knowledge-base clients for artist origin resolution.
//!
//! Each upstream gets its own module: [`musicbrainz`] for artist search,
//! area hierarchy lookups, and relationship traversal; [`wikipedia`] for
//! infobox scraping; [`wikidata`] for SPARQL birthplace and capital
//! queries. All outbound requests go through [`retry::send_with_retry`]
//! so transient rate limiting is handled uniformly.
//!
//! The public MusicBrainz instance allows roughly one request per second;
//! callers pace themselves via [`musicbrainz::pace`].

pub mod matcher;
pub mod musicbrainz;
pub mod retry;
pub mod wikidata;
pub mod wikipedia;
pub mod wikitext;

/// Errors that can occur while querying upstream knowledge bases.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Builds the shared HTTP client with the project `User-Agent`.
///
/// The Wikimedia and MusicBrainz APIs require a descriptive `User-Agent`
/// with a contact URL; requests with generic agents get throttled.
///
/// # Errors
///
/// Returns [`SourceError`] if the client cannot be constructed.
pub fn build_http_client() -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!(
            "artist-atlas/",
            env!("CARGO_PKG_VERSION"),
            " (https://github.com/artist-atlas/artist-atlas)"
        ))
        .build()?)
}
