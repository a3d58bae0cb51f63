//! Wikipedia infobox scraper.
//!
//! Two-step lookup: search the article index for the query, then fetch
//! the first hit's section-0 wikitext through the parse API and pull the
//! `origin` / `birth_place` / `birthplace` infobox field out of it.
//!
//! See <https://www.mediawiki.org/wiki/API:Search> and
//! <https://www.mediawiki.org/wiki/API:Parsing_wikitext>

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{SourceError, retry, wikitext};

/// MediaWiki action API endpoint for the English Wikipedia.
const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Infobox field patterns, in priority order. Values terminate at a
/// newline or the next field separator.
static FIELD_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\|\s*origin\s*=\s*([^\n|]+)").expect("valid regex"),
        Regex::new(r"(?i)\|\s*birth_place\s*=\s*([^\n|]+)").expect("valid regex"),
        Regex::new(r"(?i)\|\s*birthplace\s*=\s*([^\n|]+)").expect("valid regex"),
    ]
});

/// Looks up an artist's origin in Wikipedia.
///
/// Returns the cleaned infobox location, or `None` when the search comes
/// back empty or no infobox field matches.
///
/// # Errors
///
/// Returns [`SourceError`] if a request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn fetch_origin(
    client: &reqwest::Client,
    query: &str,
) -> Result<Option<String>, SourceError> {
    let Some(body) = retry::get_json(|| {
        client.get(WIKIPEDIA_API_URL).query(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", "1"),
            ("format", "json"),
        ])
    })
    .await?
    else {
        return Ok(None);
    };

    let Some(title) = body
        .pointer("/query/search/0/title")
        .and_then(Value::as_str)
        .map(String::from)
    else {
        return Ok(None);
    };

    let Some(body) = retry::get_json(|| {
        client.get(WIKIPEDIA_API_URL).query(&[
            ("action", "parse"),
            ("page", title.as_str()),
            ("prop", "wikitext"),
            ("section", "0"),
            ("format", "json"),
        ])
    })
    .await?
    else {
        return Ok(None);
    };

    let Some(text) = body.pointer("/parse/wikitext/*").and_then(Value::as_str) else {
        return Ok(None);
    };

    Ok(extract_infobox_location(text))
}

/// Extracts and cleans the first matching infobox location field.
fn extract_infobox_location(text: &str) -> Option<String> {
    for re in FIELD_RES.iter() {
        if let Some(captures) = re.captures(text) {
            let cleaned = wikitext::clean_wikitext_location(&captures[1]);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}
