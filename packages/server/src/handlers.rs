//! HTTP handler functions for the artist atlas API.

use actix_web::{HttpResponse, web};
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::ReceiverStream;

use artist_atlas_cache::{CACHE_TTL_SECONDS, LocationCache, cache_key};
use artist_atlas_geocoder::geocode_location;
use artist_atlas_resolver::{ResolvedLocation, resolve_artist};
use artist_atlas_server_models::{ApiArtistLine, ApiDeleted, ArtistsRequest};

use crate::AppState;

/// Maximum number of artists accepted per batch request.
const MAX_BATCH_SIZE: usize = 50;

/// Pause between successive uncached resolves, spreading load across the
/// upstreams.
const INTER_RESOLVE_SLEEP: std::time::Duration = std::time::Duration::from_millis(500);

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

/// Fallback for unknown routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/plain")
        .body("Not Found")
}

/// `POST /api/artists`
///
/// Streams one NDJSON line per requested artist: serviceable cached
/// results first, then fresh resolves in input order, each written back
/// to the cache as it completes. A failed resolve closes the stream;
/// lines already emitted remain valid.
pub async fn resolve_artists(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let Some(artists) = parse_artists_request(&body) else {
        return invalid_artists_response();
    };
    let artists: Vec<String> = artists.into_iter().take(MAX_BATCH_SIZE).collect();

    // Pre-check the cache so everything already known is flushed before
    // the first slow resolve starts.
    let mut cached: Vec<ApiArtistLine> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    for artist in artists {
        match lookup_serviceable(state.cache.as_deref(), &artist) {
            Some(location) => cached.push(ApiArtistLine::new(&artist, location)),
            None => pending.push(artist),
        }
    }

    let client = state.client.clone();
    let cache = state.cache.clone();
    let (tx, rx) = mpsc::channel::<web::Bytes>(1);

    actix_web::rt::spawn(async move {
        for line in cached {
            if !send_line(&tx, &line).await {
                return;
            }
        }

        for (index, artist) in pending.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(INTER_RESOLVE_SLEEP).await;
            }

            match resolve_artist(&client, &artist).await {
                Ok(location) => {
                    if let Some(cache) = &cache {
                        store_location(cache, &artist, &location);
                    }
                    if !send_line(&tx, &ApiArtistLine::new(&artist, location)).await {
                        log::info!("client disconnected, aborting batch");
                        return;
                    }
                }
                Err(e) => {
                    // Lines already emitted stay valid; the client sees a
                    // truncated stream.
                    log::error!("Failed to resolve {artist}: {e}");
                    return;
                }
            }
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<web::Bytes, std::convert::Infallible>);
    HttpResponse::Ok()
        .content_type("application/x-ndjson")
        .streaming(stream)
}

/// `GET /api/artists/{name}`
///
/// Single-artist path used for background re-resolution. Serviceable
/// cache hits are returned as-is. Partial hits (a name that never got
/// coordinates) get their geocoding retried and, on success, the
/// upgraded entry is persisted. Misses run the full pipeline.
pub async fn resolve_single(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let artist = path.into_inner();

    if let Some(entry) = lookup_entry(state.cache.as_deref(), &artist) {
        if entry.is_serviceable() {
            return HttpResponse::Ok().json(ApiArtistLine::new(&artist, entry));
        }

        // Partial entry: the upstream chain once produced a name but the
        // geocoders missed. Try them again.
        match geocode_location(&state.client, &entry.location_name).await {
            Ok(Some(geo)) => {
                let upgraded = ResolvedLocation {
                    location_name: geo.display_name.clone(),
                    location_coord: Some((geo.latitude, geo.longitude)),
                };
                if let Some(cache) = &state.cache {
                    store_location(cache, &artist, &upgraded);
                }
                return HttpResponse::Ok().json(ApiArtistLine::new(&artist, upgraded));
            }
            Ok(None) => {
                return HttpResponse::Ok().json(ApiArtistLine::new(&artist, entry));
            }
            Err(e) => {
                log::error!("Geocode retry failed for {artist}: {e}");
                return HttpResponse::Ok().json(ApiArtistLine::new(&artist, entry));
            }
        }
    }

    match resolve_artist(&state.client, &artist).await {
        Ok(location) => {
            if let Some(cache) = &state.cache {
                store_location(cache, &artist, &location);
            }
            HttpResponse::Ok().json(ApiArtistLine::new(&artist, location))
        }
        Err(e) => {
            log::error!("Failed to resolve {artist}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to resolve artist"
            }))
        }
    }
}

/// `DELETE /api/cache`
///
/// Deletes the cache entries for the given artist names.
pub async fn invalidate_cache(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let Some(artists) = parse_artists_request(&body) else {
        return invalid_artists_response();
    };

    if let Some(cache) = &state.cache {
        for artist in &artists {
            if let Err(e) = cache.delete(&cache_key(artist)) {
                log::error!("Failed to delete cache entry for {artist}: {e}");
            }
        }
    }

    HttpResponse::Ok().json(ApiDeleted { deleted: artists })
}

/// Parses the request body, requiring a non-empty `artists` array.
fn parse_artists_request(body: &[u8]) -> Option<Vec<String>> {
    serde_json::from_slice::<ArtistsRequest>(body)
        .ok()?
        .artists
        .filter(|artists| !artists.is_empty())
}

fn invalid_artists_response() -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": "Invalid artists array"
    }))
}

/// Reads an artist's cache entry, treating read and decode failures as
/// misses.
fn lookup_entry(cache: Option<&LocationCache>, artist: &str) -> Option<ResolvedLocation> {
    let payload = match cache?.get(&cache_key(artist)) {
        Ok(payload) => payload?,
        Err(e) => {
            log::error!("Cache read failed for {artist}: {e}");
            return None;
        }
    };

    match serde_json::from_str(&payload) {
        Ok(entry) => Some(entry),
        Err(e) => {
            log::error!("Corrupt cache entry for {artist}: {e}");
            None
        }
    }
}

/// Reads an artist's cache entry, returning it only when it can be
/// served as-is. Partial entries are misses here; the batch path
/// re-resolves them from scratch.
fn lookup_serviceable(cache: Option<&LocationCache>, artist: &str) -> Option<ResolvedLocation> {
    lookup_entry(cache, artist).filter(ResolvedLocation::is_serviceable)
}

/// Writes a resolved location back to the cache. Write failures are
/// logged and do not affect the response.
fn store_location(cache: &LocationCache, artist: &str, location: &ResolvedLocation) {
    match serde_json::to_string(location) {
        Ok(payload) => {
            if let Err(e) = cache.put(&cache_key(artist), &payload, CACHE_TTL_SECONDS) {
                log::error!("Cache write failed for {artist}: {e}");
            }
        }
        Err(e) => log::error!("Failed to serialize location for {artist}: {e}"),
    }
}

/// Sends one NDJSON line down the stream. Returns `false` when the
/// client has gone away.
async fn send_line(tx: &mpsc::Sender<web::Bytes>, line: &ApiArtistLine) -> bool {
    let Ok(json) = serde_json::to_string(line) else {
        return true;
    };
    tx.send(web::Bytes::from(format!("{json}\n"))).await.is_ok()
}
