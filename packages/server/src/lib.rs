#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the artist atlas.
//!
//! Serves the NDJSON batch resolve endpoint backing the globe frontend,
//! plus a single-artist path for background re-resolution and a cache
//! invalidation endpoint.
//!
//! ## Optional cache
//!
//! The cache database path comes from `ARTIST_CACHE_DB`. When the
//! variable is not set the server runs cache-less and every request goes
//! through the full resolution pipeline. A cache that fails to open is
//! logged and likewise degrades to cache-less operation.

mod handlers;

use std::path::Path;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{App, HttpServer, middleware, web};

use artist_atlas_cache::LocationCache;

/// Shared application state.
pub struct AppState {
    /// HTTP client shared by every upstream lookup.
    pub client: reqwest::Client,
    /// Resolved-location cache. `None` means cache-less operation.
    pub cache: Option<Arc<LocationCache>>,
}

/// Opens the cache database named by `ARTIST_CACHE_DB`, if any.
fn open_cache_from_env() -> Option<Arc<LocationCache>> {
    let Ok(path) = std::env::var("ARTIST_CACHE_DB") else {
        log::info!("ARTIST_CACHE_DB not set; running cache-less");
        return None;
    };

    match LocationCache::open(Path::new(&path)) {
        Ok(cache) => {
            log::info!("Cache database at {path}");
            Some(Arc::new(cache))
        }
        Err(e) => {
            log::error!("Failed to open cache database at {path}: {e}; running cache-less");
            None
        }
    }
}

/// Starts the artist atlas API server.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if the shared HTTP client cannot be constructed.
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let client = artist_atlas_source::build_http_client().expect("Failed to build HTTP client");
    let cache = open_cache_from_env();

    let state = web::Data::new(AppState { client, cache });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .send_wildcard()
            .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
            .allowed_header(header::CONTENT_TYPE);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/api")
                    .route("/artists", web::post().to(handlers::resolve_artists))
                    .route("/artists/{name}", web::get().to(handlers::resolve_single))
                    .route("/cache", web::delete().to(handlers::invalidate_cache)),
            )
            .default_service(web::route().to(handlers::not_found))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
