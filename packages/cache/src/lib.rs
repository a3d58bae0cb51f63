#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persistent key-value cache for resolved artist locations.
//!
//! A single flat `SQLite` table keyed by `artist:<lowercased-name>`,
//! storing the JSON-encoded resolved location and an absolute expiry
//! timestamp. Reads skip (and lazily delete) expired rows. Writes use
//! `INSERT OR REPLACE`, so concurrent requests racing on the same key
//! get last-writer-wins semantics; a lost update merely costs a future
//! re-resolve.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};

/// Time-to-live of a cache entry: 30 days.
pub const CACHE_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Database query error.
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error creating the database directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection mutex was poisoned by a panicking thread.
    #[error("Cache connection mutex poisoned")]
    Poisoned,
}

/// Builds the cache key for an artist name.
#[must_use]
pub fn cache_key(artist: &str) -> String {
    format!("artist:{}", artist.trim().to_lowercase())
}

/// `SQLite`-backed location cache.
///
/// `rusqlite::Connection` is `Send` but not `Sync`, so the connection
/// lives behind a `Mutex`. All operations are single short statements.
pub struct LocationCache {
    conn: Mutex<Connection>,
}

impl LocationCache {
    /// Opens (or creates) the cache database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory cannot be created or the
    /// connection or schema creation fails.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens an in-memory cache, for tests.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the connection or schema creation fails.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS location_cache (
                cache_key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Looks up the JSON payload stored under `key`.
    ///
    /// Expired rows are deleted on the way out and reported as misses.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails.
    pub fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT payload, expires_at FROM location_cache WHERE cache_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at <= chrono::Utc::now().timestamp() {
            conn.execute(
                "DELETE FROM location_cache WHERE cache_key = ?1",
                params![key],
            )?;
            return Ok(None);
        }

        Ok(Some(payload))
    }

    /// Stores `payload` under `key` with the given time-to-live.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the insert fails.
    pub fn put(&self, key: &str, payload: &str, ttl_seconds: i64) -> Result<(), CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let expires_at = chrono::Utc::now().timestamp() + ttl_seconds;
        conn.execute(
            "INSERT OR REPLACE INTO location_cache (cache_key, payload, expires_at)
             VALUES (?1, ?2, ?3)",
            params![key, payload, expires_at],
        )?;
        Ok(())
    }

    /// Deletes the entry stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the delete fails.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute(
            "DELETE FROM location_cache WHERE cache_key = ?1",
            params![key],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_lowercases_and_trims() {
        assert_eq!(cache_key("  Taylor Swift "), "artist:taylor swift");
        assert_eq!(cache_key("GREG"), "artist:greg");
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = LocationCache::open_in_memory().unwrap();
        let key = cache_key("Tame Impala");
        cache
            .put(&key, r#"{"location_name":"Perth, Australia"}"#, 60)
            .unwrap();
        assert_eq!(
            cache.get(&key).unwrap().as_deref(),
            Some(r#"{"location_name":"Perth, Australia"}"#)
        );
    }

    #[test]
    fn missing_key_is_a_miss() {
        let cache = LocationCache::open_in_memory().unwrap();
        assert!(cache.get(&cache_key("nobody")).unwrap().is_none());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = LocationCache::open_in_memory().unwrap();
        let key = cache_key("Old Entry");
        cache.put(&key, "{}", -1).unwrap();
        assert!(cache.get(&key).unwrap().is_none());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let cache = LocationCache::open_in_memory().unwrap();
        let key = cache_key("Artist");
        cache.put(&key, "old", 60).unwrap();
        cache.put(&key, "new", 60).unwrap();
        assert_eq!(cache.get(&key).unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn delete_removes_entry() {
        let cache = LocationCache::open_in_memory().unwrap();
        let key = cache_key("Artist1");
        cache.put(&key, "{}", 60).unwrap();
        cache.delete(&key).unwrap();
        assert!(cache.get(&key).unwrap().is_none());
    }

    #[test]
    fn delete_of_missing_key_is_fine() {
        let cache = LocationCache::open_in_memory().unwrap();
        cache.delete(&cache_key("never stored")).unwrap();
    }
}
