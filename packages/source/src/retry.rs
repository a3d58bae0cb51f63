//! HTTP retry helper for rate-limited upstreams.
//!
//! All upstream clients should use [`get_json`] (or the lower-level
//! [`send_with_retry`]) instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every request gets the
//! same treatment of HTTP 429 and 503.
//!
//! # Usage
//!
//! ```ignore
//! use crate::retry;
//!
//! let body = retry::get_json(|| client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use crate::SourceError;

/// Maximum number of retry attempts for rate-limited requests.
const MAX_RETRIES: u32 = 2;

/// Base delay for the linear backoff between attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Sends an HTTP request, retrying on HTTP 429 and 503.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// Retries up to [`MAX_RETRIES`] times with linear backoff (500 ms,
/// 1,000 ms). Returns `None` when the retries are exhausted. Any other
/// status, success or failure, is returned unmodified for the caller to
/// interpret. Network errors are not retried; upstreams that refuse the
/// connection outright are not coming back within the backoff window.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails at the transport level.
#[allow(clippy::future_not_send)]
pub async fn send_with_retry<F>(build_request: F) -> Result<Option<reqwest::Response>, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = RETRY_BACKOFF * attempt;
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        let response = build_request().send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        {
            if attempt < MAX_RETRIES {
                log::warn!("  HTTP {status} (transient)");
                continue;
            }
            log::warn!("  HTTP {status} after {MAX_RETRIES} retries, giving up");
            return Ok(None);
        }

        return Ok(Some(response));
    }

    Ok(None)
}

/// Sends an HTTP request with retry and parses the body as JSON.
///
/// Returns `None` when the retries were exhausted or the final status was
/// not a success; non-success statuses are logged and treated as upstream
/// misses so the resolver can fall through to its next source.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails at the transport level or
/// a successful response body cannot be parsed as JSON.
#[allow(clippy::future_not_send)]
pub async fn get_json<F>(build_request: F) -> Result<Option<serde_json::Value>, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let Some(response) = send_with_retry(build_request).await? else {
        return Ok(None);
    };

    let status = response.status();
    if !status.is_success() {
        log::warn!("upstream returned HTTP {status}, treating as miss");
        return Ok(None);
    }

    Ok(Some(response.json().await?))
}
