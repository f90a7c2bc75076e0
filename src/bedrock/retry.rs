//! Transient-error handling for Bedrock API calls.
//!
//! The client retries connection failures, request timeouts, and gateway
//! errors with capped exponential backoff. Anything else surfaces to the
//! caller unchanged.

use std::time::Duration;

/// Number of attempts made for a request that keeps failing transiently.
pub const DEFAULT_TRANSIENT_RETRIES: u32 = 3;

/// Base delay for exponential backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Cap on any single backoff delay.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Determine if a reqwest error is worth retrying.
///
/// Connection errors, timeouts, and interrupted body transfers are
/// considered transient. Errors carrying a definitive HTTP status are not,
/// with the exception of gateway statuses (502/503/504).
pub fn is_transient(error: &reqwest::Error) -> bool {
    if error.is_connect() || error.is_timeout() || error.is_body() {
        return true;
    }

    if let Some(status) = error.status() {
        return matches!(status.as_u16(), 502 | 503 | 504);
    }

    false
}

/// True when an HTTP status code indicates a temporary server-side problem.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 502 | 503 | 504)
}

/// Parse the Retry-After header value as whole seconds.
///
/// HTTP-date values are ignored; Bedrock sends integer seconds.
pub fn parse_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
}

/// Exponential backoff delay for the given zero-based attempt.
///
/// `min(base * 2^attempt + jitter, max)` where jitter is half the base,
/// capped at 500ms.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter_ms = (base.as_millis() as u64).min(1000) / 2;
    exponential
        .saturating_add(Duration::from_millis(jitter_ms))
        .min(max)
}
