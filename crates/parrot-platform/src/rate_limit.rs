//! Mapping HTTP outcomes onto the retry taxonomy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parrot_core::RequestError;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::Value;

const MAX_BODY_IN_ERROR: usize = 200;

/// Classify a non-success HTTP response.
///
/// 429 is a rate limit (wait from `Retry-After`, else the JSON body's
/// `retry_after`); 5xx and 408 are transient; every other status is permanent.
pub fn classify_response(status: StatusCode, headers: &HeaderMap, body: &str) -> RequestError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = parse_retry_after(headers).or_else(|| body_retry_after(body));
        return RequestError::RateLimited { retry_after };
    }

    let detail = format!("HTTP {status}: {}", truncate(body.trim(), MAX_BODY_IN_ERROR));
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        RequestError::Transient(detail)
    } else {
        RequestError::Permanent(detail)
    }
}

/// Connection, timeout and body-read failures are worth retrying; a request
/// that could not even be built is not.
pub fn classify_transport(err: &reqwest::Error) -> RequestError {
    if err.is_builder() {
        RequestError::Permanent(err.to_string())
    } else {
        RequestError::Transient(err.to_string())
    }
}

/// `Retry-After` as fractional seconds or an HTTP date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = raw.parse::<f64>() {
        return seconds_to_duration(seconds);
    }

    let retry_at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let seconds = (retry_at - Utc::now()).num_seconds().max(0) as u64;
    Some(Duration::from_secs(seconds))
}

fn body_retry_after(body: &str) -> Option<Duration> {
    let value: Value = serde_json::from_str(body).ok()?;
    seconds_to_duration(value.get("retry_after")?.as_f64()?)
}

/// Negative, NaN and out-of-range values are ignored.
fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(seconds).ok()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
