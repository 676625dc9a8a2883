use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::http::{HttpError, HttpHeaders, header_get};
use crate::platform::Platform;

/// Coarse classification of a [`GitPlatformError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The upstream answered with a non-2xx status.
    Http,
    /// The request never produced a response (DNS, connect, reset).
    Network,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The response body could not be decoded into the expected schema.
    Decode,
    /// Bad input detected locally (identifier, token, payload).
    Validation,
    /// The local sliding-window limiter refused the request.
    LocalRateLimit,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Http => "http",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Decode => "decode",
            ErrorKind::Validation => "validation",
            ErrorKind::LocalRateLimit => "local rate limit",
        };
        f.write_str(s)
    }
}

/// Raw metadata of the upstream response that produced an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status_text: String,
    pub body: String,
    pub headers: HttpHeaders,
}

/// The single error type of this crate.
///
/// Every failure, whether it came from the upstream API, the network, JSON
/// decoding or local validation, crosses the adapter boundary as a
/// `GitPlatformError`. The classification predicates are computed from the
/// status code and message on every call.
#[derive(Debug, Clone, Error)]
#[error("{platform}: {message}")]
pub struct GitPlatformError {
    platform: Platform,
    kind: ErrorKind,
    status: Option<u16>,
    message: String,
    response: Option<UpstreamResponse>,
    retry_after: Option<Duration>,
}

impl GitPlatformError {
    fn new(platform: Platform, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            platform,
            kind,
            status: None,
            message: message.into(),
            response: None,
            retry_after: None,
        }
    }

    /// Wrap a non-2xx upstream response.
    pub fn from_response(platform: Platform, status: u16, headers: HttpHeaders, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body).into_owned();
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status")
            .to_string();

        let detail = upstream_message(&body).unwrap_or_else(|| status_text.clone());
        let retry_after = retry_after_from_headers(&headers, Utc::now());

        Self {
            platform,
            kind: ErrorKind::Http,
            status: Some(status),
            message: format!("API error ({status} {status_text}): {detail}"),
            response: Some(UpstreamResponse {
                status_text,
                body,
                headers,
            }),
            retry_after,
        }
    }

    /// Wrap a transport-level failure.
    pub fn from_http_error(platform: Platform, err: HttpError) -> Self {
        match err {
            HttpError::Timeout => Self::new(platform, ErrorKind::Timeout, "request timed out"),
            other => Self::network(platform, other.to_string()),
        }
    }

    /// Create a network error.
    #[inline]
    pub fn network(platform: Platform, message: impl Into<String>) -> Self {
        Self::new(platform, ErrorKind::Network, message)
    }

    /// Create a timeout error for a request that exceeded `timeout`.
    #[inline]
    pub fn timeout(platform: Platform, timeout: Duration) -> Self {
        Self::new(
            platform,
            ErrorKind::Timeout,
            format!("request timed out after {}ms", timeout.as_millis()),
        )
    }

    /// Create a decode error.
    #[inline]
    pub fn decode(platform: Platform, message: impl Into<String>) -> Self {
        Self::new(
            platform,
            ErrorKind::Decode,
            format!("failed to decode response: {}", message.into()),
        )
    }

    /// Create a validation error.
    #[inline]
    pub fn validation(platform: Platform, message: impl Into<String>) -> Self {
        Self::new(platform, ErrorKind::Validation, message)
    }

    /// Create a not-found error for a resource the upstream reported as absent
    /// without a 404 (e.g. an empty user search).
    #[inline]
    pub fn not_found(platform: Platform, resource: impl Into<String>) -> Self {
        let mut err = Self::new(
            platform,
            ErrorKind::Http,
            format!("not found: {}", resource.into()),
        );
        err.status = Some(404);
        err
    }

    /// Create an error for a request refused by the local rate limiter.
    pub fn local_rate_limit(platform: Platform, retry_after: Duration) -> Self {
        let mut err = Self::new(
            platform,
            ErrorKind::LocalRateLimit,
            format!(
                "local rate limit reached, window frees up in {}ms",
                retry_after.as_millis()
            ),
        );
        err.retry_after = Some(retry_after);
        err
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status, absent for network, timeout and local failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn response(&self) -> Option<&UpstreamResponse> {
        self.response.as_ref()
    }

    /// How long to wait before trying again, when the upstream (or the local
    /// limiter) said so.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Absolute reset time advertised by the provider's rate-limit headers.
    #[must_use]
    pub fn rate_limit_reset(&self) -> Option<DateTime<Utc>> {
        let headers = &self.response.as_ref()?.headers;
        header_get(headers, "x-ratelimit-reset")
            .or_else(|| header_get(headers, "ratelimit-reset"))
            .and_then(parse_epoch)
    }

    /// True for 429, for 403 responses that talk about rate limits, and for
    /// local limiter refusals.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        if self.kind == ErrorKind::LocalRateLimit {
            return true;
        }
        match self.status {
            Some(429) => true,
            Some(403) => {
                let exhausted = self
                    .response
                    .as_ref()
                    .and_then(|r| {
                        header_get(&r.headers, "x-ratelimit-remaining")
                            .or_else(|| header_get(&r.headers, "ratelimit-remaining"))
                    })
                    .is_some_and(|v| v.trim() == "0");
                exhausted || mentions_rate_limit(&self.message)
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status == Some(403) && !self.is_rate_limited()
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s >= 500)
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    /// Whether the transport should try the request again.
    ///
    /// Upstream rate limits, 5xx and connection failures are retryable.
    /// Timeouts, auth failures, 404s, decode and validation errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Network => true,
            ErrorKind::Http => self.is_rate_limited() || self.is_server_error(),
            ErrorKind::Timeout
            | ErrorKind::Decode
            | ErrorKind::Validation
            | ErrorKind::LocalRateLimit => false,
        }
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("rate limit") || lower.contains("ratelimit")
}

/// Pull a human-readable message out of a JSON error body.
///
/// GitHub uses `{"message": ...}`, GitLab uses `message` (string, list or
/// object) or `error`.
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let field = value.get("message").or_else(|| value.get("error"))?;
    match field {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = value.trim().parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Compute the wait advertised by a response.
///
/// `Retry-After` wins (delta-seconds or HTTP date). Otherwise the provider's
/// reset header is used, but only when the quota is actually exhausted.
pub(crate) fn retry_after_from_headers(headers: &HttpHeaders, now: DateTime<Utc>) -> Option<Duration> {
    if let Some(value) = header_get(headers, "retry-after") {
        let value = value.trim();
        if let Ok(secs) = value.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
        if let Ok(at) = DateTime::parse_from_rfc2822(value) {
            let delta = at.with_timezone(&Utc) - now;
            return Some(delta.to_std().unwrap_or(Duration::ZERO));
        }
    }

    let (remaining, reset) = match header_get(headers, "x-ratelimit-reset") {
        Some(reset) => (header_get(headers, "x-ratelimit-remaining"), reset),
        None => (
            header_get(headers, "ratelimit-remaining"),
            header_get(headers, "ratelimit-reset")?,
        ),
    };

    if remaining.is_some_and(|r| r.trim() != "0") {
        return None;
    }

    let reset_at = parse_epoch(reset)?;
    Some((reset_at - now).to_std().unwrap_or(Duration::ZERO))
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which keeps log lines compact
/// when upstream bodies span several lines.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, GitPlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HttpHeaders {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid ts")
    }

    #[test]
    fn not_found_response_is_terminal() {
        let err = GitPlatformError::from_response(
            Platform::GitHub,
            404,
            Vec::new(),
            br#"{"message":"Not Found","documentation_url":"https://docs"}"#,
        );
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(
            err.to_string(),
            "github: API error (404 Not Found): Not Found"
        );
        let response = err.response().expect("response metadata");
        assert_eq!(response.status_text, "Not Found");
        assert!(response.body.contains("documentation_url"));
    }

    #[test]
    fn forbidden_without_rate_limit_wording_is_terminal() {
        let err = GitPlatformError::from_response(
            Platform::GitLab,
            403,
            headers(&[("ratelimit-remaining", "10")]),
            br#"{"message":"403 Forbidden"}"#,
        );
        assert!(err.is_forbidden());
        assert!(!err.is_rate_limited());
        assert!(!err.is_retryable());
    }

    #[test]
    fn forbidden_with_rate_limit_wording_is_rate_limited() {
        let err = GitPlatformError::from_response(
            Platform::GitHub,
            403,
            Vec::new(),
            br#"{"message":"API rate limit exceeded for user ID 1."}"#,
        );
        assert!(err.is_rate_limited());
        assert!(!err.is_forbidden());
        assert!(err.is_retryable());
    }

    #[test]
    fn forbidden_with_exhausted_quota_header_is_rate_limited() {
        let err = GitPlatformError::from_response(
            Platform::GitHub,
            403,
            headers(&[("x-ratelimit-remaining", "0")]),
            b"",
        );
        assert!(err.is_rate_limited());
    }

    #[test]
    fn too_many_requests_uses_retry_after_seconds() {
        let err = GitPlatformError::from_response(
            Platform::GitLab,
            429,
            headers(&[("Retry-After", "7")]),
            br#"{"message":"Retry later"}"#,
        );
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn server_error_is_retryable_and_unauthorized_is_not() {
        let err = GitPlatformError::from_response(Platform::GitHub, 502, Vec::new(), b"bad gateway");
        assert!(err.is_server_error());
        assert!(err.is_retryable());
        assert!(err.message().contains("Bad Gateway"));

        let err = GitPlatformError::from_response(
            Platform::GitHub,
            401,
            Vec::new(),
            br#"{"message":"Bad credentials"}"#,
        );
        assert!(err.is_unauthorized());
        assert!(!err.is_retryable());
    }

    #[test]
    fn gitlab_error_field_is_used_for_message() {
        let err = GitPlatformError::from_response(
            Platform::GitLab,
            401,
            Vec::new(),
            br#"{"error":"invalid_token"}"#,
        );
        assert!(err.message().ends_with("invalid_token"));
    }

    #[test]
    fn network_errors_are_retryable_and_timeouts_are_not() {
        let net = GitPlatformError::from_http_error(
            Platform::GitHub,
            HttpError::Transport("connection reset".into()),
        );
        assert_eq!(net.kind(), ErrorKind::Network);
        assert!(net.is_retryable());
        assert_eq!(net.status(), None);

        let timeout = GitPlatformError::from_http_error(Platform::GitHub, HttpError::Timeout);
        assert!(timeout.is_timeout());
        assert!(!timeout.is_retryable());
    }

    #[test]
    fn validation_and_local_limit_are_not_retried_by_transport() {
        let v = GitPlatformError::validation(Platform::GitHub, "bad repo id");
        assert!(v.is_validation());
        assert!(!v.is_retryable());

        let local = GitPlatformError::local_rate_limit(Platform::GitLab, Duration::from_secs(3));
        assert!(local.is_rate_limited());
        assert!(!local.is_retryable());
        assert_eq!(local.retry_after(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn synthesized_not_found_has_404_status() {
        let err = GitPlatformError::not_found(Platform::GitLab, "user ghost");
        assert!(err.is_not_found());
        assert!(err.response().is_none());
    }

    #[test]
    fn retry_after_from_github_reset_header_when_exhausted() {
        let h = headers(&[
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset", "1700000030"),
        ]);
        assert_eq!(
            retry_after_from_headers(&h, now()),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn retry_after_ignores_reset_while_quota_remains() {
        let h = headers(&[
            ("ratelimit-remaining", "5"),
            ("ratelimit-reset", "1700000030"),
        ]);
        assert_eq!(retry_after_from_headers(&h, now()), None);
    }

    #[test]
    fn retry_after_from_gitlab_reset_header() {
        let h = headers(&[
            ("ratelimit-remaining", "0"),
            ("ratelimit-reset", "1700000010"),
        ]);
        assert_eq!(
            retry_after_from_headers(&h, now()),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn retry_after_reset_in_the_past_is_zero() {
        let h = headers(&[
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset", "1699999990"),
        ]);
        assert_eq!(retry_after_from_headers(&h, now()), Some(Duration::ZERO));
    }

    #[test]
    fn retry_after_http_date() {
        let h = headers(&[("Retry-After", "Tue, 14 Nov 2023 22:14:20 +0000")]);
        assert_eq!(
            retry_after_from_headers(&h, now()),
            Some(Duration::from_secs(1_700_000_060 - 1_700_000_000))
        );
    }

    #[test]
    fn rate_limit_reset_reads_epoch_header() {
        let err = GitPlatformError::from_response(
            Platform::GitHub,
            429,
            headers(&[("x-ratelimit-reset", "1700000000")]),
            b"",
        );
        assert_eq!(err.rate_limit_reset(), Some(now()));
    }

    #[test]
    fn short_error_message_takes_first_line() {
        let err = GitPlatformError::network(Platform::GitHub, "reset\nbacktrace...");
        assert_eq!(short_error_message(&err), "github: reset");
    }
}
