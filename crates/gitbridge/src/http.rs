//! Raw HTTP boundary.
//!
//! Everything above this module speaks [`HttpRequest`]/[`HttpResponse`];
//! only [`ReqwestTransport`] knows about sockets. Tests swap in
//! [`MockTransport`] (behind the `test-support` feature for integration
//! tests).

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header name/value pairs in wire order. Lookups ignore case.
pub type HttpHeaders = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body and the matching content type.
    #[must_use]
    pub fn json_body(self, body: Vec<u8>) -> Self {
        let mut request = self.header("Content-Type", "application/json");
        request.body = body;
        request
    }

    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with a JSON body.
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.into().into_bytes(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer: nothing usable came back.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("no mock response registered for {method} {url}")]
    Unrouted { method: HttpMethod, url: String },
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Get the first header value matching `name` (case-insensitive).
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub use reqwest_transport::ReqwestTransport;

mod reqwest_transport {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport};

    /// Time allowed for the TCP/TLS handshake, separate from the request timeout.
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// A real HTTP transport backed by reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        /// Build a client whose requests give up after `timeout`.
        pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .connect_timeout(CONNECT_TIMEOUT.min(timeout))
                .build()
                .map_err(map_reqwest_error)?;
            Ok(Self { client })
        }
    }

    fn map_reqwest_error(e: reqwest::Error) -> HttpError {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Transport(e.to_string())
        }
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let mut builder = self.client.request(method(request.method), &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if !request.body.is_empty() {
                builder = builder.body(request.body);
            }

            let resp = builder.send().await.map_err(map_reqwest_error)?;

            let status = resp.status().as_u16();
            // Non-UTF-8 header values are dropped; none of the ones we read can be.
            let headers: HttpHeaders = resp
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = resp.bytes().await.map_err(map_reqwest_error)?.to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use mock::{MockTransport, RecordedRequest};

#[cfg(any(test, feature = "test-support"))]
mod mock {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::{HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport};

    #[derive(Debug, Clone)]
    enum Reply {
        Respond {
            response: HttpResponse,
            delay: Option<Duration>,
        },
        Fail(String),
    }

    /// A request the mock received, stamped with tokio's clock so paused-time
    /// tests can assert on backoff gaps.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub request: HttpRequest,
        pub at: Instant,
    }

    /// In-memory transport keyed by method and exact URL (query included).
    ///
    /// Replies registered for the same key are served FIFO. Clones share
    /// state, so a test can keep one handle while the client owns another.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        inner: Arc<Mutex<Inner>>,
    }

    #[derive(Default)]
    struct Inner {
        routes: HashMap<(HttpMethod, String), VecDeque<Reply>>,
        requests: Vec<RecordedRequest>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Inner> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn push(&self, method: HttpMethod, url: String, reply: Reply) {
            self.lock()
                .routes
                .entry((method, url))
                .or_default()
                .push_back(reply);
        }

        pub fn push_response(
            &self,
            method: HttpMethod,
            url: impl Into<String>,
            response: HttpResponse,
        ) {
            self.push(
                method,
                url.into(),
                Reply::Respond {
                    response,
                    delay: None,
                },
            );
        }

        /// Register a response that is only delivered after `delay`.
        pub fn push_delayed_response(
            &self,
            method: HttpMethod,
            url: impl Into<String>,
            response: HttpResponse,
            delay: Duration,
        ) {
            self.push(
                method,
                url.into(),
                Reply::Respond {
                    response,
                    delay: Some(delay),
                },
            );
        }

        /// Register a connection-level failure.
        pub fn push_network_error(
            &self,
            method: HttpMethod,
            url: impl Into<String>,
            message: impl Into<String>,
        ) {
            self.push(method, url.into(), Reply::Fail(message.into()));
        }

        #[must_use]
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.lock()
                .requests
                .iter()
                .map(|r| r.request.clone())
                .collect()
        }

        #[must_use]
        pub fn recorded(&self) -> Vec<RecordedRequest> {
            self.lock().requests.clone()
        }

        /// Number of requests sent to `url` with any method.
        #[must_use]
        pub fn hits(&self, url: &str) -> usize {
            self.lock()
                .requests
                .iter()
                .filter(|r| r.request.url == url)
                .count()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let key = (request.method, request.url.clone());
            let reply = {
                let mut inner = self.lock();
                inner.requests.push(RecordedRequest {
                    request,
                    at: Instant::now(),
                });
                inner.routes.get_mut(&key).and_then(VecDeque::pop_front)
            };

            match reply {
                Some(Reply::Respond { response, delay }) => {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(response)
                }
                Some(Reply::Fail(message)) => Err(HttpError::Transport(message)),
                None => Err(HttpError::Unrouted {
                    method: key.0,
                    url: key.1,
                }),
            }
        }
    }
}
