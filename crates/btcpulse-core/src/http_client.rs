use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// HTTP GET request envelope used by provider adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout_ms: 5_000,
        }
        .with_header("accept", "application/json")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().min(u128::from(u64::MAX)) as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// HTTP response envelope returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    timed_out: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Adapter transport contract.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Production HTTP client using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("btcpulse/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url).timeout(request.timeout());

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::timeout(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::timeout(format!("response body timeout: {e}"))
                } else {
                    HttpError::new(format!("failed to read response body: {e}"))
                }
            })?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Canned behavior for a [`MockHttpClient`] route.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Respond(HttpResponse),
    Fail(HttpError),
    /// Never answers; only the caller's own timeout ends the call.
    Hang,
}

#[derive(Debug)]
struct MockRoute {
    pattern: String,
    behavior: MockBehavior,
    calls: usize,
}

/// Offline transport that answers by URL substring match.
///
/// Routes are matched in registration order. Unmatched URLs get a 404.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    routes: Mutex<Vec<MockRoute>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, pattern: impl Into<String>, behavior: MockBehavior) -> Self {
        self.set_route(pattern, behavior);
        self
    }

    pub fn respond_json(self, pattern: impl Into<String>, body: impl Into<String>) -> Self {
        self.route(pattern, MockBehavior::Respond(HttpResponse::ok_json(body)))
    }

    /// Replaces the behavior of an existing route, or appends a new one.
    pub fn set_route(&self, pattern: impl Into<String>, behavior: MockBehavior) {
        let pattern = pattern.into();
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.iter_mut().find(|route| route.pattern == pattern) {
            Some(route) => route.behavior = behavior,
            None => routes.push(MockRoute {
                pattern,
                behavior,
                calls: 0,
            }),
        }
    }

    /// Number of requests served by the route registered under `pattern`.
    pub fn calls(&self, pattern: &str) -> usize {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|route| route.pattern == pattern)
            .map_or(0, |route| route.calls)
    }

    pub fn total_calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn resolve(&self, url: &str) -> Option<MockBehavior> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let route = routes.iter_mut().find(|route| url.contains(&route.pattern))?;
        route.calls += 1;
        Some(route.behavior.clone())
    }
}

impl HttpClient for MockHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let behavior = self.resolve(&request.url);
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);

            match behavior {
                Some(MockBehavior::Respond(response)) => Ok(response),
                Some(MockBehavior::Fail(error)) => Err(error),
                Some(MockBehavior::Hang) => std::future::pending().await,
                None => Ok(HttpResponse::with_status(404, "{}")),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_requests_accept_json() {
        let request = HttpRequest::get("https://example.test/global");
        assert_eq!(
            request.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(request.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn custom_timeout_round_trips_through_millis() {
        let request =
            HttpRequest::get("https://example.test/ping").with_timeout(Duration::from_secs(3));
        assert_eq!(request.timeout_ms, 3_000);
    }

    #[tokio::test]
    async fn mock_routes_by_substring_and_counts_calls() {
        let client = MockHttpClient::new()
            .respond_json("/simple/price", r#"{"bitcoin":{}}"#)
            .route(
                "/global",
                MockBehavior::Fail(HttpError::timeout("simulated timeout")),
            );

        let ok = client
            .execute(HttpRequest::get("https://api.test/simple/price?ids=bitcoin"))
            .await
            .expect("canned response");
        assert!(ok.is_success());

        let err = client
            .execute(HttpRequest::get("https://api.test/global"))
            .await
            .expect_err("canned failure");
        assert!(err.is_timeout());

        let missing = client
            .execute(HttpRequest::get("https://api.test/unknown"))
            .await
            .expect("unmatched routes answer 404");
        assert_eq!(missing.status, 404);

        assert_eq!(client.calls("/simple/price"), 1);
        assert_eq!(client.calls("/global"), 1);
        assert_eq!(client.total_calls(), 3);
    }

    #[tokio::test]
    async fn set_route_replaces_behavior() {
        let client = MockHttpClient::new().respond_json("/ping", "{}");
        client.set_route(
            "/ping",
            MockBehavior::Respond(HttpResponse::with_status(500, "")),
        );

        let response = client
            .execute(HttpRequest::get("https://api.test/ping"))
            .await
            .expect("response");
        assert_eq!(response.status, 500);
    }
}
