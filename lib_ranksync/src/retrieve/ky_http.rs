//! # HTTP Retrieval Utilities
//!
//! An asynchronous API client wrapper around `reqwest`, with optional
//! exponential-backoff retries through `reqwest-middleware` and JSON response
//! handling. Construction never panics: a bad base URL is reported as
//! `SyncError::InvalidEndpoint`.

use std::time::Duration;

use reqwest::{header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE}, Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::SyncError;

/// A standardized container for API responses.
///
/// Wraps the deserialized data along with metadata about the HTTP
/// transaction, such as status code and headers.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The deserialized response body, present on 2xx responses.
    pub data: Option<T>,
    /// The raw body returned by the server when the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
    /// The headers returned by the server.
    pub headers: HeaderMap,
}

/// A flexible asynchronous HTTP client.
///
/// Handles a base URL, an optional bearer token and, when `max_retries > 0`,
/// automatic retries of transient failures.
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all relative paths are joined.
    base_url: Url,
    /// An optional Bearer token used for authorization.
    auth_token: Option<String>,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Arguments
    /// * `base_url` - Absolute base URL. A trailing slash is added when
    ///   missing so that paths are joined below it rather than replacing its
    ///   last segment.
    /// * `auth_token` - Optional bearer token.
    /// * `max_retries` - Transient-failure retries; `0` disables the middleware.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let url = Url::parse(&normalized)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SyncError::InvalidEndpoint(format!("unsupported scheme in {}", url)));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ranksync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut builder = ClientBuilder::new(http);
        if max_retries > 0 {
            let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            inner: builder.build(),
            base_url: url,
            auth_token,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs an HTTP request and decodes the response.
    ///
    /// # Arguments
    /// * `method` - The HTTP verb.
    /// * `path` - Path relative to the base URL.
    /// * `query` - Query string pairs.
    /// * `headers` - Optional additional headers.
    /// * `body` - Optional serializable JSON body.
    ///
    /// # Errors
    /// Transport failures and undecodable 2xx bodies. Non-2xx responses are
    /// not errors here; they come back with `success == false`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        headers: Option<HeaderMap>,
        body: Option<B>,
    ) -> Result<ApiResponse<T>, SyncError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let full_url = self.base_url.join(path.trim_start_matches('/'))?;
        let mut req = self.inner.request(method, full_url);

        if !query.is_empty() {
            req = req.query(query);
        }

        if let Some(h) = headers {
            req = req.headers(h);
        }

        if let Some(token) = &self.auth_token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        if let Some(b) = body {
            let json_body = serde_json::to_string(&b).map_err(|e| SyncError::Decode(e.to_string()))?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();

        if status.is_success() {
            let text = response.text().await?;
            let data = serde_json::from_str::<T>(&text).map_err(|e| SyncError::Decode(e.to_string()))?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::{json, Value};
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Reads one request: head plus `Content-Length` bytes of body.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap_or(0);
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    /// Answers one connection per canned response, in order, and returns the
    /// raw requests.
    fn serve(responses: Vec<(&'static str, &'static str)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                requests.push(read_request(&mut stream));
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
            requests
        });
        (format!("http://127.0.0.1:{}", port), handle)
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://127.0.0.1:8080/v1", None, 0, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8080/v1/");
        assert_eq!(
            client.base_url().join("api/rankings").unwrap().as_str(),
            "http://127.0.0.1:8080/v1/api/rankings"
        );
    }

    #[test]
    fn test_relative_or_foreign_bases_are_rejected() {
        assert!(matches!(
            ApiClient::new("/api", None, 0, Duration::from_secs(1)),
            Err(SyncError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            ApiClient::new("ftp://example.com", None, 0, Duration::from_secs(1)),
            Err(SyncError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_request_sends_extra_headers_and_json_body() {
        let (base, server) = serve(vec![("201 Created", r#"{"accepted":true}"#)]);
        let client = ApiClient::new(&base, Some("tkn".to_string()), 0, Duration::from_secs(5)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-clan-id", HeaderValue::from_static("42"));
        let response = client
            .request::<Value, Value>(
                Method::POST,
                "/api/echo",
                &[],
                Some(headers),
                Some(json!({ "memberName": "Kim" })),
            )
            .await
            .unwrap();
        let requests = server.join().unwrap();
        let request = requests[0].to_lowercase();

        assert!(response.success);
        assert_eq!(response.status, 201);
        assert_eq!(response.data, Some(json!({ "accepted": true })));
        assert!(request.starts_with("post /api/echo http/1.1"));
        assert!(request.contains("x-clan-id: 42"));
        assert!(request.contains("authorization: bearer tkn"));
        assert!(request.contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"membername":"kim"}"#));
    }

    #[tokio::test]
    async fn test_retry_middleware_recovers_from_transient_failure() {
        let (base, server) = serve(vec![
            ("503 Service Unavailable", "{}"),
            ("200 OK", r#"[1,2,3]"#),
        ]);
        let client = ApiClient::new(&base, None, 2, Duration::from_secs(5)).unwrap();

        let response = client
            .request::<Vec<u32>, ()>(Method::GET, "api/rankings", &[("count", "3".to_string())], None, None)
            .await
            .unwrap();
        let requests = server.join().unwrap();

        assert!(response.success);
        assert_eq!(response.data, Some(vec![1, 2, 3]));
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.starts_with("GET /api/rankings?count=3 HTTP/1.1")));
    }

    #[tokio::test]
    async fn test_without_retries_a_failure_is_returned_as_is() {
        let (base, server) = serve(vec![("503 Service Unavailable", "busy")]);
        let client = ApiClient::new(&base, None, 0, Duration::from_secs(5)).unwrap();

        let response = client
            .request::<Value, ()>(Method::GET, "api/rankings", &[], None, None)
            .await
            .unwrap();
        server.join().unwrap();

        assert!(!response.success);
        assert_eq!(response.status, 503);
        assert_eq!(response.error_body.as_deref(), Some("busy"));
        assert!(response.data.is_none());
    }
}
