//! HTTP Client Abstraction
//!
//! Provides async request/response and chunked streaming operations. The
//! transport itself (redirect following, TLS, timeouts) belongs to the host
//! implementation; the core only describes what it needs.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream::{BoxStream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
    /// Redirect budget for this request; `None` uses the client default.
    pub max_redirects: Option<usize>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
            max_redirects: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add every `(name, value)` pair from a static header table.
    pub fn headers(mut self, headers: &[(&str, &str)]) -> Self {
        for (key, value) in headers {
            self.headers.insert((*key).to_string(), (*value).to_string());
        }
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON serialization failed: {}", e))
        })?;
        self.body = Some(Bytes::from(json));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = Some(max_redirects);
        self
    }
}

/// Case-insensitive header lookup.
pub fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    /// Location the client ended up at after following redirects.
    pub final_url: Option<String>,
}

impl HttpResponse {
    /// Look up a header value ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One unit of a streamed response body.
///
/// A transport reports the end of the body with an empty chunk flagged
/// `is_last`, and an idle read with an empty chunk flagged `is_timeout`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseChunk {
    pub content: Bytes,
    pub is_timeout: bool,
    pub is_last: bool,
}

impl ResponseChunk {
    pub fn data(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn timeout() -> Self {
        Self {
            is_timeout: true,
            ..Self::default()
        }
    }

    pub fn last() -> Self {
        Self {
            is_last: true,
            ..Self::default()
        }
    }
}

/// Stream of body chunks as they arrive from the transport.
pub type ChunkStream = BoxStream<'static, Result<ResponseChunk>>;

/// Response whose body has not been read yet.
pub struct StreamingResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub final_url: Option<String>,
    pub chunks: ChunkStream,
}

impl StreamingResponse {
    /// Build a streaming response over an in-memory list of chunks.
    pub fn from_chunks(
        status: u16,
        headers: HashMap<String, String>,
        chunks: Vec<Result<ResponseChunk>>,
    ) -> Self {
        Self {
            status,
            headers,
            final_url: None,
            chunks: futures_util::stream::iter(chunks).boxed(),
        }
    }

    /// Look up a header value ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Declared body length, if the server sent a parseable `Content-Length`.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|value| value.trim().parse().ok())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the whole body into memory.
    ///
    /// Unlike chunked copying, an idle timeout here is an error: a buffered
    /// body is only useful when it is complete.
    pub async fn into_bytes(mut self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.chunks.next().await {
            let chunk = chunk?;
            if chunk.is_timeout {
                return Err(BridgeError::OperationFailed(
                    "Timed out while reading response body".to_string(),
                ));
            }
            buffer.extend_from_slice(&chunk.content);
            if chunk.is_last {
                break;
            }
        }
        Ok(buffer.freeze())
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("final_url", &self.final_url)
            .field("chunks", &"ChunkStream { ... }")
            .finish()
    }
}

/// Async HTTP client trait
///
/// This trait abstracts HTTP operations to allow platform-specific implementations.
/// Implementations should handle:
/// - Redirect following within the request's budget
/// - TLS certificate validation
/// - Connection pooling and keep-alive
/// - Safe concurrent use from independent downloads
///
/// Non-2xx responses are returned as `Ok`; status handling is up to the caller.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn final_location(client: &dyn HttpClient, short_link: &str) -> Result<Option<String>> {
///     let response = client.execute(HttpRequest::get(short_link)).await?;
///     Ok(response.final_url)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and buffer the whole response body
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    /// - The redirect budget is exhausted
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute an HTTP request, returning as soon as headers arrive
    ///
    /// The body is delivered through [`StreamingResponse::chunks`].
    async fn execute_streaming(&self, request: HttpRequest) -> Result<StreamingResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::get("https://example.com")
            .header("User-Agent", "test")
            .max_redirects(10)
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(request.max_redirects, Some(10));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = HttpRequest::post("https://example.com/token")
            .json(&serde_json::json!({ "AppId": "abc" }))
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(request.body.unwrap(), Bytes::from(r#"{"AppId":"abc"}"#));
    }

    #[test]
    fn test_http_response_status_checks() {
        for (status, success) in [(200, true), (204, true), (302, false), (404, false)] {
            let response = HttpResponse {
                status,
                headers: HashMap::new(),
                body: Bytes::from("test"),
                final_url: None,
            };
            assert_eq!(response.is_success(), success, "status {status}");
        }
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "image/png".to_string());
        let response = HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
            final_url: None,
        };

        assert_eq!(response.header("content-type"), Some("image/png"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("image/png"));
        assert_eq!(response.header("content-length"), None);
    }

    #[test]
    fn test_content_length_parsing() {
        let mut headers = HashMap::new();
        headers.insert("content-length".to_string(), "not-a-number".to_string());
        let response = StreamingResponse::from_chunks(200, headers, vec![]);
        assert_eq!(response.content_length(), None);

        let mut headers = HashMap::new();
        headers.insert("Content-Length".to_string(), " 2048 ".to_string());
        let response = StreamingResponse::from_chunks(200, headers, vec![]);
        assert_eq!(response.content_length(), Some(2048));
    }

    #[tokio::test]
    async fn test_into_bytes_collects_until_last() {
        let response = StreamingResponse::from_chunks(
            200,
            HashMap::new(),
            vec![
                Ok(ResponseChunk::data("hello ")),
                Ok(ResponseChunk::data("world")),
                Ok(ResponseChunk::last()),
                Ok(ResponseChunk::data("ignored")),
            ],
        );

        let body = response.into_bytes().await.unwrap();
        assert_eq!(body, Bytes::from("hello world"));
    }

    #[tokio::test]
    async fn test_into_bytes_fails_on_timeout() {
        let response = StreamingResponse::from_chunks(
            200,
            HashMap::new(),
            vec![Ok(ResponseChunk::data("partial")), Ok(ResponseChunk::timeout())],
        );

        assert!(response.into_bytes().await.is_err());
    }
}
