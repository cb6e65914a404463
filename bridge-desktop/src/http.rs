//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{
        HttpClient, HttpMethod, HttpRequest, HttpResponse, ResponseChunk, StreamingResponse,
    },
};
use futures_util::stream::{self, StreamExt};
use reqwest::{redirect, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Time allowed for a request to produce response headers (and, for buffered
/// requests, the whole body).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest pause tolerated between two body chunks while streaming.
const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_MAX_REDIRECTS: usize = 10;

const USER_AGENT: &str = concat!("cloud-fetch/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - Per-request redirect budgets
/// - TLS support by default (rustls)
/// - Chunked streaming with an idle timeout between chunks
///
/// Requests are never retried; a failure is reported to the caller as is.
pub struct ReqwestHttpClient {
    client: Client,
    timeout: Duration,
    chunk_timeout: Duration,
    max_redirects: usize,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeouts(DEFAULT_TIMEOUT, DEFAULT_CHUNK_TIMEOUT)
    }

    /// Create a new HTTP client with custom request and chunk idle timeouts
    pub fn with_timeouts(timeout: Duration, chunk_timeout: Duration) -> Result<Self> {
        let client = Self::build_client(DEFAULT_MAX_REDIRECTS)?;

        Ok(Self {
            client,
            timeout,
            chunk_timeout,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        })
    }

    /// Wrap a preconfigured reqwest client.
    ///
    /// `max_redirects` must describe the redirect policy `client` was built with.
    pub fn with_client(client: Client, max_redirects: usize) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
            chunk_timeout: DEFAULT_CHUNK_TIMEOUT,
            max_redirects,
        }
    }

    fn build_client(max_redirects: usize) -> Result<Client> {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(10)
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::limited(max_redirects))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e)))
    }

    /// Pick a client honoring the request's redirect budget.
    ///
    /// reqwest fixes the redirect policy per client, so a request asking for a
    /// different budget gets a dedicated client.
    fn client_for(&self, max_redirects: Option<usize>) -> Result<Client> {
        match max_redirects {
            Some(limit) if limit != self.max_redirects => {
                debug!(max_redirects = limit, "Building client for custom redirect budget");
                Self::build_client(limit)
            }
            _ => Ok(self.client.clone()),
        }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder> {
        let client = self.client_for(request.max_redirects)?;
        let method = Self::convert_method(request.method);
        let mut req = client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        Ok(req)
    }

    fn collect_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect()
    }

    /// The URL is stripped first: share links and pre-authenticated download
    /// URLs must not leak through error messages.
    fn map_reqwest_error(e: reqwest::Error) -> BridgeError {
        let e = e.without_url();
        if e.is_timeout() {
            BridgeError::OperationFailed("Request timed out".to_string())
        } else if e.is_connect() {
            BridgeError::OperationFailed(format!("Connection failed: {}", e))
        } else if e.is_redirect() {
            BridgeError::OperationFailed(format!("Redirect limit exceeded: {}", e))
        } else {
            BridgeError::OperationFailed(e.to_string())
        }
    }
}

/// Host part of `url` for log lines; paths and queries may carry credentials.
fn log_host(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, host = %log_host(&request.url), "Executing HTTP request");

        let timeout = request.timeout.unwrap_or(self.timeout);
        let response = self
            .build_request(request)?
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                let error = Self::map_reqwest_error(e);
                warn!(error = %error, "HTTP request failed");
                error
            })?;

        let status = response.status().as_u16();
        let headers = Self::collect_headers(&response);
        let final_url = Some(response.url().to_string());

        let body = response.bytes().await.map_err(Self::map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
            final_url,
        })
    }

    async fn execute_streaming(&self, request: HttpRequest) -> Result<StreamingResponse> {
        debug!(
            method = ?request.method,
            host = %log_host(&request.url),
            "Executing streaming HTTP request"
        );

        let timeout = request.timeout.unwrap_or(self.timeout);
        let send = self.build_request(request)?.send();
        let response = tokio::time::timeout(timeout, send)
            .await
            .map_err(|_| BridgeError::OperationFailed("Request timed out".to_string()))?
            .map_err(|e| {
                let error = Self::map_reqwest_error(e);
                warn!(error = %error, "HTTP request failed");
                error
            })?;

        let status = response.status().as_u16();
        let headers = Self::collect_headers(&response);
        let final_url = Some(response.url().to_string());

        let chunk_timeout = self.chunk_timeout;
        let chunks = stream::unfold(Some(response), move |state| async move {
            let mut response = state?;
            let (item, next) = match tokio::time::timeout(chunk_timeout, response.chunk()).await
            {
                Err(_) => (Ok(ResponseChunk::timeout()), None),
                Ok(Ok(Some(bytes))) => (Ok(ResponseChunk::data(bytes)), Some(response)),
                Ok(Ok(None)) => (Ok(ResponseChunk::last()), None),
                Ok(Err(e)) if e.is_timeout() => (Ok(ResponseChunk::timeout()), None),
                Ok(Err(e)) => (Err(Self::map_reqwest_error(e)), None),
            };
            Some((item, next))
        })
        .boxed();

        Ok(StreamingResponse {
            status,
            headers,
            final_url,
            chunks,
        })
    }
}
