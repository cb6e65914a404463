//! Shared download orchestration
//!
//! Every provider goes through the same sequence: rewrite the input URL,
//! GET it with browser-like headers, vet HTML responses, resolve the file
//! name, then write the body either in one buffered write or chunk by chunk.
//! Providers customize the sequence through [`ProviderStrategy`].

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, StreamingResponse};
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use core_runtime::config::DownloadSettings;
use core_runtime::logging::redact_url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{DownloadError, Result};
use crate::file_info::{resolve_filename_and_mime, unique_destination};
use crate::provider::Provider;
use crate::result::DownloadResult;
use crate::transfer::copy_chunks;

/// Headers sent with provider-facing requests. Some providers serve a
/// different page to clients that do not look like a browser.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Connection", "keep-alive"),
];

/// Provider-specific steps of a download.
#[async_trait]
pub trait ProviderStrategy: Send + Sync {
    fn provider(&self) -> Provider;

    /// Turn the user-facing URL into the URL the file bytes are served from.
    async fn prepare_download_url(&self, url: &str) -> Result<String>;

    /// Inspect an HTML response body.
    ///
    /// Returning `Ok(())` accepts the page as the downloaded file. The default
    /// rejects every HTML response.
    fn handle_html_response(&self, _body: &[u8]) -> Result<()> {
        Err(DownloadError::UnexpectedHtml)
    }

    /// Attribute a failure to this provider.
    fn wrap_error(&self, error: DownloadError) -> DownloadError {
        DownloadError::provider_failure(self.provider(), error)
    }
}

/// Body of the download response once HTML vetting is done.
enum PendingBody {
    /// Already read while vetting an HTML page
    Buffered(Bytes),
    /// Not read yet
    Streaming(StreamingResponse),
}

/// Runs the shared download sequence for any [`ProviderStrategy`].
#[derive(Clone)]
pub struct Downloader {
    http_client: Arc<dyn HttpClient>,
    file_system: Arc<dyn FileSystemAccess>,
    settings: DownloadSettings,
}

impl Downloader {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        file_system: Arc<dyn FileSystemAccess>,
        settings: DownloadSettings,
    ) -> Self {
        Self {
            http_client,
            file_system,
            settings,
        }
    }

    /// Download `url` through `strategy` into the downloads directory.
    ///
    /// On failure any file created for this download is removed before the
    /// error is returned, and the error is attributed to the strategy's
    /// provider.
    #[instrument(
        skip(self, strategy, url),
        fields(provider = strategy.provider().as_str(), url = %redact_url(url))
    )]
    pub async fn download(
        &self,
        strategy: &dyn ProviderStrategy,
        url: &str,
    ) -> Result<DownloadResult> {
        let download_url = strategy
            .prepare_download_url(url)
            .await
            .map_err(|e| strategy.wrap_error(e))?;
        debug!(download_url = %redact_url(&download_url), "Prepared download URL");

        let mut destination = None;
        match self.fetch(strategy, &download_url, &mut destination).await {
            Ok(result) => {
                info!(
                    file_name = %result.original_file_name,
                    size = result.size,
                    "Download completed"
                );
                Ok(result)
            }
            Err(error) => {
                warn!(error = %error, "Download failed");
                self.cleanup(destination.as_deref()).await;
                Err(strategy.wrap_error(error))
            }
        }
    }

    /// `destination` is set as soon as a path is picked so the caller can
    /// clean up whatever this leaves behind.
    async fn fetch(
        &self,
        strategy: &dyn ProviderStrategy,
        download_url: &str,
        destination: &mut Option<PathBuf>,
    ) -> Result<DownloadResult> {
        let request = HttpRequest::get(download_url)
            .headers(BROWSER_HEADERS)
            .max_redirects(self.settings.max_redirects);

        let response = self
            .http_client
            .execute_streaming(request)
            .await
            .map_err(DownloadError::Http)?;

        if !response.is_success() {
            return Err(DownloadError::UnexpectedStatus {
                status: response.status,
                url: redact_url(download_url),
            });
        }

        let file_info = resolve_filename_and_mime(download_url, &response.headers);
        let direct = self.use_direct_write(response.content_length());

        let body = if is_html(&response) {
            let page = response.into_bytes().await.map_err(DownloadError::Transfer)?;
            strategy.handle_html_response(&page)?;
            debug!("HTML response accepted as file content");
            PendingBody::Buffered(page)
        } else {
            PendingBody::Streaming(response)
        };

        let path = unique_destination(
            self.file_system.as_ref(),
            &self.settings.downloads_dir,
            &file_info.file_name,
            self.settings.max_unique_name_attempts,
        )
        .await?;
        *destination = Some(path.clone());

        match body {
            PendingBody::Buffered(bytes) => self.write_buffered(&path, bytes).await?,
            PendingBody::Streaming(response) if direct => {
                let bytes = response
                    .into_bytes()
                    .await
                    .map_err(DownloadError::Transfer)?;
                self.write_buffered(&path, bytes).await?;
            }
            PendingBody::Streaming(response) => self.write_streamed(&path, response).await?,
        }

        let size = self
            .file_system
            .metadata(&path)
            .await
            .map_err(DownloadError::storage)?
            .size;

        Ok(DownloadResult {
            path,
            original_file_name: file_info.file_name,
            size,
            mime_type: file_info.content_type,
        })
    }

    /// Small bodies with a declared length are buffered; unknown lengths stream.
    fn use_direct_write(&self, content_length: Option<u64>) -> bool {
        matches!(content_length, Some(length) if length <= self.settings.direct_download_threshold)
    }

    async fn write_buffered(&self, path: &Path, bytes: Bytes) -> Result<()> {
        debug!(size = bytes.len(), "Writing buffered body");
        self.file_system
            .write_file(path, bytes)
            .await
            .map_err(DownloadError::storage)
    }

    async fn write_streamed(&self, path: &Path, response: StreamingResponse) -> Result<()> {
        let mut writer = self
            .file_system
            .open_write_stream(path)
            .await
            .map_err(DownloadError::storage)?;

        let written = copy_chunks(response.chunks, &mut *writer).await?;
        writer.shutdown().await?;

        debug!(bytes = written, "Streamed body to disk");
        Ok(())
    }

    async fn cleanup(&self, path: Option<&Path>) {
        let Some(path) = path else {
            return;
        };

        match self.file_system.exists(path).await {
            Ok(true) => match self.file_system.delete_file(path).await {
                Ok(()) => debug!(path = ?path, "Removed partial download"),
                Err(e) => warn!(path = ?path, error = %e, "Failed to remove partial download"),
            },
            Ok(false) => {}
            Err(e) => warn!(path = ?path, error = %e, "Failed to check partial download"),
        }
    }
}

fn is_html(response: &StreamingResponse) -> bool {
    let content_type = response
        .header("content-type")
        .unwrap_or("")
        .to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct::DirectDownloader;
    use crate::error::ErrorKind;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpResponse, ResponseChunk};
    use bridge_traits::storage::{DynAsyncWrite, FileMetadata};
    use core_runtime::config::DEFAULT_DIRECT_DOWNLOAD_THRESHOLD;
    use mockall::mock;
    use std::collections::HashMap;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};
    use tokio::io::AsyncWrite;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn execute_streaming(&self, request: HttpRequest) -> BridgeResult<StreamingResponse>;
        }
    }

    /// Writes to disk through `TokioFileSystem` while counting calls.
    #[derive(Default)]
    struct CountingFileSystem {
        inner: TokioFileSystem,
        buffered_writes: AtomicUsize,
        chunk_writes: Arc<AtomicUsize>,
    }

    struct CountingWriter {
        inner: Box<DynAsyncWrite>,
        writes: Arc<AtomicUsize>,
    }

    impl AsyncWrite for CountingWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
            if poll.is_ready() {
                self.writes.fetch_add(1, Ordering::SeqCst);
            }
            poll
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.inner).poll_flush(cx)
        }

        fn poll_shutdown(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.inner).poll_shutdown(cx)
        }
    }

    #[async_trait]
    impl FileSystemAccess for CountingFileSystem {
        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            self.inner.exists(path).await
        }

        async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
            self.inner.metadata(path).await
        }

        async fn create_dir_all(&self, path: &Path) -> BridgeResult<()> {
            self.inner.create_dir_all(path).await
        }

        async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
            self.buffered_writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write_file(path, data).await
        }

        async fn open_write_stream(&self, path: &Path) -> BridgeResult<Box<DynAsyncWrite>> {
            let inner = self.inner.open_write_stream(path).await?;
            Ok(Box::new(CountingWriter {
                inner,
                writes: Arc::clone(&self.chunk_writes),
            }))
        }

        async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
            self.inner.delete_file(path).await
        }
    }

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn downloader(
        http: MockHttpClient,
        fs: Arc<CountingFileSystem>,
        dir: &Path,
    ) -> Downloader {
        let settings = DownloadSettings {
            downloads_dir: dir.to_path_buf(),
            ..DownloadSettings::default()
        };
        Downloader::new(Arc::new(http), fs, settings)
    }

    fn respond_once(
        http: &mut MockHttpClient,
        status: u16,
        response_headers: HashMap<String, String>,
        chunks: Vec<BridgeResult<ResponseChunk>>,
    ) {
        let mut response = Some(StreamingResponse::from_chunks(status, response_headers, chunks));
        http.expect_execute_streaming()
            .times(1)
            .returning(move |_| {
                response
                    .take()
                    .ok_or_else(|| BridgeError::OperationFailed("called twice".to_string()))
            });
    }

    #[tokio::test]
    async fn test_small_body_is_written_once() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        respond_once(
            &mut http,
            200,
            headers(&[("Content-Type", "text/plain"), ("Content-Length", "11")]),
            vec![
                Ok(ResponseChunk::data("hello ")),
                Ok(ResponseChunk::data("world")),
                Ok(ResponseChunk::last()),
            ],
        );

        let result = downloader(http, Arc::clone(&fs), temp.path())
            .download(&DirectDownloader, "https://example.com/notes")
            .await
            .unwrap();

        assert_eq!(result.original_file_name, "notes.txt");
        assert_eq!(result.mime_type, "text/plain");
        assert_eq!(result.size, 11);
        assert_eq!(tokio::fs::read(&result.path).await.unwrap(), b"hello world");
        assert_eq!(fs.buffered_writes.load(Ordering::SeqCst), 1);
        assert_eq!(fs.chunk_writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_large_body_is_streamed() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        let chunk = vec![7u8; 64 * 1024];
        respond_once(
            &mut http,
            200,
            headers(&[
                ("Content-Type", "application/zip"),
                ("Content-Length", "196608"),
                ("Content-Disposition", r#"attachment; filename="bundle.zip""#),
            ]),
            vec![
                Ok(ResponseChunk::data(chunk.clone())),
                Ok(ResponseChunk::data(chunk.clone())),
                Ok(ResponseChunk::data(chunk)),
                Ok(ResponseChunk::last()),
            ],
        );

        let result = downloader(http, Arc::clone(&fs), temp.path())
            .download(&DirectDownloader, "https://example.com/get?id=1")
            .await
            .unwrap();

        assert_eq!(result.path, temp.path().join("bundle.zip"));
        assert_eq!(result.size, 196_608);
        assert_eq!(fs.buffered_writes.load(Ordering::SeqCst), 0);
        assert!(fs.chunk_writes.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_unknown_length_is_streamed() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        respond_once(
            &mut http,
            200,
            headers(&[("Content-Type", "application/pdf")]),
            vec![Ok(ResponseChunk::data("%PDF-1.7")), Ok(ResponseChunk::last())],
        );

        let result = downloader(http, Arc::clone(&fs), temp.path())
            .download(&DirectDownloader, "https://example.com/doc")
            .await
            .unwrap();

        assert_eq!(result.original_file_name, "doc.pdf");
        assert_eq!(fs.buffered_writes.load(Ordering::SeqCst), 0);
        assert_eq!(fs.chunk_writes.load(Ordering::SeqCst), 1);
    }

    /// Serve `body` in two chunks under `content_length` and report
    /// `(buffered_writes, chunk_writes)` after the download.
    async fn write_counts(content_length: &str, body: Vec<u8>) -> (usize, usize) {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        let (head, tail) = body.split_at(body.len() / 2);
        respond_once(
            &mut http,
            200,
            headers(&[
                ("Content-Type", "application/octet-stream"),
                ("Content-Length", content_length),
            ]),
            vec![
                Ok(ResponseChunk::data(head.to_vec())),
                Ok(ResponseChunk::data(tail.to_vec())),
                Ok(ResponseChunk::last()),
            ],
        );

        let result = downloader(http, Arc::clone(&fs), temp.path())
            .download(&DirectDownloader, "https://example.com/blob.bin")
            .await
            .unwrap();
        assert_eq!(result.size, body.len() as u64);
        assert_eq!(tokio::fs::read(&result.path).await.unwrap(), body);

        (
            fs.buffered_writes.load(Ordering::SeqCst),
            fs.chunk_writes.load(Ordering::SeqCst),
        )
    }

    #[tokio::test]
    async fn test_body_at_threshold_is_written_once() {
        assert_eq!(DEFAULT_DIRECT_DOWNLOAD_THRESHOLD, 104_857);

        let (buffered, chunks) = write_counts("104857", vec![1u8; 104_857]).await;
        assert_eq!(buffered, 1);
        assert_eq!(chunks, 0);
    }

    #[tokio::test]
    async fn test_body_just_over_threshold_is_streamed() {
        let (buffered, chunks) = write_counts("104858", vec![2u8; 104_858]).await;
        assert_eq!(buffered, 0);
        assert!(chunks >= 2);
    }

    #[tokio::test]
    async fn test_unparseable_length_is_streamed() {
        let (buffered, chunks) = write_counts("about 10 bytes", vec![3u8; 10]).await;
        assert_eq!(buffered, 0);
        assert!(chunks >= 2);
    }

    #[tokio::test]
    async fn test_request_uses_browser_headers_and_redirect_budget() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        http.expect_execute_streaming()
            .withf(|request| {
                request.url == "https://example.com/a.bin"
                    && request.max_redirects == Some(10)
                    && request.headers.get("User-Agent").map(String::as_str)
                        == Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
                    && request.headers.get("Accept-Language").map(String::as_str)
                        == Some("en-US,en;q=0.5")
            })
            .times(1)
            .returning(|_| {
                Ok(StreamingResponse::from_chunks(
                    200,
                    HashMap::new(),
                    vec![Ok(ResponseChunk::last())],
                ))
            });

        let result = downloader(http, fs, temp.path())
            .download(&DirectDownloader, "https://example.com/a.bin")
            .await
            .unwrap();
        assert_eq!(result.size, 0);
    }

    #[tokio::test]
    async fn test_collision_renames_instead_of_overwriting() {
        let temp = tempfile::tempdir().unwrap();
        tokio::fs::write(temp.path().join("a.txt"), b"keep me").await.unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        respond_once(
            &mut http,
            200,
            headers(&[("Content-Length", "3")]),
            vec![Ok(ResponseChunk::data("new")), Ok(ResponseChunk::last())],
        );

        let result = downloader(http, fs, temp.path())
            .download(&DirectDownloader, "https://example.com/a.txt")
            .await
            .unwrap();

        assert_eq!(result.path, temp.path().join("a_1.txt"));
        assert_eq!(result.original_file_name, "a.txt");
        assert_eq!(tokio::fs::read(temp.path().join("a.txt")).await.unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn test_html_is_rejected_by_default() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        respond_once(
            &mut http,
            200,
            headers(&[("Content-Type", "text/html; charset=UTF-8")]),
            vec![
                Ok(ResponseChunk::data("<html><title>Oops</title></html>")),
                Ok(ResponseChunk::last()),
            ],
        );

        let error = downloader(http, fs, temp.path())
            .download(&DirectDownloader, "https://example.com/page")
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Direct link download failed: Unable to process HTML file"
        );
        assert_eq!(error.kind(), ErrorKind::DownloadFailed);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_success_status_fails() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        respond_once(&mut http, 404, HashMap::new(), vec![Ok(ResponseChunk::last())]);

        let error = downloader(http, fs, temp.path())
            .download(&DirectDownloader, "https://example.com/missing.zip")
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Direct link download failed: HTTP 404 returned for https://example.com/[REDACTED]"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_removes_partial_file() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        respond_once(
            &mut http,
            200,
            headers(&[("Content-Type", "application/zip")]),
            vec![
                Ok(ResponseChunk::data("PK\x03\x04")),
                Err(BridgeError::OperationFailed("connection reset".to_string())),
            ],
        );

        let error = downloader(http, Arc::clone(&fs), temp.path())
            .download(&DirectDownloader, "https://example.com/big.zip")
            .await
            .unwrap_err();

        assert_eq!(error.provider_kind(), Some(Provider::Direct));
        assert!(error.to_string().contains("connection reset"));
        assert_eq!(fs.chunk_writes.load(Ordering::SeqCst), 1);
        assert!(!temp.path().join("big.zip").exists());
    }

    #[tokio::test]
    async fn test_request_failure_is_attributed_to_provider() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        http.expect_execute_streaming()
            .returning(|_| Err(BridgeError::OperationFailed("Request timed out".to_string())));

        let error = downloader(http, fs, temp.path())
            .download(&DirectDownloader, "https://example.com/slow.iso")
            .await
            .unwrap_err();

        assert!(error
            .to_string()
            .starts_with("Direct link download failed: HTTP request failed"));
    }

    struct AcceptingHtml;

    #[async_trait]
    impl ProviderStrategy for AcceptingHtml {
        fn provider(&self) -> Provider {
            Provider::GoogleDrive
        }

        async fn prepare_download_url(&self, url: &str) -> Result<String> {
            Ok(format!("{}?export=download", url))
        }

        fn handle_html_response(&self, body: &[u8]) -> Result<()> {
            assert!(body.starts_with(b"<html>"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_accepted_html_is_written_from_buffer() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Arc::new(CountingFileSystem::default());
        let mut http = MockHttpClient::new();
        respond_once(
            &mut http,
            200,
            headers(&[("Content-Type", "text/html")]),
            vec![
                Ok(ResponseChunk::data("<html>")),
                Ok(ResponseChunk::data("<body>plain page</body></html>")),
                Ok(ResponseChunk::last()),
            ],
        );

        let result = downloader(http, Arc::clone(&fs), temp.path())
            .download(&AcceptingHtml, "https://example.com/page")
            .await
            .unwrap();

        assert_eq!(result.original_file_name, "page.html");
        assert_eq!(fs.buffered_writes.load(Ordering::SeqCst), 1);
        assert_eq!(
            tokio::fs::read(&result.path).await.unwrap(),
            b"<html><body>plain page</body></html>"
        );
    }
}
