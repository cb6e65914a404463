//! Google Drive download strategy

use async_trait::async_trait;
use core_download::{DownloadError, Provider, ProviderStrategy};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::error::GoogleDriveError;

const EXPORT_URL: &str = "https://drive.google.com/uc?export=download&id=";

const SIGN_IN_TITLE: &str = "Sign-in";
const VIRUS_SCAN_WARNING_TITLE: &str = "Virus scan warning";

static FILE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:/file/d/|id=)([a-zA-Z0-9_-]+)").expect("valid file id pattern")
});

static HTML_TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)<html.*<title>(.*?)</title>").expect("valid title pattern")
});

/// Download strategy for Google Drive share links
///
/// Rewrites `https://drive.google.com/file/d/<id>/view` (or any URL carrying
/// `id=<id>`) to the public export endpoint. When Google answers with an HTML
/// page, its `<title>` decides the failure reported.
///
/// # Example
///
/// ```ignore
/// use core_download::Downloader;
/// use provider_google_drive::GoogleDriveDownloader;
///
/// let result = downloader
///     .download(&GoogleDriveDownloader, "https://drive.google.com/file/d/1AbC/view")
///     .await?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleDriveDownloader;

impl GoogleDriveDownloader {
    /// File ID embedded in a share link.
    pub fn extract_file_id(url: &str) -> Option<&str> {
        FILE_ID_PATTERN
            .captures(url)
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str())
    }

    /// Public export URL serving the bytes of `file_id`.
    pub fn export_url(file_id: &str) -> String {
        format!("{}{}", EXPORT_URL, file_id)
    }

    /// Map an interstitial page to the failure it stands for.
    ///
    /// Returns `None` when the body has no `<title>`, in which case the page
    /// is kept as the downloaded file.
    fn classify_interstitial(body: &str) -> Option<GoogleDriveError> {
        let title = HTML_TITLE_PATTERN
            .captures(body)
            .and_then(|captures| captures.get(1))?
            .as_str();

        debug!(title = %title, "Google Drive returned an HTML page");

        let error = if title.contains(SIGN_IN_TITLE) {
            GoogleDriveError::NotPubliclyAccessible
        } else if title.contains(VIRUS_SCAN_WARNING_TITLE) {
            GoogleDriveError::VirusScanWarning
        } else {
            GoogleDriveError::HtmlInsteadOfFile
        };
        Some(error)
    }
}

#[async_trait]
impl ProviderStrategy for GoogleDriveDownloader {
    fn provider(&self) -> Provider {
        Provider::GoogleDrive
    }

    #[instrument(skip(self, url))]
    async fn prepare_download_url(&self, url: &str) -> core_download::Result<String> {
        let file_id = Self::extract_file_id(url).ok_or(GoogleDriveError::InvalidUrl)?;
        debug!(file_id = %file_id, "Extracted Google Drive file id");
        Ok(Self::export_url(file_id))
    }

    fn handle_html_response(&self, body: &[u8]) -> core_download::Result<()> {
        match Self::classify_interstitial(&String::from_utf8_lossy(body)) {
            Some(error) => {
                warn!(error = %error, "Rejected Google Drive interstitial");
                Err(DownloadError::from(error))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{
        HttpClient, HttpRequest, HttpResponse, ResponseChunk, StreamingResponse,
    };
    use bridge_desktop::TokioFileSystem;
    use core_download::{Downloader, ErrorKind};
    use core_runtime::config::DownloadSettings;
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::Arc;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn execute_streaming(&self, request: HttpRequest) -> BridgeResult<StreamingResponse>;
        }
    }

    fn html_page(title: &str) -> String {
        format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{}</title></head><body></body></html>",
            title
        )
    }

    fn downloader_serving(
        content_type: &'static str,
        body: String,
        dir: &std::path::Path,
    ) -> Downloader {
        let mut http = MockHttpClient::new();
        http.expect_execute_streaming()
            .withf(|request| request.url == "https://drive.google.com/uc?export=download&id=1AbC_d-E")
            .times(1)
            .returning(move |_| {
                let mut headers = HashMap::new();
                headers.insert("Content-Type".to_string(), content_type.to_string());
                Ok(StreamingResponse::from_chunks(
                    200,
                    headers,
                    vec![
                        Ok(ResponseChunk::data(body.clone())),
                        Ok(ResponseChunk::last()),
                    ],
                ))
            });

        let settings = DownloadSettings {
            downloads_dir: dir.to_path_buf(),
            ..DownloadSettings::default()
        };
        Downloader::new(Arc::new(http), Arc::new(TokioFileSystem::new()), settings)
    }

    #[tokio::test]
    async fn test_prepare_download_url_from_share_link() {
        let url = GoogleDriveDownloader
            .prepare_download_url("https://drive.google.com/file/d/1AbC_d-E/view?usp=sharing")
            .await
            .unwrap();

        assert_eq!(url, "https://drive.google.com/uc?export=download&id=1AbC_d-E");
    }

    #[tokio::test]
    async fn test_prepare_download_url_from_id_parameter() {
        let url = GoogleDriveDownloader
            .prepare_download_url("https://drive.google.com/open?id=XyZ123")
            .await
            .unwrap();

        assert_eq!(url, "https://drive.google.com/uc?export=download&id=XyZ123");
    }

    #[tokio::test]
    async fn test_prepare_download_url_without_id() {
        let error = GoogleDriveDownloader
            .prepare_download_url("https://drive.google.com/drive/my-drive")
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Failed download from Google Drive: Invalid Google Drive URL."
        );
    }

    #[test]
    fn test_interstitial_titles() {
        assert_eq!(
            GoogleDriveDownloader::classify_interstitial(&html_page("Google Drive - Sign-in")),
            Some(GoogleDriveError::NotPubliclyAccessible)
        );
        assert_eq!(
            GoogleDriveDownloader::classify_interstitial(&html_page(
                "Google Drive - Virus scan warning"
            )),
            Some(GoogleDriveError::VirusScanWarning)
        );
        assert_eq!(
            GoogleDriveDownloader::classify_interstitial(&html_page("Error 404 (Not Found)")),
            Some(GoogleDriveError::HtmlInsteadOfFile)
        );
    }

    #[test]
    fn test_title_match_spans_lines_and_ignores_case() {
        let body = "<HTML>\n<head>\n<TITLE>Sign-in</TITLE>\n</head></HTML>";
        assert_eq!(
            GoogleDriveDownloader::classify_interstitial(body),
            Some(GoogleDriveError::NotPubliclyAccessible)
        );
    }

    #[test]
    fn test_page_without_title_is_accepted() {
        assert!(GoogleDriveDownloader
            .handle_html_response(b"<html><body>shared notes</body></html>")
            .is_ok());
    }

    #[tokio::test]
    async fn test_sign_in_page_fails_download() {
        let temp = tempfile::tempdir().unwrap();
        let downloader =
            downloader_serving("text/html; charset=utf-8", html_page("Sign-in"), temp.path());

        let error = downloader
            .download(
                &GoogleDriveDownloader,
                "https://drive.google.com/file/d/1AbC_d-E/view",
            )
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Failed download from Google Drive: Google Drive file is not publicly accessible."
        );
        assert_eq!(error.kind(), ErrorKind::DownloadFailed);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_file_download_succeeds() {
        let temp = tempfile::tempdir().unwrap();
        let downloader =
            downloader_serving("application/pdf", "%PDF-1.7 body".to_string(), temp.path());

        let result = downloader
            .download(
                &GoogleDriveDownloader,
                "https://drive.google.com/file/d/1AbC_d-E/view",
            )
            .await
            .unwrap();

        assert_eq!(result.original_file_name, "uc.pdf");
        assert_eq!(result.mime_type, "application/pdf");
        assert_eq!(std::fs::read(&result.path).unwrap(), b"%PDF-1.7 body");
    }
}
