//! OneDrive download strategy

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_download::{Provider, ProviderStrategy, BROWSER_HEADERS};
use core_runtime::logging::redact_url;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{OneDriveError, Result};
use crate::token::OneDriveTokenService;

/// Host of OneDrive short links.
pub const SHORT_URL_HOST: &str = "1drv.ms";

/// Download strategy for OneDrive share links
///
/// `1drv.ms` short links are first followed to the share page they redirect
/// to. The share page's `redeem` token is then exchanged for the file URL
/// through [`OneDriveTokenService`].
#[derive(Clone)]
pub struct OneDriveDownloader {
    http_client: Arc<dyn HttpClient>,
    token_service: OneDriveTokenService,
}

impl OneDriveDownloader {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        let token_service = OneDriveTokenService::new(Arc::clone(&http_client));
        Self::with_token_service(http_client, token_service)
    }

    pub fn with_token_service(
        http_client: Arc<dyn HttpClient>,
        token_service: OneDriveTokenService,
    ) -> Self {
        Self {
            http_client,
            token_service,
        }
    }

    pub fn is_short_url(url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|host| host == SHORT_URL_HOST))
            .unwrap_or(false)
    }

    /// Follow a short link to the URL it redirects to. Other URLs are
    /// returned unchanged.
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    async fn resolve_short_url(&self, url: &str) -> Result<String> {
        if !Self::is_short_url(url) {
            return Ok(url.to_string());
        }

        let request = HttpRequest::get(url).headers(BROWSER_HEADERS);
        let response = self.http_client.execute(request).await?;

        if !(200..400).contains(&response.status) {
            return Err(OneDriveError::ShortUrlStatus(response.status));
        }

        let resolved = response.final_url.ok_or(OneDriveError::ShortUrlUnresolved)?;
        debug!(resolved = %redact_url(&resolved), "Resolved OneDrive short link");
        Ok(resolved)
    }

    async fn resolve_download_url(&self, url: &str) -> Result<String> {
        let share_url = self.resolve_short_url(url).await?;
        self.token_service
            .download_url(&share_url)
            .await?
            .ok_or(OneDriveError::DownloadUrlUnavailable)
    }
}

#[async_trait]
impl ProviderStrategy for OneDriveDownloader {
    fn provider(&self) -> Provider {
        Provider::OneDrive
    }

    async fn prepare_download_url(&self, url: &str) -> core_download::Result<String> {
        Ok(self.resolve_download_url(url).await?)
    }
}
