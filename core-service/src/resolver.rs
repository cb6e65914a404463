//! URL classification and downloader construction

use bridge_traits::http::HttpClient;
use bridge_traits::storage::FileSystemAccess;
use core_download::{
    DirectDownloader, DownloadResult, Downloader, ParsedUrl, Provider, ProviderStrategy, Result,
};
use core_runtime::config::{CoreConfig, DownloadSettings};
use provider_google_drive::GoogleDriveDownloader;
use provider_onedrive::connector::SHORT_URL_HOST;
use provider_onedrive::OneDriveDownloader;
use std::sync::Arc;
use tracing::debug;

/// Provider-specific half of a resolved download.
#[derive(Clone)]
pub enum Strategy {
    Direct(DirectDownloader),
    GoogleDrive(GoogleDriveDownloader),
    OneDrive(OneDriveDownloader),
}

impl Strategy {
    pub fn as_strategy(&self) -> &dyn ProviderStrategy {
        match self {
            Strategy::Direct(strategy) => strategy,
            Strategy::GoogleDrive(strategy) => strategy,
            Strategy::OneDrive(strategy) => strategy,
        }
    }
}

/// A downloader picked for one URL: the shared template plus the strategy
/// matching the URL's provider.
#[derive(Clone)]
pub struct ResolvedDownloader {
    template: Downloader,
    strategy: Strategy,
}

impl ResolvedDownloader {
    pub fn provider(&self) -> Provider {
        self.strategy.as_strategy().provider()
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub async fn download(&self, url: &str) -> Result<DownloadResult> {
        self.template
            .download(self.strategy.as_strategy(), url)
            .await
    }
}

/// Classifies URLs and builds the matching downloader.
///
/// Holds no per-download state; every call to [`resolve`](Self::resolve)
/// returns a fresh downloader.
#[derive(Clone)]
pub struct ProviderResolver {
    http_client: Arc<dyn HttpClient>,
    template: Downloader,
}

impl ProviderResolver {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        file_system: Arc<dyn FileSystemAccess>,
        settings: DownloadSettings,
    ) -> Self {
        let template = Downloader::new(Arc::clone(&http_client), file_system, settings);
        Self {
            http_client,
            template,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            Arc::clone(&config.http_client),
            Arc::clone(&config.file_system),
            config.settings.clone(),
        )
    }

    /// Decide which provider serves `url`.
    ///
    /// First match wins:
    /// 1. host contains `google.com` and path contains `/file/d/`: Google Drive
    /// 2. host is `1drv.ms`, or host contains `onedrive.live.com` and the
    ///    query contains `redeem=`: OneDrive
    /// 3. anything else: direct link
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::InvalidUrl` for empty, malformed or non-http(s)
    /// input.
    pub fn classify(url: &str) -> Result<Provider> {
        let parsed = ParsedUrl::parse(url)?;
        let host = parsed.host();

        let provider = if host.contains("google.com") && parsed.path().contains("/file/d/") {
            Provider::GoogleDrive
        } else if host == SHORT_URL_HOST
            || (host.contains("onedrive.live.com")
                && parsed.query().is_some_and(|query| query.contains("redeem=")))
        {
            Provider::OneDrive
        } else {
            Provider::Direct
        };

        Ok(provider)
    }

    /// Build the downloader for `url`.
    pub fn resolve(&self, url: &str) -> Result<ResolvedDownloader> {
        let provider = Self::classify(url)?;
        debug!(provider = provider.as_str(), "Resolved provider");

        let strategy = match provider {
            Provider::Direct => Strategy::Direct(DirectDownloader),
            Provider::GoogleDrive => Strategy::GoogleDrive(GoogleDriveDownloader),
            Provider::OneDrive => {
                Strategy::OneDrive(OneDriveDownloader::new(Arc::clone(&self.http_client)))
            }
        };

        Ok(ResolvedDownloader {
            template: self.template.clone(),
            strategy,
        })
    }
}
