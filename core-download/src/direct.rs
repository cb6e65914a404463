use async_trait::async_trait;

use crate::downloader::ProviderStrategy;
use crate::error::Result;
use crate::provider::Provider;

/// Strategy for links that already point at the file.
///
/// The URL is fetched as given and an HTML answer is always an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDownloader;

#[async_trait]
impl ProviderStrategy for DirectDownloader {
    fn provider(&self) -> Provider {
        Provider::Direct
    }

    async fn prepare_download_url(&self, url: &str) -> Result<String> {
        Ok(url.to_string())
    }
}
