//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided bridges (HTTP client, filesystem) into
//! the download pipeline and exposes the single entry point hosts call:
//! [`FileDownloader`]. Desktop hosts typically enable the `desktop-shims`
//! feature (which depends on `bridge-desktop`) and call
//! [`bootstrap_desktop`].
//!
//! ```ignore
//! use core_service::FileDownloader;
//!
//! let downloader = core_service::bootstrap_desktop("/srv/uploads")?;
//! if downloader.is_supported(url) {
//!     let file = downloader.download(url).await?;
//!     println!("{} -> {}", file.original_file_name, file.path.display());
//! }
//! ```

pub mod error;
pub mod resolver;

pub use core_download::{DownloadError, DownloadResult, ErrorKind, Provider};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, DownloadSettings};
pub use error::{CoreError, Result};
pub use resolver::{ProviderResolver, ResolvedDownloader, Strategy};

use core_runtime::logging::redact_url;
use tracing::{info, instrument, warn};

/// Primary façade exposed to host applications.
///
/// Every failure surfaces as a [`DownloadError`]. Provider failures and
/// invalid input pass through as is; anything else is wrapped once into
/// [`DownloadError::Generic`].
#[derive(Clone)]
pub struct FileDownloader {
    resolver: ProviderResolver,
}

impl FileDownloader {
    pub fn new(resolver: ProviderResolver) -> Self {
        Self { resolver }
    }

    pub fn from_config(config: CoreConfig) -> Self {
        Self::new(ProviderResolver::from_config(&config))
    }

    pub fn resolver(&self) -> &ProviderResolver {
        &self.resolver
    }

    /// Download `url` into the downloads directory.
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    pub async fn download(
        &self,
        url: &str,
    ) -> std::result::Result<DownloadResult, DownloadError> {
        let outcome = match self.resolver.resolve(url) {
            Ok(downloader) => downloader.download(url).await,
            Err(error) => Err(error),
        };

        match outcome {
            Ok(result) => {
                info!(path = ?result.path, size = result.size, "File downloaded");
                Ok(result)
            }
            Err(error) => {
                warn!(error = %error, "File download failed");
                Err(normalize_error(error))
            }
        }
    }

    /// Whether `url` can be routed to a provider. Reachability is not checked.
    pub fn is_supported(&self, url: &str) -> bool {
        self.resolver.resolve(url).is_ok()
    }
}

fn normalize_error(error: DownloadError) -> DownloadError {
    if error.is_download_failure() {
        error
    } else {
        DownloadError::generic(error)
    }
}

/// Build a [`FileDownloader`] on the desktop adapters, writing into
/// `downloads_dir`.
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(downloads_dir: impl Into<std::path::PathBuf>) -> Result<FileDownloader> {
    let config = CoreConfig::builder().downloads_dir(downloads_dir).build()?;
    Ok(FileDownloader::from_config(config))
}
