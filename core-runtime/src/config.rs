//! # Core Configuration Module
//!
//! Provides configuration management for the download core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the capabilities and tuning values every downloader is
//! built from. It enforces fail-fast validation so a misconfigured host finds
//! out at startup rather than on the first download.
//!
//! ## Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `FileSystemAccess` - Destination directory I/O (desktop default: tokio fs)
//!
//! When the `desktop-shims` feature is enabled, the desktop adapters are
//! injected automatically if not provided, and the downloads directory
//! defaults to the platform download directory.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .downloads_dir("/srv/uploads/incoming")
//!     .direct_download_threshold(256 * 1024)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FileSystemAccess, HttpClient};
use std::path::PathBuf;
use std::sync::Arc;

/// Bodies at or under this many bytes (0.1 MiB) are buffered and written once.
pub const DEFAULT_DIRECT_DOWNLOAD_THRESHOLD: u64 = 1024 * 1024 / 10;

/// Redirect budget for the download request.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Share links bounce through several hosts; anything lower breaks them.
pub const MIN_MAX_REDIRECTS: usize = 10;

/// How many `_<n>` suffixes are tried before giving up on a unique name.
pub const DEFAULT_MAX_UNIQUE_NAME_ATTEMPTS: u32 = 1000;

/// Destination directory when neither the host nor a platform default sets one.
pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

/// Tuning values shared by every downloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Directory downloaded files are materialized in (created if absent)
    pub downloads_dir: PathBuf,

    /// Largest declared `Content-Length` written with a single buffered write
    pub direct_download_threshold: u64,

    /// Redirect budget for the download GET
    pub max_redirects: usize,

    /// Upper bound on collision-avoiding rename attempts
    pub max_unique_name_attempts: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from(DEFAULT_DOWNLOADS_DIR),
            direct_download_threshold: DEFAULT_DIRECT_DOWNLOAD_THRESHOLD,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_unique_name_attempts: DEFAULT_MAX_UNIQUE_NAME_ATTEMPTS,
        }
    }
}

impl DownloadSettings {
    /// Validates the settings and returns an error if invalid.
    ///
    /// This checks:
    /// - Downloads directory is not empty
    /// - Direct download threshold is greater than 0
    /// - Redirect budget is at least [`MIN_MAX_REDIRECTS`]
    /// - At least one unique name attempt is allowed
    pub fn validate(&self) -> Result<()> {
        if self.downloads_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "Downloads directory cannot be empty".to_string(),
            ));
        }

        if self.direct_download_threshold == 0 {
            return Err(Error::Config(
                "Direct download threshold must be greater than 0 bytes".to_string(),
            ));
        }

        if self.max_redirects < MIN_MAX_REDIRECTS {
            return Err(Error::Config(format!(
                "Redirect budget must be at least {} (got {})",
                MIN_MAX_REDIRECTS, self.max_redirects
            )));
        }

        if self.max_unique_name_attempts == 0 {
            return Err(Error::Config(
                "At least one unique file name attempt is required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Core configuration for the download core.
///
/// Holds the capabilities and settings required to build downloaders. Use
/// [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Download tuning values
    pub settings: DownloadSettings,

    /// HTTP client shared by all downloads
    pub http_client: Arc<dyn HttpClient>,

    /// File system the downloads directory lives on
    pub file_system: Arc<dyn FileSystemAccess>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("settings", &self.settings)
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Other hosts: inject a platform-native adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "No file system implementation provided. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default TokioFileSystem. \
                 Other hosts: inject a platform-native adapter."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new()
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn default_downloads_dir() -> PathBuf {
    bridge_desktop::TokioFileSystem::default_downloads_dir()
}

#[cfg(not(feature = "desktop-shims"))]
fn default_downloads_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOADS_DIR)
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    downloads_dir: Option<PathBuf>,
    direct_download_threshold: Option<u64>,
    max_redirects: Option<usize>,
    max_unique_name_attempts: Option<u32>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
}

impl CoreConfigBuilder {
    /// Sets the directory downloaded files are written to.
    pub fn downloads_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.downloads_dir = Some(path.into());
        self
    }

    /// Sets the largest body size written with a single buffered write.
    pub fn direct_download_threshold(mut self, bytes: u64) -> Self {
        self.direct_download_threshold = Some(bytes);
        self
    }

    /// Sets the redirect budget for the download request.
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = Some(max_redirects);
        self
    }

    /// Sets how many collision-avoiding names are tried.
    pub fn max_unique_name_attempts(mut self, attempts: u32) -> Self {
        self.max_unique_name_attempts = Some(attempts);
        self
    }

    /// Replaces every tuning value at once.
    pub fn settings(mut self, settings: DownloadSettings) -> Self {
        self.downloads_dir = Some(settings.downloads_dir);
        self.direct_download_threshold = Some(settings.direct_download_threshold);
        self.max_redirects = Some(settings.max_redirects);
        self.max_unique_name_attempts = Some(settings.max_unique_name_attempts);
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the file system implementation.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Builds the final [`CoreConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if a capability is missing and no platform default is
    /// available, or if any tuning value fails validation.
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let defaults = DownloadSettings::default();
        let settings = DownloadSettings {
            downloads_dir: self.downloads_dir.unwrap_or_else(default_downloads_dir),
            direct_download_threshold: self
                .direct_download_threshold
                .unwrap_or(defaults.direct_download_threshold),
            max_redirects: self.max_redirects.unwrap_or(defaults.max_redirects),
            max_unique_name_attempts: self
                .max_unique_name_attempts
                .unwrap_or(defaults.max_unique_name_attempts),
        };

        let config = CoreConfig {
            settings,
            http_client,
            file_system,
        };

        config.validate()?;

        Ok(config)
    }
}
