//! Error types for Google Drive provider

use core_download::{DownloadError, Provider};
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GoogleDriveError {
    /// No file ID could be found in the share link
    #[error("Invalid Google Drive URL.")]
    InvalidUrl,

    /// Google answered with its sign-in page
    #[error("Google Drive file is not publicly accessible.")]
    NotPubliclyAccessible,

    /// Google answered with its virus scan warning page
    #[error("File is too large for Google to scan for viruses.")]
    VirusScanWarning,

    /// Google answered with some other HTML page
    #[error("Received HTML instead of file.")]
    HtmlInsteadOfFile,
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl From<GoogleDriveError> for DownloadError {
    fn from(error: GoogleDriveError) -> Self {
        DownloadError::provider(Provider::GoogleDrive, error)
    }
}
