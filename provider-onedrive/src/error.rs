use bridge_traits::error::BridgeError;
use core_download::{DownloadError, Provider};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OneDriveError {
    /// The resolved share link lacks a part the share API needs
    #[error("{0}")]
    InvalidUrl(String),

    #[error("Failed to resolve short URL, HTTP status {0}")]
    ShortUrlStatus(u16),

    #[error("Failed to resolve short URL")]
    ShortUrlUnresolved,

    /// No Badger token, or the share item carries no download URL
    #[error("Failed to generate download URL from OneDrive.")]
    DownloadUrlUnavailable,

    /// The share metadata request failed or could not be decoded
    #[error("Failed to fetch OneDrive download URL.")]
    ShareFetch(#[source] BridgeError),

    #[error("Failed to fetch OneDrive download URL, HTTP status {0}")]
    ShareFetchStatus(u16),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, OneDriveError>;

impl From<OneDriveError> for DownloadError {
    fn from(error: OneDriveError) -> Self {
        match error {
            OneDriveError::InvalidUrl(message) => {
                DownloadError::provider(Provider::OneDrive, DownloadError::InvalidUrl(message))
            }
            other => DownloadError::provider(Provider::OneDrive, other),
        }
    }
}
