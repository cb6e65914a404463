//! Error types for the download pipeline

use bridge_traits::error::BridgeError;
use thiserror::Error;

use crate::provider::Provider;

/// Boxed cause carried by provider and generic failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty, malformed or unsupported input URL, or a URL missing a required part
    InvalidUrl,
    /// A provider could not deliver the file
    DownloadFailed,
    /// Anything else (filesystem, transport, unexpected)
    Other,
}

/// Download pipeline errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The input URL cannot be downloaded from
    #[error("{0}")]
    InvalidUrl(String),

    /// Failure attributed to one provider, wrapping what went wrong
    #[error("{}: {}", .provider.failure_prefix(), .cause)]
    Provider {
        provider: Provider,
        #[source]
        cause: BoxError,
    },

    /// The provider answered with an HTML page nobody knows how to handle
    #[error("Unable to process HTML file")]
    UnexpectedHtml,

    /// The final download response was not a 2xx. `url` is reduced to its
    /// origin since download URLs may be pre-authenticated.
    #[error("HTTP {status} returned for {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Reading the body from the transport failed
    #[error("Failed to download file: {0}")]
    Transfer(#[source] BridgeError),

    /// The request could not be executed
    #[error("HTTP request failed: {0}")]
    Http(#[source] BridgeError),

    /// Filesystem I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Destination file could not be named or created
    #[error("{0}")]
    File(String),

    /// Unanticipated failure, wrapped once at the public boundary
    #[error("Download failed: {message}")]
    Generic {
        message: String,
        #[source]
        source: BoxError,
    },
}

impl DownloadError {
    /// Attribute a provider-specific error to `provider`.
    pub fn provider(provider: Provider, cause: impl Into<BoxError>) -> Self {
        DownloadError::Provider {
            provider,
            cause: cause.into(),
        }
    }

    /// Wrap `error` as a failure of `provider`, unless it already is a
    /// provider failure.
    pub fn provider_failure(provider: Provider, error: DownloadError) -> Self {
        match error {
            DownloadError::Provider { .. } => error,
            other => DownloadError::provider(provider, other),
        }
    }

    /// Wrap an unanticipated error into [`DownloadError::Generic`].
    pub fn generic(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        DownloadError::Generic {
            message: source.to_string(),
            source,
        }
    }

    /// Map a filesystem capability error.
    pub fn storage(error: BridgeError) -> Self {
        match error {
            BridgeError::Io(e) => DownloadError::Io(e),
            other => DownloadError::File(other.to_string()),
        }
    }

    /// Provider the failure is attributed to, if any.
    pub fn provider_kind(&self) -> Option<Provider> {
        match self {
            DownloadError::Provider { provider, .. } => Some(*provider),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            DownloadError::Provider { cause, .. } => match cause.downcast_ref::<DownloadError>() {
                Some(DownloadError::InvalidUrl(_)) => ErrorKind::InvalidUrl,
                _ => ErrorKind::DownloadFailed,
            },
            DownloadError::UnexpectedHtml
            | DownloadError::UnexpectedStatus { .. }
            | DownloadError::Transfer(_) => ErrorKind::DownloadFailed,
            DownloadError::Http(_)
            | DownloadError::Io(_)
            | DownloadError::File(_)
            | DownloadError::Generic { .. } => ErrorKind::Other,
        }
    }

    /// Whether this error belongs to the download error family and may cross
    /// the public boundary unwrapped.
    pub fn is_download_failure(&self) -> bool {
        matches!(
            self,
            DownloadError::InvalidUrl(_)
                | DownloadError::Provider { .. }
                | DownloadError::UnexpectedHtml
                | DownloadError::UnexpectedStatus { .. }
                | DownloadError::Transfer(_)
                | DownloadError::Generic { .. }
        )
    }
}

/// Result type for download operations
pub type Result<T> = std::result::Result<T, DownloadError>;
