use thiserror::Error;

/// Errors raised while assembling a [`FileDownloader`](crate::FileDownloader).
///
/// Download failures themselves are reported as
/// [`DownloadError`](crate::DownloadError).
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
