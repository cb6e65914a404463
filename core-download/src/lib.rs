//! # Download Pipeline
//!
//! Fetches a file behind a URL and materializes it in the downloads
//! directory.
//!
//! ## Overview
//!
//! A download runs through the shared [`Downloader`] sequence, customized by a
//! [`ProviderStrategy`]:
//!
//! 1. The strategy rewrites the input URL into the URL serving the bytes
//! 2. The URL is fetched with browser-like headers
//! 3. HTML answers are handed to the strategy, which rejects or accepts them
//! 4. A file name and MIME type are resolved from the headers and URL
//! 5. The body is written with a single buffered write when it is small and
//!    its length is declared, chunk by chunk otherwise
//!
//! Any file created for a failed download is removed before the error is
//! returned. Nothing is retried.
//!
//! Provider crates (`provider-google-drive`, `provider-onedrive`) supply the
//! indirect strategies; [`DirectDownloader`] covers plain links.

pub mod direct;
pub mod downloader;
pub mod error;
pub mod file_info;
pub mod parsed_url;
pub mod provider;
pub mod result;
pub mod transfer;

pub use direct::DirectDownloader;
pub use downloader::{Downloader, ProviderStrategy, BROWSER_HEADERS};
pub use error::{DownloadError, ErrorKind, Result};
pub use file_info::FileInfo;
pub use parsed_url::ParsedUrl;
pub use provider::Provider;
pub use result::DownloadResult;
