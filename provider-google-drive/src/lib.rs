//! # Google Drive Provider
//!
//! Download strategy for Google Drive share links.
//!
//! ## Overview
//!
//! This module provides:
//! - File ID extraction from `/file/d/<id>` links and `id=<id>` parameters
//! - Rewriting to the public `uc?export=download` endpoint
//! - Classification of the HTML interstitials Google serves instead of the
//!   file (sign-in wall, virus scan warning)
//!
//! Files too large for Google's virus scan are reported as failures; the
//! confirmation form on that page is not submitted.

pub mod connector;
pub mod error;

pub use connector::GoogleDriveDownloader;
pub use error::{GoogleDriveError, Result};
