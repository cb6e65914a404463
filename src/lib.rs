//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-download`). Host applications
//! can depend on `cloud-fetch-workspace` with the `desktop-shims` feature and
//! get the facade re-exported here without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{DownloadError, DownloadResult, FileDownloader};
