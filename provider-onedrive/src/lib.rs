//! # OneDrive Provider
//!
//! Download strategy for OneDrive share links.
//!
//! ## Overview
//!
//! This module provides:
//! - Resolution of `1drv.ms` short links by following their redirects
//! - Extraction of the `redeem` share token from the resolved link
//! - The anonymous Badger token exchange and the share metadata lookup that
//!   yields the actual download URL
//!
//! A Badger token is fetched for every download and never cached.

pub mod connector;
pub mod error;
pub mod token;
pub mod types;

pub use connector::OneDriveDownloader;
pub use error::{OneDriveError, Result};
pub use token::{BadgerToken, OneDriveTokenService};
