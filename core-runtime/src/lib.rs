//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the download core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other crates depend on. It
//! establishes the logging conventions and the validated configuration every
//! downloader is built from.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
