//! # Host Bridge Traits
//!
//! Capability traits the download core requires from its host.
//!
//! ## Overview
//!
//! This crate defines the contract between the download pipeline and
//! platform-specific implementations. Each trait represents a capability that
//! the core needs but does not own: the HTTP transport, the filesystem the
//! downloads land on, and the sink logs are mirrored into.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Buffered and chunk-streamed HTTP requests
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Destination directory I/O
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., file paths, URLs)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds: independent downloads share
//! one HTTP client and one filesystem handle.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, StreamingResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         todo!()
//!     }
//!
//!     async fn execute_streaming(&self, request: HttpRequest) -> Result<StreamingResponse> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod logging;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{
    ChunkStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, ResponseChunk,
    StreamingResponse,
};
pub use storage::{DynAsyncWrite, FileMetadata, FileSystemAccess};
pub use logging::{LogEntry, LogLevel, LoggerSink};
