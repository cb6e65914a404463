use std::path::PathBuf;

/// A file that was fully written to the downloads directory.
///
/// The file is owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Where the file was written (may carry a `_<n>` collision suffix)
    pub path: PathBuf,
    /// Name resolved from the response, before collision renaming
    pub original_file_name: String,
    /// Bytes on disk
    pub size: u64,
    /// `Content-Type` as reported by the server
    pub mime_type: String,
}
