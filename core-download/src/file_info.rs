//! File name and MIME type resolution
//!
//! Derives a safe local file name and a content type from the response
//! headers and the URL the body was fetched from, and picks a destination
//! path that does not clobber an existing file.

use bridge_traits::http::find_header;
use bridge_traits::storage::FileSystemAccess;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use crate::error::{DownloadError, Result};

/// Content type reported when the server sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Name used when neither the headers nor the URL yield one.
pub const DEFAULT_FILE_NAME: &str = "downloaded_file";

/// Tried in order; the first match wins.
static DISPOSITION_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r#"filename="([^"]+)""#).expect("valid quoted filename pattern"),
        Regex::new(r"filename=([^;]+)").expect("valid bare filename pattern"),
        Regex::new(r"filename\*=UTF-8''([^;]+)").expect("valid extended filename pattern"),
    ]
});

static UNSAFE_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_.-]").expect("valid sanitize pattern"));

/// Resolved metadata for one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub file_name: String,
    pub content_type: String,
}

/// Resolve the local file name and content type of a response.
///
/// The name comes from `Content-Disposition` when present, otherwise from the
/// last path segment of `url`. It is then sanitized and, when it has no
/// extension, given one inferred from the content type.
pub fn resolve_filename_and_mime(url: &str, headers: &HashMap<String, String>) -> FileInfo {
    let content_type = find_header(headers, "content-type")
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let disposition = find_header(headers, "content-disposition").unwrap_or("");

    let raw_name = filename_from_disposition(disposition).or_else(|| filename_from_url(url));
    let file_name = ensure_extension(sanitize_file_name(raw_name.as_deref()), &content_type);

    debug!(file_name = %file_name, content_type = %content_type, "Resolved file info");

    FileInfo {
        file_name,
        content_type,
    }
}

fn filename_from_disposition(disposition: &str) -> Option<String> {
    DISPOSITION_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(disposition)
            .and_then(|captures| captures.get(1))
            .map(|name| basename(&url_decode(name.as_str())).to_string())
    })
}

fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = basename(parsed.path());
    (!name.is_empty()).then(|| name.to_string())
}

/// Last component of a `/` or `\` separated path, ignoring trailing separators.
fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

/// Form-style percent decoding: `+` becomes a space and invalid UTF-8 is
/// replaced rather than rejected.
fn url_decode(value: &str) -> String {
    let spaced = value.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

fn sanitize_file_name(name: Option<&str>) -> String {
    let name = match name {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_FILE_NAME,
    };

    let sanitized = UNSAFE_CHARACTERS
        .replace_all(&url_decode(name), "_")
        .into_owned();

    if sanitized.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        sanitized
    }
}

/// Split `name` at its last `.`; an empty extension counts as none.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((base, extension)) if !extension.is_empty() => (base, Some(extension)),
        Some((base, _)) => (base, None),
        None => (name, None),
    }
}

fn ensure_extension(file_name: String, content_type: &str) -> String {
    if split_extension(&file_name).1.is_some() {
        return file_name;
    }

    match extension_for_mime(content_type) {
        Some(extension) => format!("{}.{}", file_name, extension),
        None => file_name,
    }
}

/// Extension for a MIME type, ignoring parameters and case.
pub fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let extension = match essence.as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "application/json" => "json",
        "text/plain" => "txt",
        "text/html" => "html",
        "text/css" => "css",
        "text/javascript" | "application/javascript" => "js",
        "application/xml" => "xml",
        "application/zip" => "zip",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.ms-word" => "doc",
        "application/vnd.ms-powerpoint" => "ppt",
        _ => return None,
    };
    Some(extension)
}

/// Pick a path under `dir` for `file_name` that does not exist yet.
///
/// Creates `dir` when absent. On collision, `_1`, `_2`, ... is inserted
/// before the extension, up to `max_attempts` times. The check is not atomic:
/// two downloads racing for the same name in the same directory can both
/// pick it.
///
/// # Errors
///
/// Returns [`DownloadError::File`] when `file_name` is empty or every
/// candidate is taken, and an I/O error when the directory cannot be
/// inspected or created.
pub async fn unique_destination(
    fs: &dyn FileSystemAccess,
    dir: &Path,
    file_name: &str,
    max_attempts: u32,
) -> Result<PathBuf> {
    if file_name.is_empty() {
        return Err(DownloadError::File("File name cannot be empty".to_string()));
    }

    if !fs.exists(dir).await.map_err(DownloadError::storage)? {
        fs.create_dir_all(dir).await.map_err(DownloadError::storage)?;
    }

    let candidate = dir.join(file_name);
    if !fs.exists(&candidate).await.map_err(DownloadError::storage)? {
        return Ok(candidate);
    }

    let (base, extension) = split_extension(file_name);
    for counter in 1..=max_attempts {
        let name = match extension {
            Some(extension) => format!("{}_{}.{}", base, counter, extension),
            None => format!("{}_{}", base, counter),
        };
        let candidate = dir.join(&name);
        if !fs.exists(&candidate).await.map_err(DownloadError::storage)? {
            debug!(file_name = %name, "Renamed download to avoid collision");
            return Ok(candidate);
        }
    }

    Err(DownloadError::File(
        "Unable to generate unique file name after maximum attempts".to_string(),
    ))
}
