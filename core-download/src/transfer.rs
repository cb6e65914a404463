//! Chunked copy of a streamed response body into a writer.

use bridge_traits::error::BridgeError;
use bridge_traits::http::ChunkStream;
use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{trace, warn};

use crate::error::{DownloadError, Result};

/// Copy `chunks` into `writer` as they arrive and return the bytes written.
///
/// Stops at the first chunk flagged `is_timeout` or `is_last`, without
/// writing it. A timeout is not reported as an error, so a stalled transfer
/// leaves a truncated body behind; it is logged at warn level.
pub async fn copy_chunks<W>(mut chunks: ChunkStream, writer: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written: u64 = 0;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(DownloadError::Transfer)?;

        if chunk.is_timeout {
            warn!(bytes_written = written, "Transport timed out, stopping transfer");
            break;
        }
        if chunk.is_last {
            break;
        }

        writer
            .write_all(&chunk.content)
            .await
            .map_err(|e| DownloadError::Transfer(BridgeError::Io(e)))?;
        written += chunk.content.len() as u64;
        trace!(chunk = chunk.content.len(), total = written, "Wrote chunk");
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::Transfer(BridgeError::Io(e)))?;

    Ok(written)
}
