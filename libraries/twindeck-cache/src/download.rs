//! Song file downloads.

use crate::error::{CacheError, Result};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Download `url` into `dest`.
///
/// The body is streamed into `<dest>.part` and renamed once complete, so a
/// reader never sees a half-written song. Returns the number of bytes written.
pub async fn download_to(http: &Client, url: &str, dest: &Path) -> Result<u64> {
    debug!(url = %url, dest = %dest.display(), "Downloading song");

    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CacheError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    // Create parent directories if needed
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(dest);
    let written = match write_body(response, &partial).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
    };

    tokio::fs::rename(&partial, dest).await?;

    info!(dest = %dest.display(), size = written, "Song cached");
    Ok(written)
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut written: u64 = 0;

    // Stream the response body
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

pub(crate) fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
