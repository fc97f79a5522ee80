pub mod fs;
pub mod regex;

use std::{io, path::Path, path::PathBuf};

use fs::{FileHash, PartialFile};
use futures_util::StreamExt;
use percent_encoding::percent_decode_str;
use smol::io::AsyncWriteExt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> DownloadError + '_ {
    move |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Last non-empty path segment of `url`, ignoring query and fragment,
/// percent-decoded. A segment that does not decode to UTF-8 is kept as is.
pub fn get_url_filename(url: &str) -> Option<String> {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let segment = url[..end].split('/').filter(|s| !s.is_empty()).last()?;
    match percent_decode_str(segment).decode_utf8() {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => Some(segment.to_string()),
    }
}

/// Stream `url` into `path`.
///
/// The bytes land in a [`PartialFile`] next to `path` and only replace it
/// once complete and, if `expected` is given, verified. On any error, or if
/// the returned future is dropped, no partial file is left behind.
pub async fn download_from_url<S: AsRef<str>, P: AsRef<Path>>(
    client: &reqwest::Client,
    url: S,
    path: P,
    expected: Option<&FileHash>,
    on_progress: impl Fn((u64, u64)),
) -> Result<PathBuf, DownloadError> {
    let url = url.as_ref();
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        smol::fs::create_dir_all(parent).await.map_err(io_err(parent))?;
    }

    let res = client.get(url).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let total_bytes = res.content_length().unwrap_or(0);
    let mut downloaded_bytes = 0;

    let partial = PartialFile::new(path);
    {
        let mut file = smol::fs::File::create(partial.path())
            .await
            .map_err(io_err(partial.path()))?;

        let mut stream = res.bytes_stream();
        while let Some(bytes) = stream.next().await {
            let bytes = bytes?;
            file.write_all(&bytes)
                .await
                .map_err(io_err(partial.path()))?;
            downloaded_bytes += bytes.len() as u64;
            on_progress((downloaded_bytes, total_bytes.max(downloaded_bytes)));
        }

        file.flush().await.map_err(io_err(partial.path()))?;
        file.sync_all().await.map_err(io_err(partial.path()))?;
    }
    debug!("received {downloaded_bytes} bytes from {url}");

    if let Some(expected) = expected {
        let actual = expected
            .compute(partial.path())
            .await
            .map_err(io_err(partial.path()))?;
        if !expected.matches_hex(&actual) {
            return Err(DownloadError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    partial.commit().await.map_err(io_err(path))
}
