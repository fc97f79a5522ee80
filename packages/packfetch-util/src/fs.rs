use std::{
    fmt::{self, Display, Formatter},
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use sha::{
    sha1::Sha1,
    sha512::Sha512,
    utils::{Digest, DigestExt},
};
use tracing::debug;

/// get sha1 hash of a file
pub fn get_sha1_hash<P: AsRef<Path>>(path: P) -> Result<String, io::Error> {
    let bytes = fs::read(path)?;
    let res = Sha1::default().digest(&bytes).to_hex();
    Ok(res)
}

/// get sha512 hash of a file
pub fn get_sha512_hash<P: AsRef<Path>>(path: P) -> Result<String, io::Error> {
    let bytes = fs::read(path)?;
    let res = Sha512::default().digest(&bytes).to_hex();
    Ok(res)
}

/// An expected digest, as published next to a downloadable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileHash {
    Sha1(String),
    Sha512(String),
}

impl FileHash {
    pub fn expected(&self) -> &str {
        match self {
            Self::Sha1(hex) | Self::Sha512(hex) => hex,
        }
    }

    /// Hash `path` with the same algorithm, off the async executor.
    pub async fn compute<P: AsRef<Path>>(&self, path: P) -> io::Result<String> {
        let path = path.as_ref().to_path_buf();
        match self {
            Self::Sha1(_) => smol::unblock(move || get_sha1_hash(path)).await,
            Self::Sha512(_) => smol::unblock(move || get_sha512_hash(path)).await,
        }
    }

    pub fn matches_hex(&self, actual: &str) -> bool {
        self.expected().eq_ignore_ascii_case(actual)
    }

    pub async fn matches<P: AsRef<Path>>(&self, path: P) -> io::Result<bool> {
        Ok(self.matches_hex(&self.compute(path).await?))
    }
}

impl Display for FileHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1(hex) => write!(f, "sha1:{hex}"),
            Self::Sha512(hex) => write!(f, "sha512:{hex}"),
        }
    }
}

/// A sibling of the destination that bytes are written to before they are
/// moved into place.
///
/// Dropped without [`PartialFile::commit`] (error, cancelled future) the
/// partial file is removed.
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl PartialFile {
    pub fn new<P: AsRef<Path>>(dest: P) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let dest = dest.as_ref().to_path_buf();
        let name = dest
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = dest.with_file_name(format!(".{name}.{}-{n}.part", std::process::id()));
        Self {
            path,
            dest,
            committed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Move the partial file onto the destination, replacing it.
    pub async fn commit(mut self) -> io::Result<PathBuf> {
        smol::fs::rename(&self.path, &self.dest).await?;
        self.committed = true;
        Ok(self.dest.clone())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("removed partial file {:?}", self.path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => debug!("failed to remove partial file {:?}: {err}", self.path),
        }
    }
}
