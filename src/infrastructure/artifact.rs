// src/infrastructure/artifact.rs
use crate::infrastructure::scratch::remove_file_if_exists;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn discard(path: &Path) {
    match remove_file_if_exists(path) {
        Ok(()) => debug!(?path, "Removed package artifact"),
        Err(e) => warn!(?path, error = %e, "Failed to remove package artifact"),
    }
}

/// A finished package on disk.
///
/// The file belongs to this value: dropping it deletes the file. Hand it to
/// a consumer with [`PackageArtifact::into_stream`].
#[derive(Debug)]
pub struct PackageArtifact {
    path: Option<PathBuf>,
}

impl PackageArtifact {
    pub(crate) fn adopt(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    pub fn size(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(self.path())?.len())
    }

    /// Open the artifact as a chunked byte stream that owns the file.
    ///
    /// If opening fails the artifact is deleted before the error returns.
    pub fn into_stream(mut self, chunk_size: usize) -> io::Result<ArtifactStream> {
        let Some(path) = self.path.take() else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "package artifact already released",
            ));
        };

        match File::open(&path) {
            Ok(file) => Ok(ArtifactStream {
                file: Some(file),
                path: Some(path),
                chunk_size: chunk_size.max(1),
            }),
            Err(e) => {
                discard(&path);
                Err(e)
            }
        }
    }
}

impl Drop for PackageArtifact {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            discard(&path);
        }
    }
}

/// Sequential reader over a package that deletes the file when done.
///
/// The file is removed as soon as the last chunk has been read, after a read
/// error, or when the stream is dropped before it is exhausted.
#[derive(Debug)]
pub struct ArtifactStream {
    file: Option<File>,
    path: Option<PathBuf>,
    chunk_size: usize,
}

impl ArtifactStream {
    fn release(&mut self) {
        // close before unlinking so removal also works on Windows
        self.file = None;
        if let Some(path) = self.path.take() {
            discard(&path);
        }
    }
}

impl Iterator for ArtifactStream {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.file.as_mut()?;
        let mut chunk = vec![0u8; self.chunk_size];

        loop {
            match file.read(&mut chunk) {
                Ok(0) => {
                    self.release();
                    return None;
                }
                Ok(n) => {
                    chunk.truncate(n);
                    return Some(Ok(chunk));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.release();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl Drop for ArtifactStream {
    fn drop(&mut self) {
        self.release();
    }
}
