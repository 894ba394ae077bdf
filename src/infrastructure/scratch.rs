// src/infrastructure/scratch.rs
use crate::application::ScratchProvider;
use crate::constants::DEFAULT_SCRATCH_PREFIX;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, warn};

/// Remove a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Scratch directory owned by one generation.
///
/// The directory and everything in it is removed by [`ScratchDir::close`]
/// or, failing that, on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: Option<PathBuf>,
}

impl ScratchDir {
    /// Take ownership of an existing directory.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Remove the directory now and report whether that worked.
    pub fn close(mut self) -> io::Result<()> {
        match self.path.take() {
            Some(path) => {
                debug!(?path, "Removing scratch directory");
                remove_dir_if_exists(&path)
            }
            None => Ok(()),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = remove_dir_if_exists(&path) {
                warn!(?path, error = %e, "Failed to remove scratch directory");
            }
        }
    }
}

/// Scratch resources backed by `tempfile` unique names.
///
/// Uses the system temp directory unless a root is given, which lets tests
/// sandbox every generation inside their own directory.
#[derive(Debug, Clone)]
pub struct TempScratchProvider {
    root: Option<PathBuf>,
    prefix: String,
}

impl TempScratchProvider {
    pub fn new() -> Self {
        Self {
            root: None,
            prefix: DEFAULT_SCRATCH_PREFIX.to_string(),
        }
    }

    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            prefix: DEFAULT_SCRATCH_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for TempScratchProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchProvider for TempScratchProvider {
    fn scratch_dir(&self) -> io::Result<ScratchDir> {
        let dir = Builder::new()
            .prefix(&self.prefix)
            .rand_bytes(8)
            .tempdir_in(self.root())?;

        // ownership moves to ScratchDir so removal is reported through our guard
        let path = dir.keep();
        debug!(?path, "Acquired scratch directory");
        Ok(ScratchDir::adopt(path))
    }

    fn reserve_artifact_path(&self) -> io::Result<PathBuf> {
        // create a uniquely named file, then release it so only the name stays
        let reserved = Builder::new()
            .prefix(&self.prefix)
            .suffix(".apkg")
            .rand_bytes(8)
            .tempfile_in(self.root())?
            .into_temp_path();
        let path = reserved.to_path_buf();
        reserved.close()?;

        debug!(?path, "Reserved artifact path");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_sandbox_root_when_acquiring_scratch_then_creates_dir_inside_root() {
        let root = TempDir::new().unwrap();
        let provider = TempScratchProvider::in_dir(root.path());

        let scratch = provider.scratch_dir().unwrap();

        assert!(scratch.path().is_dir());
        assert!(scratch.path().starts_with(root.path()));
    }

    #[test]
    fn given_scratch_dir_with_files_when_dropped_then_removes_everything() {
        let root = TempDir::new().unwrap();
        let provider = TempScratchProvider::in_dir(root.path());
        let scratch = provider.scratch_dir().unwrap();
        let path = scratch.path().to_path_buf();
        fs::create_dir(path.join("media")).unwrap();
        fs::write(path.join("media").join("a.png"), b"png").unwrap();

        drop(scratch);

        assert!(!path.exists());
    }

    #[test]
    fn given_already_removed_dir_when_closing_then_succeeds() {
        let root = TempDir::new().unwrap();
        let scratch = TempScratchProvider::in_dir(root.path()).scratch_dir().unwrap();
        fs::remove_dir_all(scratch.path()).unwrap();

        assert!(scratch.close().is_ok());
    }

    #[test]
    fn given_reservation_when_reserving_then_path_is_unique_and_absent() {
        let root = TempDir::new().unwrap();
        let provider = TempScratchProvider::in_dir(root.path()).with_prefix("test-");

        let first = provider.reserve_artifact_path().unwrap();
        let second = provider.reserve_artifact_path().unwrap();

        assert_ne!(first, second);
        assert!(!first.exists());
        assert!(!second.exists());
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("test-"));
    }

    #[test]
    fn given_missing_file_when_removing_then_is_ok() {
        let root = TempDir::new().unwrap();

        assert!(remove_file_if_exists(&root.path().join("nope")).is_ok());
    }
}
