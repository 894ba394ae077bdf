// src/util/testing.rs

use anyhow::Result;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::application::ScratchProvider;
use crate::infrastructure::scratch::{ScratchDir, TempScratchProvider};

/// Failure a [`FaultyScratchProvider`] injects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchFault {
    /// Scratch directory acquisition fails.
    ScratchUnavailable,
    /// Artifact path reservation fails.
    ReservationFails,
    /// Reservation succeeds with a path whose parent does not exist, so
    /// archive creation fails.
    UnwritableArtifact,
}

/// Scratch provider that works inside `root` but fails at one chosen step.
///
/// Lets tests drive the package writer's failure paths and then check that
/// `root` is empty again.
///
/// # Examples
///
/// ```
/// use ankipack::application::ScratchProvider;
/// use ankipack::util::testing::{FaultyScratchProvider, ScratchFault};
///
/// let root = tempfile::tempdir().unwrap();
/// let provider = FaultyScratchProvider::new(root.path(), ScratchFault::ReservationFails);
///
/// assert!(provider.scratch_dir().is_ok());
/// assert!(provider.reserve_artifact_path().is_err());
/// ```
pub struct FaultyScratchProvider {
    inner: TempScratchProvider,
    root: PathBuf,
    fault: ScratchFault,
}

impl FaultyScratchProvider {
    pub fn new(root: impl AsRef<Path>, fault: ScratchFault) -> Self {
        Self {
            inner: TempScratchProvider::in_dir(root.as_ref()),
            root: root.as_ref().to_path_buf(),
            fault,
        }
    }
}

impl ScratchProvider for FaultyScratchProvider {
    fn scratch_dir(&self) -> io::Result<ScratchDir> {
        match self.fault {
            ScratchFault::ScratchUnavailable => Err(io::Error::other("scratch space unavailable")),
            _ => self.inner.scratch_dir(),
        }
    }

    fn reserve_artifact_path(&self) -> io::Result<PathBuf> {
        match self.fault {
            ScratchFault::ReservationFails => Err(io::Error::other("no artifact name available")),
            ScratchFault::UnwritableArtifact => {
                Ok(self.root.join("does-not-exist").join("package.apkg"))
            }
            ScratchFault::ScratchUnavailable => self.inner.reserve_artifact_path(),
        }
    }
}

pub fn init_test_setup() -> Result<()> {
    // Set up logging first
    setup_test_logging();

    info!("Test Setup complete");
    Ok(())
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "trace");
    }

    // Create a filter for noisy modules
    let noisy_modules = ["rusqlite", "zip"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // Set up the subscriber with environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    // Build and set the subscriber
    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}
