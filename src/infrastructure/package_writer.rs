// src/infrastructure/package_writer.rs
use crate::application::{ModelRegistry, ScratchProvider};
use crate::constants::COLLECTION_ENTRY_NAME;
use crate::domain::{Deck, PackageError, Timestamp};
use crate::infrastructure::archive::{self, ArchiveOptions};
use crate::infrastructure::artifact::PackageArtifact;
use crate::infrastructure::collection_db;
use crate::infrastructure::media_stager;
use crate::infrastructure::scratch::ScratchDir;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Materializes assembled decks and media into a package file.
pub struct PackageWriter<'a, P: ScratchProvider> {
    provider: &'a P,
    options: &'a ArchiveOptions,
}

impl<'a, P: ScratchProvider> PackageWriter<'a, P> {
    pub fn new(provider: &'a P, options: &'a ArchiveOptions) -> Self {
        Self { provider, options }
    }

    /// Stage media, write the collection and the archive.
    ///
    /// The scratch directory is gone when this returns, whatever the outcome.
    /// On error the partially written artifact is gone as well.
    #[instrument(level = "debug", skip_all, fields(decks = decks.len(), media = media.len()))]
    pub fn write(
        &self,
        registry: &ModelRegistry,
        decks: &[Deck],
        media: &BTreeMap<String, String>,
        timestamp: Timestamp,
    ) -> Result<PackageArtifact, PackageError> {
        let scratch = self.provider.scratch_dir().map_err(PackageError::Scratch)?;
        let artifact = match self.provider.reserve_artifact_path() {
            Ok(path) => PackageArtifact::adopt(path),
            Err(e) => {
                release_scratch(scratch);
                return Err(PackageError::Scratch(e));
            }
        };

        let result = self.populate(scratch.path(), artifact.path(), registry, decks, media, timestamp);
        release_scratch(scratch);

        match result {
            Ok(()) => Ok(artifact),
            Err(e) => {
                debug!(error = %e, "Package generation failed, discarding artifact");
                // dropping the artifact deletes whatever was written
                drop(artifact);
                Err(e)
            }
        }
    }

    fn populate(
        &self,
        scratch: &Path,
        artifact_path: &Path,
        registry: &ModelRegistry,
        decks: &[Deck],
        media: &BTreeMap<String, String>,
        timestamp: Timestamp,
    ) -> Result<(), PackageError> {
        let staged = media_stager::stage_media(&scratch.join("media"), media)?;

        let collection = scratch.join(COLLECTION_ENTRY_NAME);
        collection_db::write_collection(&collection, registry, decks, timestamp)?;

        archive::write_archive(artifact_path, &collection, &staged, timestamp, self.options)
    }
}

/// Remove the scratch directory. A failure here is logged and never
/// replaces the outcome of the generation itself.
fn release_scratch(scratch: ScratchDir) {
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!(?path, error = %e, "Failed to remove scratch directory");
    }
}
