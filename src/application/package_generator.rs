// src/application/package_generator.rs
use crate::application::deck_assembler::DeckAssembler;
use crate::application::model_registry::ModelRegistry;
use crate::application::request::GenerateRequest;
use crate::domain::{PackageError, Timestamp};
use crate::infrastructure::archive::ArchiveOptions;
use crate::infrastructure::artifact::PackageArtifact;
use crate::infrastructure::package_writer::PackageWriter;
use crate::infrastructure::scratch::ScratchDir;
use std::io;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Source of request-scoped filesystem resources.
///
/// Every call must hand out a fresh, uniquely named resource so concurrent
/// generations never share one.
pub trait ScratchProvider {
    /// A new empty directory, removed when the returned guard is dropped.
    fn scratch_dir(&self) -> io::Result<ScratchDir>;

    /// A unique path for the finished archive. Nothing exists at the path
    /// when this returns.
    fn reserve_artifact_path(&self) -> io::Result<PathBuf>;
}

/// Use case: turn a request into a package artifact.
pub struct PackageGenerator<P: ScratchProvider> {
    provider: P,
    options: ArchiveOptions,
}

impl<P: ScratchProvider> PackageGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            options: ArchiveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    /// Build models and decks, then write the package.
    ///
    /// Validation runs before any filesystem resource is acquired. A missing
    /// `timestamp` means now.
    #[instrument(
        level = "debug",
        skip_all,
        fields(
            models = request.models.len(),
            decks = request.decks.len(),
            media = request.files.len()
        )
    )]
    pub fn generate(
        &self,
        request: &GenerateRequest,
        timestamp: Option<f64>,
    ) -> Result<PackageArtifact, PackageError> {
        let timestamp = match timestamp {
            Some(secs) => Timestamp::from_secs_f64(secs)?,
            None => Timestamp::now(),
        };

        let registry = ModelRegistry::build(&request.models)?;
        let decks = DeckAssembler::new(&registry).assemble(&request.decks)?;

        let artifact = PackageWriter::new(&self.provider, &self.options).write(
            &registry,
            &decks,
            &request.files,
            timestamp,
        )?;

        info!(path = ?artifact.path(), "Generated package");
        Ok(artifact)
    }
}
