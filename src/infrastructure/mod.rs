// src/infrastructure/mod.rs
pub mod archive;
pub mod artifact;
pub mod collection_db;
pub mod config;
pub mod media_stager;
pub mod package_reader;
pub mod package_writer;
pub mod scratch;

pub use artifact::{ArtifactStream, PackageArtifact};
pub use config::Config;
pub use package_reader::{inspect_package, PackageSummary};
pub use package_writer::PackageWriter;
pub use scratch::{ScratchDir, TempScratchProvider};
