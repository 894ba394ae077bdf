// src/application/mod.rs
pub mod deck_assembler;
pub mod model_registry;
pub mod package_generator;
pub mod request;

pub use deck_assembler::DeckAssembler;
pub use model_registry::ModelRegistry;
pub use package_generator::{PackageGenerator, ScratchProvider};
pub use request::{DeckSpec, FieldSpec, GenerateRequest, ModelSpec, NoteSpec, TemplateSpec};
