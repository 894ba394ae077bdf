// src/domain/mod.rs
pub mod deck;
pub mod error;
pub mod guid;
pub mod model;
pub mod note;
pub mod timestamp;

pub use deck::Deck;
pub use error::{ErrorKind, PackageError, SerializationError};
pub use guid::guid_for;
pub use model::{Field, Model, ModelKind, Template, TemplateRequirement};
pub use note::Note;
pub use timestamp::Timestamp;
