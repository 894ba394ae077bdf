// src/application/deck_assembler.rs
use crate::application::model_registry::ModelRegistry;
use crate::application::request::{DeckSpec, NoteSpec};
use crate::domain::{guid_for, Deck, Note, PackageError};
use tracing::{debug, instrument};

/// Builds the in-memory deck graph, resolving notes against the registry.
pub struct DeckAssembler<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> DeckAssembler<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Decks and notes keep their submission order.
    #[instrument(level = "debug", skip_all, fields(decks = specs.len()))]
    pub fn assemble(&self, specs: &[DeckSpec]) -> Result<Vec<Deck>, PackageError> {
        specs.iter().map(|spec| self.assemble_deck(spec)).collect()
    }

    fn assemble_deck(&self, spec: &DeckSpec) -> Result<Deck, PackageError> {
        let notes = spec
            .notes
            .iter()
            .map(|note| self.assemble_note(spec.id, note))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(deck_id = spec.id, notes = notes.len(), "Assembled deck");
        Ok(Deck {
            id: spec.id,
            name: spec.name.clone(),
            description: spec.description.clone(),
            notes,
        })
    }

    fn assemble_note(&self, deck_id: i64, spec: &NoteSpec) -> Result<Note, PackageError> {
        let model = self
            .registry
            .get(spec.model)
            .ok_or(PackageError::UnresolvedModelReference {
                deck_id,
                model_id: spec.model,
            })?;

        let expected = model.fields().len();
        if spec.fields.len() != expected {
            return Err(PackageError::FieldCountMismatch {
                model_id: model.id(),
                expected,
                actual: spec.fields.len(),
            });
        }

        if let Some(tag) = spec.tags.iter().find(|t| t.chars().any(char::is_whitespace)) {
            return Err(PackageError::InvalidTag { tag: tag.clone() });
        }

        let guid = spec
            .guid
            .clone()
            .unwrap_or_else(|| guid_for(spec.fields.as_slice()));
        let sort_field = spec
            .sort_field
            .clone()
            .unwrap_or_else(|| spec.fields[model.sort_field_index()].clone());

        Ok(Note {
            model_id: model.id(),
            fields: spec.fields.clone(),
            sort_field,
            tags: spec.tags.clone(),
            guid,
        })
    }
}
