// src/domain/note.rs
use crate::constants::FIELD_SEPARATOR;
use serde::Serialize;

/// A note bound to a resolved model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub model_id: i64,
    pub fields: Vec<String>,
    pub sort_field: String,
    pub tags: Vec<String>,
    pub guid: String,
}

impl Note {
    /// Tags as stored in `notes.tags`: space separated with surrounding spaces.
    pub fn formatted_tags(&self) -> String {
        format!(" {} ", self.tags.join(" "))
    }

    /// Field values as stored in `notes.flds`.
    pub fn formatted_fields(&self) -> String {
        self.fields.join(&FIELD_SEPARATOR.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_note_when_formatting_columns_then_uses_anki_separators() {
        let note = Note {
            model_id: 1,
            fields: vec!["Q".to_string(), "A".to_string()],
            sort_field: "Q".to_string(),
            tags: vec!["geo".to_string(), "capitals".to_string()],
            guid: "abc".to_string(),
        };

        assert_eq!(note.formatted_fields(), "Q\u{1f}A");
        assert_eq!(note.formatted_tags(), " geo capitals ");
    }
}
