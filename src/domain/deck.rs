// src/domain/deck.rs
use crate::domain::Note;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub notes: Vec<Note>,
}
