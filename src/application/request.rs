// src/application/request.rs
use crate::constants::{
    DEFAULT_FIELD_FONT, DEFAULT_FIELD_SIZE, DEFAULT_LATEX_POST, DEFAULT_LATEX_PRE,
    DEFAULT_MODEL_CSS,
};
use crate::domain::ModelKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything needed to build one package.
///
/// `files` maps media filenames to standard base64 payloads. A `BTreeMap`
/// keeps media in filename order so the manifest is reproducible.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GenerateRequest {
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(default)]
    pub decks: Vec<DeckSpec>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default)]
    pub rtl: bool,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub sticky: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TemplateSpec {
    pub name: String,
    pub qfmt: String,
    pub afmt: String,
    #[serde(default)]
    pub bqfmt: String,
    #[serde(default)]
    pub bafmt: String,
    #[serde(default)]
    pub bfont: String,
    #[serde(default)]
    pub bsize: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelSpec {
    pub id: i64,
    pub name: String,
    pub fields: Vec<FieldSpec>,
    pub templates: Vec<TemplateSpec>,
    #[serde(default = "default_css")]
    pub css: String,
    #[serde(default)]
    pub model_type: ModelKind,
    #[serde(default = "default_latex_pre")]
    pub latex_pre: String,
    #[serde(default = "default_latex_post")]
    pub latex_post: String,
    #[serde(default)]
    pub sort_field_index: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NoteSpec {
    pub model: i64,
    pub fields: Vec<String>,
    #[serde(default)]
    pub sort_field: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub guid: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DeckSpec {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: Vec<NoteSpec>,
}

fn default_font() -> String {
    DEFAULT_FIELD_FONT.to_string()
}

fn default_size() -> u32 {
    DEFAULT_FIELD_SIZE
}

fn default_css() -> String {
    DEFAULT_MODEL_CSS.to_string()
}

fn default_latex_pre() -> String {
    DEFAULT_LATEX_PRE.to_string()
}

fn default_latex_post() -> String {
    DEFAULT_LATEX_POST.to_string()
}
