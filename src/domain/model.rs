// src/domain/model.rs
use crate::domain::PackageError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// {{Field}}, {{text:Field}}, {{#Field}} ...
static FIELD_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid field reference regex"));

static CLOZE_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{[^}]*?cloze:(?:[^}]?:)*(.+?)\}\}").expect("valid cloze reference regex")
});

static CLOZE_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{c(\d+)::.+?\}\}").expect("valid cloze number regex")
});

/// Layout of a note model. Serialized as Anki's numeric `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ModelKind {
    #[default]
    FrontBack,
    Cloze,
}

impl TryFrom<i64> for ModelKind {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::FrontBack),
            1 => Ok(Self::Cloze),
            other => Err(format!("unknown model type {other}, expected 0 or 1")),
        }
    }
}

impl From<ModelKind> for i64 {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::FrontBack => 0,
            ModelKind::Cloze => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub font: String,
    pub rtl: bool,
    pub size: u32,
    pub sticky: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub qfmt: String,
    pub afmt: String,
    pub bqfmt: String,
    pub bafmt: String,
    pub bfont: String,
    pub bsize: u32,
}

/// Requirement rule Anki stores per template in a model's `req` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRequirement {
    pub ord: usize,
    pub field_ords: Vec<usize>,
}

/// A note model. Immutable once constructed through [`Model::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    id: i64,
    name: String,
    fields: Vec<Field>,
    templates: Vec<Template>,
    css: String,
    kind: ModelKind,
    latex_pre: String,
    latex_post: String,
    sort_field_index: usize,
}

impl Model {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        name: impl Into<String>,
        fields: Vec<Field>,
        templates: Vec<Template>,
        css: impl Into<String>,
        kind: ModelKind,
        latex_pre: impl Into<String>,
        latex_post: impl Into<String>,
        sort_field_index: usize,
    ) -> Result<Self, PackageError> {
        let invalid = |reason: String| PackageError::Validation {
            model_id: id,
            reason,
        };

        if fields.is_empty() {
            return Err(invalid("model has no fields".to_string()));
        }
        if templates.is_empty() {
            return Err(invalid("model has no templates".to_string()));
        }
        if sort_field_index >= fields.len() {
            return Err(invalid(format!(
                "sort field index {} out of range for {} fields",
                sort_field_index,
                fields.len()
            )));
        }

        Ok(Self {
            id,
            name: name.into(),
            fields,
            templates,
            css: css.into(),
            kind,
            latex_pre: latex_pre.into(),
            latex_post: latex_post.into(),
            sort_field_index,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn latex_pre(&self) -> &str {
        &self.latex_pre
    }

    pub fn latex_post(&self) -> &str {
        &self.latex_post
    }

    pub fn sort_field_index(&self) -> usize {
        self.sort_field_index
    }

    fn field_ord(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Fields each template's question side refers to.
    ///
    /// Only scans `{{...}}` references; template markup is never rendered.
    pub fn requirements(&self) -> Vec<TemplateRequirement> {
        self.templates
            .iter()
            .enumerate()
            .map(|(ord, template)| {
                let mut field_ords: Vec<usize> = FIELD_REF_REGEX
                    .captures_iter(&template.qfmt)
                    .filter_map(|cap| {
                        let inner = cap.get(1)?.as_str().trim();
                        if inner.starts_with(['#', '/', '^', '!']) {
                            return None;
                        }
                        let name = inner.rsplit(':').next()?.trim();
                        self.field_ord(name)
                    })
                    .collect();
                field_ords.sort_unstable();
                field_ords.dedup();
                TemplateRequirement { ord, field_ords }
            })
            .collect()
    }

    /// Card ordinals a note with `values` produces.
    ///
    /// Front/back models produce one card per template. Cloze models produce
    /// one card per distinct cloze number in the fields the templates mark
    /// with `{{cloze:Field}}`, or a single card when none are present.
    pub fn card_ords(&self, values: &[String]) -> Vec<usize> {
        match self.kind {
            ModelKind::FrontBack => (0..self.templates.len()).collect(),
            ModelKind::Cloze => {
                let mut ords: Vec<usize> = self
                    .templates
                    .iter()
                    .flat_map(|t| CLOZE_REF_REGEX.captures_iter(&t.qfmt))
                    .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
                    .filter_map(|name| self.field_ord(&name))
                    .filter_map(|ord| values.get(ord))
                    .flat_map(|value| {
                        CLOZE_NUMBER_REGEX
                            .captures_iter(value)
                            .filter_map(|cap| cap[1].parse::<usize>().ok())
                            .filter(|n| *n > 0)
                            .map(|n| n - 1)
                            .collect::<Vec<_>>()
                    })
                    .collect();
                ords.sort_unstable();
                ords.dedup();
                if ords.is_empty() {
                    ords.push(0);
                }
                ords
            }
        }
    }
}
