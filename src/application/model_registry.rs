// src/application/model_registry.rs
use crate::application::request::ModelSpec;
use crate::domain::{Field, Model, PackageError, Template};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Request-scoped set of models keyed by id.
///
/// When two specifications share an id the later one replaces the earlier
/// one; every replacement is logged.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<i64, Model>,
}

impl ModelRegistry {
    #[instrument(level = "debug", skip_all, fields(count = specs.len()))]
    pub fn build(specs: &[ModelSpec]) -> Result<Self, PackageError> {
        let mut models = BTreeMap::new();

        for spec in specs {
            let model = build_model(spec)?;
            if let Some(previous) = models.insert(model.id(), model) {
                warn!(
                    model_id = previous.id(),
                    replaced = previous.name(),
                    "Duplicate model id, last definition wins"
                );
            }
        }

        debug!(models = models.len(), "Built model registry");
        Ok(Self { models })
    }

    pub fn get(&self, id: i64) -> Option<&Model> {
        self.models.get(&id)
    }

    /// Models in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn build_model(spec: &ModelSpec) -> Result<Model, PackageError> {
    let fields = spec
        .fields
        .iter()
        .map(|f| Field {
            name: f.name.clone(),
            font: f.font.clone(),
            rtl: f.rtl,
            size: f.size,
            sticky: f.sticky,
        })
        .collect();

    let templates = spec
        .templates
        .iter()
        .map(|t| Template {
            name: t.name.clone(),
            qfmt: t.qfmt.clone(),
            afmt: t.afmt.clone(),
            bqfmt: t.bqfmt.clone(),
            bafmt: t.bafmt.clone(),
            bfont: t.bfont.clone(),
            bsize: t.bsize,
        })
        .collect();

    Model::new(
        spec.id,
        spec.name.clone(),
        fields,
        templates,
        spec.css.clone(),
        spec.model_type,
        spec.latex_pre.clone(),
        spec.latex_post.clone(),
        spec.sort_field_index,
    )
}
