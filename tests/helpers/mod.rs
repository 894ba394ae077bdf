use ankipack::application::{GenerateRequest, PackageGenerator};
use ankipack::infrastructure::TempScratchProvider;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fixed generation time used by tests that compare output.
#[allow(dead_code)]
pub const FIXED_TIMESTAMP: f64 = 1_700_000_000.25;

/// Test fixture sandboxing all scratch state inside one temporary directory
#[allow(dead_code)]
pub struct Sandbox {
    root: TempDir,
}

#[allow(dead_code)]
impl Sandbox {
    pub fn new() -> Result<Self> {
        let root = tempfile::tempdir().context("Failed to create sandbox directory")?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn generator(&self) -> PackageGenerator<TempScratchProvider> {
        PackageGenerator::new(TempScratchProvider::in_dir(self.root()))
    }

    /// Everything currently inside the sandbox root.
    pub fn entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(self.root())
            .expect("sandbox root readable")
            .map(|e| e.expect("readable entry").path())
            .collect();
        entries.sort();
        entries
    }

    /// Directory outside the sandbox root for copies of finished packages.
    pub fn output_dir(&self) -> Result<TempDir> {
        tempfile::tempdir().context("Failed to create output directory")
    }
}

/// Basic front/back model with id 1.
#[allow(dead_code)]
pub fn basic_model() -> Value {
    json!({
        "id": 1,
        "name": "Basic",
        "fields": [{"name": "Front"}, {"name": "Back"}],
        "templates": [{"name": "Card1", "qfmt": "{{Front}}", "afmt": "{{Back}}"}]
    })
}

#[allow(dead_code)]
pub fn request(models: Value, decks: Value, files: Value) -> GenerateRequest {
    serde_json::from_value(json!({"files": files, "decks": decks, "models": models}))
        .expect("valid request JSON")
}

/// One model, one deck `D` (id 100) with a single note `["Q", "A"]`.
#[allow(dead_code)]
pub fn single_note_request() -> GenerateRequest {
    request(
        json!([basic_model()]),
        json!([{"id": 100, "name": "D", "notes": [{"model": 1, "fields": ["Q", "A"]}]}]),
        json!({}),
    )
}

#[allow(dead_code)]
pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}
