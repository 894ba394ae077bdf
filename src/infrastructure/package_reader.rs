// src/infrastructure/package_reader.rs
use crate::constants::{COLLECTION_ENTRY_NAME, FIELD_SEPARATOR, MEDIA_ENTRY_NAME};
use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, instrument};
use zip::ZipArchive;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelSummary {
    pub id: i64,
    pub name: String,
    pub kind: i64,
    pub fields: Vec<String>,
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeckSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NoteSummary {
    pub id: i64,
    pub guid: String,
    pub model_id: i64,
    pub fields: Vec<String>,
    pub tags: Vec<String>,
    pub sort_field: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardSummary {
    pub id: i64,
    pub note_id: i64,
    pub deck_id: i64,
    pub ord: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MediaSummary {
    pub index: usize,
    pub filename: String,
    pub size: u64,
    pub sha256: String,
}

/// Contents of a package, as read back from the archive.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PackageSummary {
    /// Archive member names in archive order.
    pub entries: Vec<String>,
    pub models: Vec<ModelSummary>,
    pub decks: Vec<DeckSummary>,
    pub notes: Vec<NoteSummary>,
    pub cards: Vec<CardSummary>,
    pub media: Vec<MediaSummary>,
}

/// Open a package and summarize its collection and media.
#[instrument(level = "debug")]
pub fn inspect_package(path: &Path) -> Result<PackageSummary> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open package {}", path.display()))?;
    let mut archive = ZipArchive::new(file).context("Package is not a valid zip archive")?;
    let entries: Vec<String> = archive.file_names().map(str::to_string).collect();

    // SQLite needs a real file
    let temp_dir = tempfile::tempdir().context("Failed to create temporary directory")?;
    let db_path = temp_dir.path().join(COLLECTION_ENTRY_NAME);
    {
        let mut member = archive
            .by_name(COLLECTION_ENTRY_NAME)
            .context("Package has no collection database")?;
        let mut out = File::create(&db_path).context("Failed to extract collection")?;
        io::copy(&mut member, &mut out).context("Failed to extract collection")?;
    }

    let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .context("Failed to open collection database")?;
    let (models, decks) = read_col(&conn)?;
    let notes = read_notes(&conn)?;
    let cards = read_cards(&conn)?;
    conn.close()
        .map_err(|(_, e)| e)
        .context("Failed to close collection database")?;

    let media = read_media(&mut archive)?;

    debug!(notes = notes.len(), cards = cards.len(), media = media.len(), "Inspected package");
    Ok(PackageSummary {
        entries,
        models,
        decks,
        notes,
        cards,
        media,
    })
}

fn read_col(conn: &Connection) -> Result<(Vec<ModelSummary>, Vec<DeckSummary>)> {
    let (models_json, decks_json): (String, String) = conn
        .query_row("SELECT models, decks FROM col", [], |r| Ok((r.get(0)?, r.get(1)?)))
        .context("Failed to read col row")?;

    let models: BTreeMap<String, Value> =
        serde_json::from_str(&models_json).context("Invalid models JSON")?;
    let decks: BTreeMap<String, Value> =
        serde_json::from_str(&decks_json).context("Invalid decks JSON")?;

    let names = |value: &Value| -> Vec<String> {
        value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };

    let mut models: Vec<ModelSummary> = models
        .values()
        .map(|m| ModelSummary {
            id: m["id"].as_i64().unwrap_or_default(),
            name: m["name"].as_str().unwrap_or_default().to_string(),
            kind: m["type"].as_i64().unwrap_or_default(),
            fields: names(&m["flds"]),
            templates: names(&m["tmpls"]),
        })
        .collect();
    models.sort_by_key(|m| m.id);

    let mut decks: Vec<DeckSummary> = decks
        .values()
        .map(|d| DeckSummary {
            id: d["id"].as_i64().unwrap_or_default(),
            name: d["name"].as_str().unwrap_or_default().to_string(),
            description: d["desc"].as_str().unwrap_or_default().to_string(),
        })
        .collect();
    decks.sort_by_key(|d| d.id);

    Ok((models, decks))
}

fn read_notes(conn: &Connection) -> Result<Vec<NoteSummary>> {
    let mut stmt = conn.prepare("SELECT id, guid, mid, tags, flds, sfld FROM notes ORDER BY id")?;
    let notes = stmt
        .query_map([], |r| {
            let tags: String = r.get(3)?;
            let flds: String = r.get(4)?;
            Ok(NoteSummary {
                id: r.get(0)?,
                guid: r.get(1)?,
                model_id: r.get(2)?,
                tags: tags.split_whitespace().map(str::to_string).collect(),
                fields: flds.split(FIELD_SEPARATOR).map(str::to_string).collect(),
                sort_field: r.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read notes")?;
    Ok(notes)
}

fn read_cards(conn: &Connection) -> Result<Vec<CardSummary>> {
    let mut stmt = conn.prepare("SELECT id, nid, did, ord FROM cards ORDER BY id")?;
    let cards = stmt
        .query_map([], |r| {
            Ok(CardSummary {
                id: r.get(0)?,
                note_id: r.get(1)?,
                deck_id: r.get(2)?,
                ord: r.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read cards")?;
    Ok(cards)
}

fn read_media(archive: &mut ZipArchive<File>) -> Result<Vec<MediaSummary>> {
    let mut manifest_json = String::new();
    archive
        .by_name(MEDIA_ENTRY_NAME)
        .context("Package has no media manifest")?
        .read_to_string(&mut manifest_json)
        .context("Failed to read media manifest")?;
    let manifest: BTreeMap<String, String> =
        serde_json::from_str(&manifest_json).context("Invalid media manifest")?;

    let mut media = manifest
        .into_iter()
        .map(|(index, filename)| {
            let mut bytes = Vec::new();
            archive
                .by_name(&index)
                .with_context(|| format!("Media member {index} ({filename}) missing"))?
                .read_to_end(&mut bytes)?;
            Ok(MediaSummary {
                index: index
                    .parse()
                    .with_context(|| format!("Invalid media index {index:?}"))?,
                filename,
                size: bytes.len() as u64,
                sha256: format!("{:x}", Sha256::digest(&bytes)),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    media.sort_by_key(|m| m.index);
    Ok(media)
}
