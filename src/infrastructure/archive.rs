// src/infrastructure/archive.rs
use crate::constants::{COLLECTION_ENTRY_NAME, MEDIA_ENTRY_NAME};
use crate::domain::{PackageError, SerializationError, Timestamp};
use crate::infrastructure::media_stager::StagedMedia;
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    fn method(self) -> CompressionMethod {
        match self {
            Self::Deflated => CompressionMethod::Deflated,
            Self::Stored => CompressionMethod::Stored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveOptions {
    pub compression: Compression,
}

/// Convert the generation time to a zip (DOS) timestamp.
///
/// DOS dates start in 1980; earlier times clamp to the format's minimum.
pub fn zip_datetime(timestamp: Timestamp) -> zip::DateTime {
    chrono::DateTime::from_timestamp(timestamp.as_secs(), 0)
        .and_then(|dt| {
            let year = u16::try_from(dt.year()).ok()?;
            zip::DateTime::from_date_and_time(
                year,
                dt.month() as u8,
                dt.day() as u8,
                dt.hour() as u8,
                dt.minute() as u8,
                dt.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

/// Write the package archive to `dest`, which must not exist yet.
///
/// Members: the collection database, the media manifest, then each staged
/// media file under its decimal index. All members carry the same timestamp.
#[instrument(level = "debug", skip(media, options), fields(media = media.len()))]
pub fn write_archive(
    dest: &Path,
    collection: &Path,
    media: &[StagedMedia],
    timestamp: Timestamp,
    options: &ArchiveOptions,
) -> Result<(), PackageError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(SerializationError::from)?;

    let mut zip = ZipWriter::new(file);
    let entry_options = SimpleFileOptions::default()
        .compression_method(options.compression.method())
        .last_modified_time(zip_datetime(timestamp))
        .unix_permissions(0o644);

    zip.start_file(COLLECTION_ENTRY_NAME, entry_options)?;
    copy_into(collection, &mut zip)?;

    let manifest: BTreeMap<String, &str> = media
        .iter()
        .map(|m| (m.index.to_string(), m.filename.as_str()))
        .collect();
    zip.start_file(MEDIA_ENTRY_NAME, entry_options)?;
    zip.write_all(serde_json::to_string(&manifest)?.as_bytes())
        .map_err(SerializationError::from)?;

    for staged in media {
        zip.start_file(staged.index.to_string(), entry_options)?;
        copy_into(&staged.path, &mut zip)?;
    }

    let file = zip.finish()?;
    file.sync_all().map_err(SerializationError::from)?;
    debug!(?dest, "Wrote package archive");
    Ok(())
}

fn copy_into<W: Write>(source: &Path, writer: &mut W) -> Result<(), PackageError> {
    let mut file = File::open(source).map_err(SerializationError::from)?;
    io::copy(&mut file, writer).map_err(SerializationError::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn staged(dir: &Path, index: usize, name: &str, content: &[u8]) -> StagedMedia {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        StagedMedia {
            index,
            filename: name.to_string(),
            path,
        }
    }

    #[test]
    fn given_media_when_writing_archive_then_members_use_index_names() {
        let temp_dir = TempDir::new().unwrap();
        let collection = temp_dir.path().join("collection.anki2");
        std::fs::write(&collection, b"sqlite bytes").unwrap();
        let media = vec![
            staged(temp_dir.path(), 0, "a.png", b"AAA"),
            staged(temp_dir.path(), 1, "b.mp3", b"BBB"),
        ];
        let dest = temp_dir.path().join("out.apkg");
        let timestamp = Timestamp::from_secs_f64(1_700_000_000.0).unwrap();

        write_archive(&dest, &collection, &media, timestamp, &ArchiveOptions::default()).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert_eq!(names, vec!["collection.anki2", "media", "0", "1"]);

        let mut manifest = String::new();
        archive
            .by_name("media")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert_eq!(manifest, r#"{"0":"a.png","1":"b.mp3"}"#);

        let mut content = Vec::new();
        archive.by_name("1").unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"BBB");
    }

    #[test]
    fn given_existing_destination_when_writing_then_fails_without_overwriting() {
        let temp_dir = TempDir::new().unwrap();
        let collection = temp_dir.path().join("collection.anki2");
        std::fs::write(&collection, b"db").unwrap();
        let dest = temp_dir.path().join("taken.apkg");
        std::fs::write(&dest, b"keep me").unwrap();
        let timestamp = Timestamp::from_secs_f64(0.0).unwrap();

        let result = write_archive(&dest, &collection, &[], timestamp, &ArchiveOptions::default());

        assert!(matches!(result, Err(PackageError::Serialization(_))));
        assert_eq!(std::fs::read(&dest).unwrap(), b"keep me");
    }

    #[test]
    fn given_timestamp_when_converting_then_builds_dos_datetime() {
        // 2023-11-14 22:13:20 UTC
        let dt = zip_datetime(Timestamp::from_secs_f64(1_700_000_000.0).unwrap());

        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.month(), 11);
        assert_eq!(dt.day(), 14);
        assert_eq!(dt.hour(), 22);
        assert_eq!(dt.minute(), 13);
        assert_eq!(dt.second(), 20);
    }

    #[test]
    fn given_pre_1980_timestamp_when_converting_then_clamps_to_dos_minimum() {
        let dt = zip_datetime(Timestamp::from_secs_f64(0.0).unwrap());

        assert_eq!(dt.year(), 1980);
    }
}
