// src/infrastructure/media_stager.rs
use crate::domain::PackageError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

/// One media file written to the scratch directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedMedia {
    /// Archive member name is the decimal index.
    pub index: usize,
    pub filename: String,
    pub path: PathBuf,
}

/// Only a single ordinary path component may be used as a media filename.
fn is_plain_filename(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == filename
    )
}

/// Decode every payload and write it into `media_dir`.
///
/// Returns the manifest in filename order, index `0..n`.
#[instrument(level = "debug", skip(files), fields(count = files.len()))]
pub fn stage_media(
    media_dir: &Path,
    files: &BTreeMap<String, String>,
) -> Result<Vec<StagedMedia>, PackageError> {
    fs::create_dir_all(media_dir).map_err(PackageError::Scratch)?;

    files
        .iter()
        .enumerate()
        .map(|(index, (filename, payload))| {
            if !is_plain_filename(filename) {
                return Err(PackageError::InvalidMediaFilename(filename.clone()));
            }

            // MIME-wrapped payloads carry line breaks
            let compact: Vec<u8> = payload
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            let bytes = BASE64
                .decode(&compact)
                .map_err(|source| PackageError::MediaDecode {
                    filename: filename.clone(),
                    source,
                })?;

            let path = media_dir.join(filename);
            fs::write(&path, &bytes).map_err(|source| PackageError::MediaWrite {
                filename: filename.clone(),
                source,
            })?;

            debug!(index, filename, size = bytes.len(), "Staged media file");
            Ok(StagedMedia {
                index,
                filename: filename.clone(),
                path,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn given_media_map_when_staging_then_writes_decoded_bytes_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        let media_dir = temp_dir.path().join("media");

        let text = BASE64.encode(b"second");
        let image = BASE64.encode([0u8, 1, 2, 255]);

        let staged = stage_media(
            &media_dir,
            &files(&[("b.txt", text.as_str()), ("a.png", image.as_str())]),
        )
        .unwrap();

        assert_eq!(staged.len(), 2);
        assert_eq!(staged[0].filename, "a.png");
        assert_eq!(staged[0].index, 0);
        assert_eq!(staged[1].filename, "b.txt");
        assert_eq!(fs::read(&staged[0].path).unwrap(), vec![0u8, 1, 2, 255]);
        assert_eq!(fs::read(&staged[1].path).unwrap(), b"second");
    }

    #[test]
    fn given_line_wrapped_payload_when_staging_then_decodes_whole_content() {
        let temp_dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..=255u8).collect();
        let encoded = BASE64.encode(&content);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        let wrapped = format!(" {wrapped}\n");

        let staged =
            stage_media(temp_dir.path(), &files(&[("bytes.bin", wrapped.as_str())])).unwrap();

        assert_eq!(fs::read(&staged[0].path).unwrap(), content);
    }

    #[test]
    fn given_invalid_base64_when_staging_then_fails_with_decode_error() {
        let temp_dir = TempDir::new().unwrap();

        let result = stage_media(temp_dir.path(), &files(&[("bad.png", "not base64 !!")]));

        match result {
            Err(PackageError::MediaDecode { filename, .. }) => assert_eq!(filename, "bad.png"),
            other => panic!("Expected MediaDecode error, got {:?}", other),
        }
    }

    #[test]
    fn given_path_like_filename_when_staging_then_rejects_it() {
        let temp_dir = TempDir::new().unwrap();

        for name in ["../escape.png", "sub/dir.png", "", ".", "/abs.png"] {
            let result = stage_media(temp_dir.path(), &files(&[(name, "AAAA")]));

            assert!(
                matches!(result, Err(PackageError::InvalidMediaFilename(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn given_empty_map_when_staging_then_returns_empty_manifest() {
        let temp_dir = TempDir::new().unwrap();

        let staged = stage_media(&temp_dir.path().join("media"), &BTreeMap::new()).unwrap();

        assert!(staged.is_empty());
    }
}
