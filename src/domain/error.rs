// src/domain/error.rs
use thiserror::Error;

/// Coarse classification of a [`PackageError`], used by callers to map
/// failures onto their own response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UnresolvedModelReference,
    FieldCountMismatch,
    Staging,
    Serialization,
}

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Invalid model {model_id}: {reason}")]
    Validation { model_id: i64, reason: String },

    #[error("Deck {deck_id} references unknown model {model_id}")]
    UnresolvedModelReference { deck_id: i64, model_id: i64 },

    #[error("Note for model {model_id} has {actual} fields, model defines {expected}")]
    FieldCountMismatch {
        model_id: i64,
        expected: usize,
        actual: usize,
    },

    #[error("Tag must not contain whitespace: {tag:?}")]
    InvalidTag { tag: String },

    #[error("Generation timestamp must be finite and non-negative: {0}")]
    InvalidTimestamp(f64),

    #[error("Media filename must be a plain file name: {0:?}")]
    InvalidMediaFilename(String),

    #[error("Failed to decode media file {filename}")]
    MediaDecode {
        filename: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Failed to stage media file {filename}")]
    MediaWrite {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to acquire scratch resources")]
    Scratch(#[source] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Collection database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error while writing package: {0}")]
    Io(#[from] std::io::Error),
    #[error("Note and card ids exhausted after {last}")]
    IdOverflow { last: i64 },
}

impl PackageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::InvalidTag { .. } | Self::InvalidTimestamp(_) => {
                ErrorKind::Validation
            }
            Self::UnresolvedModelReference { .. } => ErrorKind::UnresolvedModelReference,
            Self::FieldCountMismatch { .. } => ErrorKind::FieldCountMismatch,
            Self::InvalidMediaFilename(_) | Self::MediaDecode { .. } | Self::MediaWrite { .. } => {
                ErrorKind::Staging
            }
            Self::Scratch(_) | Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// True when the request itself is at fault and resubmitting it unchanged
    /// cannot succeed.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::MediaWrite { .. } | Self::Scratch(_) | Self::Serialization(_) => false,
            _ => true,
        }
    }
}

impl From<rusqlite::Error> for PackageError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Serialization(e.into())
    }
}

impl From<zip::result::ZipError> for PackageError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Serialization(e.into())
    }
}

impl From<serde_json::Error> for PackageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.into())
    }
}
