// src/domain/timestamp.rs
use crate::domain::PackageError;

/// Generation time of a package, in seconds since the Unix epoch.
///
/// Every id and modification time written into a package derives from this
/// value, so two packages built from the same input and timestamp are
/// byte-identical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn from_secs_f64(secs: f64) -> Result<Self, PackageError> {
        // note and card ids count up from the millisecond value
        if !secs.is_finite() || secs < 0.0 || secs * 1000.0 >= i64::MAX as f64 {
            return Err(PackageError::InvalidTimestamp(secs));
        }
        Ok(Self(secs))
    }

    pub fn now() -> Self {
        let micros = chrono::Utc::now().timestamp_micros().max(0);
        Self(micros as f64 / 1_000_000.0)
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }

    /// Whole seconds, used for `mod` columns.
    pub fn as_secs(&self) -> i64 {
        self.0 as i64
    }

    /// Whole milliseconds, the first id handed out for notes and cards.
    pub fn as_millis(&self) -> i64 {
        (self.0 * 1000.0) as i64
    }
}
