use thiserror::Error;

use crate::value::ValueKind;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Unsupported envelope kind: \"{0}\"")]
    UnsupportedKind(String),

    #[error("Invalid {kind} payload \"{payload}\": {reason}")]
    InvalidPayload {
        kind: ValueKind,
        payload: String,
        reason: String,
    },

    #[error("Document payload is not valid JSON: {0}")]
    UnparsablePayload(String),

    #[error("Column \"{column}\": {source}")]
    Column {
        column: String,
        #[source]
        source: Box<EnvelopeError>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl EnvelopeError {
    /// Attach the column name to an error raised while decoding a row.
    pub fn in_column(self, column: impl Into<String>) -> Self {
        EnvelopeError::Column {
            column: column.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
