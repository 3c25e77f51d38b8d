//! Export error taxonomy.
//!
//! Every variant is fatal for the export call: metadata authoring mistakes are
//! not transient, so nothing here is retried.

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

/// Errors raised while planning or writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Non-numeric order key or replacement entry without separator.
    #[error("{type_name}.{field_name}: malformed export metadata: {message}")]
    MalformedMetadata {
        /// Declaring type.
        type_name: String,
        /// Offending field.
        field_name: String,
        /// What is wrong with the metadata.
        message: String,
    },

    /// More exportable fields than the configured cap.
    #[error(
        "{type_name}: {n_fields} exportable fields exceed the supported maximum of {n_fields_max}"
    )]
    FieldCountExceeded {
        /// Exported type.
        type_name: String,
        /// Fields found across the hierarchy.
        n_fields: usize,
        /// Configured cap.
        n_fields_max: usize,
    },

    /// Two fields of the hierarchy share an order key.
    #[error("{type_name}: duplicate excel order key {order_key} on fields {field_names:?}")]
    DuplicateOrderKey {
        /// Exported type.
        type_name: String,
        /// Shared order key.
        order_key: i64,
        /// Fields sharing it, in sorted order.
        field_names: Vec<String>,
    },

    /// A constrained field has no assigned column.
    #[error("field {field_name:?} has no assigned column")]
    UnresolvedColumnReference {
        /// Field missing from the column map.
        field_name: String,
    },

    /// Invalid export options.
    #[error("invalid export options: {0}")]
    InvalidOptions(String),

    /// Record source access failure.
    #[error("record source error: {0}")]
    Source(String),

    /// Spreadsheet engine failure.
    #[error("xlsx write error: {0}")]
    Xlsx(String),

    /// Output path failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<XlsxError> for ExportError {
    fn from(err: XlsxError) -> Self {
        Self::Xlsx(err.to_string())
    }
}

/// Result alias used across the crate.
pub type ExportResult<T> = Result<T, ExportError>;
