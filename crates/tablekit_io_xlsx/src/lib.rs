//! `tablekit_io_xlsx` v1:
//! Metadata-driven XLSX export with dropdown validations.
//!
//! Pipeline: record type -> descriptors -> column index map -> constraints.
//! - `conf`       : constants and default presets
//! - `spec`       : metadata, descriptors, options, report models
//! - `error`      : export error taxonomy
//! - `extract`    : field descriptor extraction over the ancestor chain
//! - `order`      : order-key sort and column index assignment
//! - `validation` : dropdown constraint planning and sheet attachment
//! - `source`     : typed-record and DataFrame record sources
//! - `util`       : pure helper functions
//! - `writer`     : rust_xlsxwriter-backed exporter
pub mod conf;
pub mod error;
pub mod extract;
pub mod order;
pub mod source;
pub mod spec;
pub mod util;
pub mod validation;
pub mod writer;

pub use conf::{
    C_REPLACE_SEPARATOR, N_FIELDS_EXPORT_MAX, N_ROW_VALIDATION_MAX, N_ROW_VALIDATION_MIN,
    derive_default_export_formats, derive_default_export_options,
};
pub use error::{ExportError, ExportResult};
pub use extract::{derive_ancestor_chain, derive_field_descriptors};
pub use order::{plan_column_index_map, validate_options};
pub use source::{ExcelRecord, RecordSource, SpecRecordSlice, derive_dataframe_from_ipc_bytes};
pub use spec::{
    EnumCellValue, SpecCellFormat, SpecColumnIndexMap, SpecExcelMeta, SpecExportOptions,
    SpecExportReport, SpecFieldDescriptor, SpecFieldMeta, SpecRecordType, SpecReplacement,
    SpecValidationConstraint,
};
pub use util::{derive_column_letter, parse_replacement, sanitize_sheet_name};
pub use validation::{
    ListValidationTarget, apply_validation_constraints, derive_allowed_labels,
    plan_validation_constraints,
};
pub use writer::{SpecExportPlan, XlsxExporter};
