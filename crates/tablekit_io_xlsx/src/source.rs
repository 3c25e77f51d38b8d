//! Record sources feeding body cells of an export.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::error::{ExportError, ExportResult};
use crate::spec::{EnumCellValue, SpecRecordType};

/// Typed record that carries its own export metadata.
pub trait ExcelRecord {
    /// Static metadata of the record type and its ancestors.
    fn record_type() -> &'static SpecRecordType<'static>;

    /// Raw value of `field_name`; unknown fields yield [`EnumCellValue::None`].
    fn cell_value(&self, field_name: &str) -> EnumCellValue;
}

/// Row-addressable table of cell values keyed by field name.
pub trait RecordSource {
    /// Number of body rows.
    fn height(&self) -> usize;

    /// Whether `field_name` can be read from this source at all.
    fn has_field(&self, _field_name: &str) -> bool {
        true
    }

    /// Raw value at `row_idx` for `field_name`.
    fn cell_value(&self, row_idx: usize, field_name: &str) -> ExportResult<EnumCellValue>;
}

/// [`RecordSource`] over a slice of typed records.
#[derive(Debug, Clone, Copy)]
pub struct SpecRecordSlice<'r, T> {
    records: &'r [T],
}

impl<'r, T: ExcelRecord> SpecRecordSlice<'r, T> {
    /// Wrap `records`.
    pub fn new(records: &'r [T]) -> Self {
        Self { records }
    }
}

impl<T: ExcelRecord> RecordSource for SpecRecordSlice<'_, T> {
    fn height(&self) -> usize {
        self.records.len()
    }

    fn cell_value(&self, row_idx: usize, field_name: &str) -> ExportResult<EnumCellValue> {
        self.records
            .get(row_idx)
            .map(|record| record.cell_value(field_name))
            .ok_or_else(|| ExportError::Source(format!("row index out of range: {row_idx}")))
    }
}

impl RecordSource for DataFrame {
    fn height(&self) -> usize {
        DataFrame::height(self)
    }

    fn has_field(&self, field_name: &str) -> bool {
        derive_column_position(self, field_name).is_some()
    }

    fn cell_value(&self, row_idx: usize, field_name: &str) -> ExportResult<EnumCellValue> {
        let Some(n_idx_col) = derive_column_position(self, field_name) else {
            return Ok(EnumCellValue::None);
        };
        let value = self.get_columns()[n_idx_col]
            .get(row_idx)
            .map_err(|err| ExportError::Source(format!("Failed to access cell value: {err}")))?;
        Ok(derive_cell_value_from_any_value(value))
    }
}

/// Decode a Polars IPC payload into a DataFrame source.
pub fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> ExportResult<DataFrame> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| ExportError::Source(format!("Failed to read IPC DataFrame bytes: {err}")))
}

fn derive_column_position(df: &DataFrame, field_name: &str) -> Option<usize> {
    df.get_column_names_str()
        .iter()
        .position(|c_name| *c_name == field_name)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int128(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}
