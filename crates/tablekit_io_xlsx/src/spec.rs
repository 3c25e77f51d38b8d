//! Shared export specification models.

use std::collections::BTreeMap;

use crate::conf::{
    C_REPLACE_SEPARATOR, N_FIELDS_EXPORT_MAX, N_ROW_VALIDATION_MAX, N_ROW_VALIDATION_MIN,
    N_WIDTH_CELL_DEFAULT, derive_default_export_formats,
};

////////////////////////////////////////////////////////////////////////////////
// #region RecordMetadata

/// Export metadata attached to one declared field.
///
/// Declarative counterpart of an `@Excel(...)`-style field annotation. Tables of
/// these are built at compile time, so every constructor is `const`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecExcelMeta<'a> {
    /// Header text of the column.
    pub label: &'a str,
    /// String-encoded order key (`"1"`, `"2"`, ...).
    pub order_num: &'a str,
    /// Enumerated replacements in `"label_value"` form.
    pub replace: &'a [&'a str],
    /// Column width in character units.
    pub width: Option<f64>,
    /// Hidden fields are never exported.
    pub if_hidden: bool,
}

impl<'a> SpecExcelMeta<'a> {
    /// Visible field with no replacements and default width.
    pub const fn new(label: &'a str, order_num: &'a str) -> Self {
        Self {
            label,
            order_num,
            replace: &[],
            width: None,
            if_hidden: false,
        }
    }

    /// Attach `"label_value"` replacement entries.
    pub const fn with_replace(self, replace: &'a [&'a str]) -> Self {
        Self { replace, ..self }
    }

    /// Set an explicit column width.
    pub const fn with_width(self, width: f64) -> Self {
        Self {
            width: Some(width),
            ..self
        }
    }

    /// Mark the field hidden.
    pub const fn hidden(self) -> Self {
        Self {
            if_hidden: true,
            ..self
        }
    }
}

/// One declared field of one type level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecFieldMeta<'a> {
    /// Field identifier.
    pub name: &'a str,
    /// `None` when the field carries no export metadata.
    pub meta_export: Option<SpecExcelMeta<'a>>,
}

impl<'a> SpecFieldMeta<'a> {
    /// Field exported with `meta`.
    pub const fn exported(name: &'a str, meta: SpecExcelMeta<'a>) -> Self {
        Self {
            name,
            meta_export: Some(meta),
        }
    }

    /// Field without export metadata.
    pub const fn plain(name: &'a str) -> Self {
        Self {
            name,
            meta_export: None,
        }
    }
}

/// Static description of a record type and its ancestor chain.
///
/// `parent == None` means the next ancestor is the universal root type, which
/// declares no fields and is never scanned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecRecordType<'a> {
    /// Type name used in error messages and logs.
    pub name: &'a str,
    /// Fields declared directly on this type, in declaration order.
    pub fields: &'a [SpecFieldMeta<'a>],
    /// Direct ancestor type.
    pub parent: Option<&'a SpecRecordType<'a>>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Descriptors

/// Exportable field collected from a record type hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFieldDescriptor {
    /// Field identifier.
    pub name: String,
    /// Type that declares the field.
    pub type_name: String,
    /// Header text.
    pub label: String,
    /// Parsed order key.
    pub order_key: i64,
    /// Always `false` for collected descriptors; kept for diagnostics.
    pub if_hidden: bool,
    /// Ordered `"label_value"` entries; empty when unconstrained.
    pub replacements: Vec<String>,
    /// Declared column width.
    pub width: Option<f64>,
}

/// Parsed `(label, value)` replacement pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReplacement {
    /// Text shown in the sheet and offered in the dropdown.
    pub label: String,
    /// Raw stored value.
    pub value: String,
}

/// Resolved field-name to column assignment for one export call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecColumnIndexMap {
    pub(crate) dict_col_idx: BTreeMap<String, usize>,
    pub(crate) l_descriptors_ordered: Vec<SpecFieldDescriptor>,
}

impl SpecColumnIndexMap {
    /// Zero-based column index of `field_name`.
    pub fn get(&self, field_name: &str) -> Option<usize> {
        self.dict_col_idx.get(field_name).copied()
    }

    /// Number of assigned columns.
    pub fn len(&self) -> usize {
        self.dict_col_idx.len()
    }

    /// True when no field was assigned.
    pub fn is_empty(&self) -> bool {
        self.dict_col_idx.is_empty()
    }

    /// Descriptors in column order.
    pub fn descriptors(&self) -> &[SpecFieldDescriptor] {
        &self.l_descriptors_ordered
    }

    /// `(column index, descriptor)` pairs in column order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (usize, &SpecFieldDescriptor)> {
        self.l_descriptors_ordered.iter().enumerate()
    }

    /// Plain `name -> index` snapshot.
    pub fn to_dict(&self) -> BTreeMap<String, usize> {
        self.dict_col_idx.clone()
    }
}

/// Single-column explicit-list dropdown constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecValidationConstraint {
    /// Field the constraint was derived from.
    pub field_name: String,
    /// First column (inclusive).
    pub col_idx_first: usize,
    /// Last column (inclusive); equals `col_idx_first`.
    pub col_idx_last: usize,
    /// First row (inclusive).
    pub row_min: u32,
    /// Last row (inclusive).
    pub row_max: u32,
    /// Labels offered by the dropdown, in declaration order.
    pub allowed_labels: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Normalized cell value during the write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

impl EnumCellValue {
    /// Text key used to match against replacement values.
    ///
    /// Whole numbers render without a fractional part so `1.0` matches `"1"`.
    pub fn to_replace_key(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::String(s) => Some(s.clone()),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(n.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for EnumCellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<EnumCellValue>> From<Option<T>> for EnumCellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// Export-wide options controlling layout, validation bounds and formats.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportOptions {
    /// Upper bound on exportable fields per type hierarchy.
    pub n_fields_max: usize,
    /// First row covered by dropdown constraints.
    pub row_validation_min: u32,
    /// Last row covered by dropdown constraints.
    pub row_validation_max: u32,
    /// Separator between label and value in replacement entries.
    pub separator_replace: char,
    /// Write replacement labels instead of raw values in body cells.
    pub if_replace_values: bool,
    /// Width applied when a field declares none.
    pub width_cell_default: f64,
    /// Frozen row count; `None` disables freezing.
    pub row_freeze: Option<u32>,
    /// Header cell format.
    pub fmt_header: SpecCellFormat,
    /// Text body cell format.
    pub fmt_text: SpecCellFormat,
    /// Numeric body cell format.
    pub fmt_number: SpecCellFormat,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        let dict_fmt = derive_default_export_formats();
        let fmt_of = |key: &str| dict_fmt.get(key).cloned().unwrap_or_default();
        Self {
            n_fields_max: N_FIELDS_EXPORT_MAX,
            row_validation_min: N_ROW_VALIDATION_MIN,
            row_validation_max: N_ROW_VALIDATION_MAX,
            separator_replace: C_REPLACE_SEPARATOR,
            if_replace_values: true,
            width_cell_default: N_WIDTH_CELL_DEFAULT,
            row_freeze: Some(1),
            fmt_header: fmt_of("header"),
            fmt_text: fmt_of("text"),
            fmt_number: fmt_of("number"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-export report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecExportReport {
    /// Sheet name actually written.
    pub sheet_name: String,
    /// Body rows written (header excluded).
    pub n_rows_written: usize,
    /// Columns written.
    pub n_cols_written: usize,
    /// Field-to-column assignment used by the export.
    pub columns: BTreeMap<String, usize>,
    /// Dropdown constraints attached to the sheet.
    pub constraints: Vec<SpecValidationConstraint>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecExportReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
