//! Export constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{SpecCellFormat, SpecExportOptions};

/// Maximum number of exportable fields per record type hierarchy.
///
/// Matches the alphabetic `A..Z` column addressing used by legacy templates.
pub const N_FIELDS_EXPORT_MAX: usize = 26;
/// First body row covered by a dropdown validation (row 0 holds the header).
pub const N_ROW_VALIDATION_MIN: u32 = 1;
/// Last body row covered by a dropdown validation.
pub const N_ROW_VALIDATION_MAX: u32 = (2 << 15) - 1;
/// Separator between label and value in a replacement entry (`"男_1"`).
pub const C_REPLACE_SEPARATOR: char = '_';
/// Column width used when a field declares none.
pub const N_WIDTH_CELL_DEFAULT: f64 = 15.0;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    /// Header cell format.
    Header,
    /// Text body cell format.
    Text,
    /// Numeric body cell format.
    Number,
}

impl EnumFmtKey {
    /// Key used in [`derive_default_export_formats`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Text => "text",
            Self::Number => "number",
        }
    }
}

/// Build default named format presets used by [`crate::writer::XlsxExporter`].
pub fn derive_default_export_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("宋体".to_string()),
        font_size: Some(11),
        border: Some(1),
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        EnumFmtKey::Header.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            bg_color: Some("#D9D9D9".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Text.as_str().to_string(),
        cfg_base_fmt_spec.clone(),
    );
    dict_fmt.insert(
        EnumFmtKey::Number.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("General".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Build default export options.
pub fn derive_default_export_options() -> SpecExportOptions {
    SpecExportOptions::default()
}
