//! Stateless helper utilities shared by the export pipeline.

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::error::{ExportError, ExportResult};
use crate::spec::SpecReplacement;

////////////////////////////////////////////////////////////////////////////////
// #region ReplacementParsing

/// Split one `"label_value"` entry on the first `separator`.
///
/// `type_name`/`field_name` only feed the error message.
pub fn parse_replacement(
    entry: &str,
    separator: char,
    type_name: &str,
    field_name: &str,
) -> ExportResult<SpecReplacement> {
    let Some((label, value)) = entry.split_once(separator) else {
        return Err(ExportError::MalformedMetadata {
            type_name: type_name.to_string(),
            field_name: field_name.to_string(),
            message: format!("replacement entry {entry:?} has no {separator:?} separator"),
        });
    };

    Ok(SpecReplacement {
        label: label.to_string(),
        value: value.to_string(),
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet1".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Alphabetic column name for a zero-based index (`0 -> A`, `26 -> AA`).
pub fn derive_column_letter(col_idx: usize) -> String {
    let mut l_chars = Vec::new();
    let mut n_rest = col_idx + 1;
    while n_rest > 0 {
        let n_digit = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_digit as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Casting

/// Convert a zero-based row index to the spreadsheet engine row type.
pub fn cast_row_num(value: usize) -> ExportResult<u32> {
    u32::try_from(value).map_err(|_| ExportError::Xlsx(format!("row index overflow: {value}")))
}

/// Convert a zero-based column index to the spreadsheet engine column type.
pub fn cast_col_num(value: usize) -> ExportResult<u16> {
    u16::try_from(value).map_err(|_| ExportError::Xlsx(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replacement_splits_on_first_separator() {
        let rep = parse_replacement("男_1", '_', "Human", "gender").unwrap();
        assert_eq!(rep.label, "男");
        assert_eq!(rep.value, "1");

        let rep = parse_replacement("a_b_c", '_', "Human", "gender").unwrap();
        assert_eq!(rep.label, "a");
        assert_eq!(rep.value, "b_c");
    }

    #[test]
    fn test_parse_replacement_rejects_missing_separator() {
        let err = parse_replacement("未知", '_', "Human", "gender").unwrap_err();
        match err {
            ExportError::MalformedMetadata {
                type_name,
                field_name,
                message,
            } => {
                assert_eq!(type_name, "Human");
                assert_eq!(field_name, "gender");
                assert!(message.contains("未知"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_derive_column_letter() {
        assert_eq!(derive_column_letter(0), "A");
        assert_eq!(derive_column_letter(2), "C");
        assert_eq!(derive_column_letter(25), "Z");
        assert_eq!(derive_column_letter(26), "AA");
        assert_eq!(derive_column_letter(701), "ZZ");
    }

    #[test]
    fn test_cast_col_num_overflow() {
        assert_eq!(cast_col_num(2).unwrap(), 2);
        assert!(cast_col_num(70_000).is_err());
    }
}
