//! Dropdown validation constraints derived from replacement metadata.

use rust_xlsxwriter::{DataValidation, Worksheet};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::spec::{
    SpecColumnIndexMap, SpecExportOptions, SpecFieldDescriptor, SpecValidationConstraint,
};
use crate::util::{cast_col_num, parse_replacement};

////////////////////////////////////////////////////////////////////////////////
// #region SheetBoundary

/// Sheet that can attach explicit-list validations to a cell range.
pub trait ListValidationTarget {
    /// Restrict `[row_min, row_max] x [col_idx_first, col_idx_last]` to `allowed_labels`.
    fn add_list_validation(
        &mut self,
        col_idx_first: usize,
        col_idx_last: usize,
        row_min: u32,
        row_max: u32,
        allowed_labels: &[String],
    ) -> ExportResult<()>;
}

impl ListValidationTarget for Worksheet {
    fn add_list_validation(
        &mut self,
        col_idx_first: usize,
        col_idx_last: usize,
        row_min: u32,
        row_max: u32,
        allowed_labels: &[String],
    ) -> ExportResult<()> {
        let validation = DataValidation::new().allow_list_strings(allowed_labels)?;
        self.add_data_validation(
            row_min,
            cast_col_num(col_idx_first)?,
            row_max,
            cast_col_num(col_idx_last)?,
            &validation,
        )?;
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConstraintPlanning

/// Label half of every `"label_value"` entry, in declaration order.
pub fn derive_allowed_labels(
    descriptor: &SpecFieldDescriptor,
    separator: char,
) -> ExportResult<Vec<String>> {
    descriptor
        .replacements
        .iter()
        .map(|entry| {
            parse_replacement(entry, separator, &descriptor.type_name, &descriptor.name)
                .map(|rep| rep.label)
        })
        .collect()
}

/// Build one constraint per descriptor that declares replacements.
///
/// Descriptors without replacements produce nothing. A constrained field that
/// is missing from `column_map` is an error, never skipped.
pub fn plan_validation_constraints(
    descriptors: &[SpecFieldDescriptor],
    column_map: &SpecColumnIndexMap,
    options: &SpecExportOptions,
) -> ExportResult<Vec<SpecValidationConstraint>> {
    let mut l_constraints = Vec::new();

    for descriptor in descriptors {
        if descriptor.replacements.is_empty() {
            continue;
        }

        let allowed_labels = derive_allowed_labels(descriptor, options.separator_replace)?;
        let Some(n_idx_col) = column_map.get(&descriptor.name) else {
            return Err(ExportError::UnresolvedColumnReference {
                field_name: descriptor.name.clone(),
            });
        };

        l_constraints.push(SpecValidationConstraint {
            field_name: descriptor.name.clone(),
            col_idx_first: n_idx_col,
            col_idx_last: n_idx_col,
            row_min: options.row_validation_min,
            row_max: options.row_validation_max,
            allowed_labels,
        });
    }

    Ok(l_constraints)
}

/// Attach every constraint to `target`. Constraints are independent, so
/// application order does not matter.
pub fn apply_validation_constraints<T>(
    target: &mut T,
    constraints: &[SpecValidationConstraint],
) -> ExportResult<()>
where
    T: ListValidationTarget + ?Sized,
{
    for constraint in constraints {
        target.add_list_validation(
            constraint.col_idx_first,
            constraint.col_idx_last,
            constraint.row_min,
            constraint.row_max,
            &constraint.allowed_labels,
        )?;
        debug!(
            field_name = %constraint.field_name,
            col_idx = constraint.col_idx_first,
            n_labels = constraint.allowed_labels.len(),
            "attached dropdown validation"
        );
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::plan_column_index_map;

    type RecordedCall = (usize, usize, u32, u32, Vec<String>);

    #[derive(Default)]
    struct RecordingSheet {
        calls: Vec<RecordedCall>,
    }

    impl ListValidationTarget for RecordingSheet {
        fn add_list_validation(
            &mut self,
            col_idx_first: usize,
            col_idx_last: usize,
            row_min: u32,
            row_max: u32,
            allowed_labels: &[String],
        ) -> ExportResult<()> {
            self.calls.push((
                col_idx_first,
                col_idx_last,
                row_min,
                row_max,
                allowed_labels.to_vec(),
            ));
            Ok(())
        }
    }

    fn descriptor(name: &str, order_key: i64, replacements: &[&str]) -> SpecFieldDescriptor {
        SpecFieldDescriptor {
            name: name.to_string(),
            type_name: "Human".to_string(),
            label: name.to_string(),
            order_key,
            if_hidden: false,
            replacements: replacements.iter().map(|s| s.to_string()).collect(),
            width: None,
        }
    }

    fn human_descriptors() -> Vec<SpecFieldDescriptor> {
        vec![
            descriptor("name", 1, &[]),
            descriptor("age", 2, &[]),
            descriptor("gender", 3, &["男_1", "女_2", "未知_3"]),
        ]
    }

    #[test]
    fn test_allowed_labels_keep_label_half_in_order() {
        let d = descriptor("gender", 3, &["男_1", "女_2", "未知_3"]);
        assert_eq!(derive_allowed_labels(&d, '_').unwrap(), vec!["男", "女", "未知"]);
    }

    #[test]
    fn test_one_constraint_per_constrained_field() {
        let l_descriptors = human_descriptors();
        let map = plan_column_index_map("Human", l_descriptors.clone(), 26).unwrap();
        let l_constraints =
            plan_validation_constraints(&l_descriptors, &map, &SpecExportOptions::default())
                .unwrap();

        assert_eq!(
            l_constraints,
            vec![SpecValidationConstraint {
                field_name: "gender".to_string(),
                col_idx_first: 2,
                col_idx_last: 2,
                row_min: 1,
                row_max: 65_535,
                allowed_labels: vec!["男".to_string(), "女".to_string(), "未知".to_string()],
            }]
        );
    }

    #[test]
    fn test_fields_without_replacements_produce_no_constraint() {
        let l_descriptors = vec![descriptor("name", 1, &[]), descriptor("age", 2, &[])];
        let map = plan_column_index_map("Human", l_descriptors.clone(), 26).unwrap();
        let l_constraints =
            plan_validation_constraints(&l_descriptors, &map, &SpecExportOptions::default())
                .unwrap();
        assert!(l_constraints.is_empty());
    }

    #[test]
    fn test_unmapped_constrained_field_fails_fast() {
        let map = plan_column_index_map("Human", vec![descriptor("name", 1, &[])], 26).unwrap();
        let err = plan_validation_constraints(
            &[descriptor("gender", 3, &["男_1"])],
            &map,
            &SpecExportOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExportError::UnresolvedColumnReference { ref field_name } if field_name == "gender"
        ));
    }

    #[test]
    fn test_entry_without_separator_is_malformed() {
        let l_descriptors = vec![descriptor("gender", 1, &["男_1", "女"])];
        let map = plan_column_index_map("Human", l_descriptors.clone(), 26).unwrap();
        let err = plan_validation_constraints(&l_descriptors, &map, &SpecExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::MalformedMetadata { .. }));
        assert!(err.to_string().contains("\"女\""));
    }

    #[test]
    fn test_apply_forwards_single_column_bounded_rows() {
        let l_descriptors = human_descriptors();
        let map = plan_column_index_map("Human", l_descriptors.clone(), 26).unwrap();
        let l_constraints =
            plan_validation_constraints(&l_descriptors, &map, &SpecExportOptions::default())
                .unwrap();

        let mut sheet = RecordingSheet::default();
        apply_validation_constraints(&mut sheet, &l_constraints).unwrap();

        assert_eq!(
            sheet.calls,
            vec![(
                2,
                2,
                1,
                65_535,
                vec!["男".to_string(), "女".to_string(), "未知".to_string()]
            )]
        );
    }

    #[test]
    fn test_planning_is_deterministic() {
        let run = || {
            let l_descriptors = human_descriptors();
            let map = plan_column_index_map("Human", l_descriptors.clone(), 26).unwrap();
            let l_constraints =
                plan_validation_constraints(&l_descriptors, &map, &SpecExportOptions::default())
                    .unwrap();
            (map, l_constraints)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_apply_to_worksheet() {
        use std::io::Read;

        let mut worksheet = Worksheet::new();
        let constraint = SpecValidationConstraint {
            field_name: "gender".to_string(),
            col_idx_first: 2,
            col_idx_last: 2,
            row_min: 1,
            row_max: 65_535,
            allowed_labels: vec!["男".to_string(), "女".to_string()],
        };
        apply_validation_constraints(&mut worksheet, &[constraint]).unwrap();

        let mut workbook = rust_xlsxwriter::Workbook::new();
        workbook.push_worksheet(worksheet);
        let v_bytes = workbook.save_to_buffer().unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(v_bytes)).unwrap();
        let mut c_sheet_xml = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut c_sheet_xml)
            .unwrap();
        assert!(c_sheet_xml.contains("<dataValidations count=\"1\">"));
        assert!(c_sheet_xml.contains("type=\"list\""));
        assert!(c_sheet_xml.contains("sqref=\"C2:C65536\""));
        assert!(c_sheet_xml.contains("<formula1>\"男,女\"</formula1>"));
    }
}
