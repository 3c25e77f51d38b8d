//! Column order assignment.
//!
//! The assigner is the only place column indices are written; the resulting
//! [`SpecColumnIndexMap`] is read-only for the rest of the export.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::spec::{SpecColumnIndexMap, SpecExportOptions, SpecFieldDescriptor};

/// Validate option combinations before any planning happens.
pub fn validate_options(options: &SpecExportOptions) -> ExportResult<()> {
    if options.n_fields_max == 0 {
        return Err(ExportError::InvalidOptions(
            "n_fields_max must be >= 1.".to_string(),
        ));
    }
    if options.row_validation_min > options.row_validation_max {
        return Err(ExportError::InvalidOptions(
            "row_validation_min must be <= row_validation_max.".to_string(),
        ));
    }
    if options.width_cell_default <= 0.0 {
        return Err(ExportError::InvalidOptions(
            "width_cell_default must be > 0.".to_string(),
        ));
    }
    Ok(())
}

/// Sort descriptors by order key and assign zero-based column indices.
///
/// Fails when the hierarchy exports more than `n_fields_max` fields, when a
/// field name is exported by more than one level, or when two fields share an
/// order key.
pub fn plan_column_index_map(
    type_name: &str,
    descriptors: Vec<SpecFieldDescriptor>,
    n_fields_max: usize,
) -> ExportResult<SpecColumnIndexMap> {
    if descriptors.len() > n_fields_max {
        return Err(ExportError::FieldCountExceeded {
            type_name: type_name.to_string(),
            n_fields: descriptors.len(),
            n_fields_max,
        });
    }

    validate_unique_field_names(type_name, &descriptors)?;

    let mut l_descriptors_sorted = descriptors;
    l_descriptors_sorted.sort_by_key(|d| d.order_key);

    validate_unique_order_keys(type_name, &l_descriptors_sorted)?;

    let mut dict_col_idx = BTreeMap::new();
    for (n_idx_col, descriptor) in l_descriptors_sorted.iter().enumerate() {
        dict_col_idx.insert(descriptor.name.clone(), n_idx_col);
    }

    debug!(
        type_name,
        n_cols = dict_col_idx.len(),
        "assigned column indices"
    );

    Ok(SpecColumnIndexMap {
        dict_col_idx,
        l_descriptors_ordered: l_descriptors_sorted,
    })
}

/// A name exported twice would collapse two columns onto one map entry.
fn validate_unique_field_names(
    type_name: &str,
    descriptors: &[SpecFieldDescriptor],
) -> ExportResult<()> {
    let mut set_names: BTreeSet<&str> = BTreeSet::new();
    for descriptor in descriptors {
        if !set_names.insert(descriptor.name.as_str()) {
            return Err(ExportError::MalformedMetadata {
                type_name: type_name.to_string(),
                field_name: descriptor.name.clone(),
                message: format!(
                    "field is exported more than once in the hierarchy (again by {})",
                    descriptor.type_name
                ),
            });
        }
    }
    Ok(())
}

/// `descriptors` must already be sorted by order key.
fn validate_unique_order_keys(
    type_name: &str,
    descriptors: &[SpecFieldDescriptor],
) -> ExportResult<()> {
    for run in descriptors.chunk_by(|a, b| a.order_key == b.order_key) {
        if run.len() > 1 {
            return Err(ExportError::DuplicateOrderKey {
                type_name: type_name.to_string(),
                order_key: run[0].order_key,
                field_names: run.iter().map(|d| d.name.clone()).collect(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, order_key: i64) -> SpecFieldDescriptor {
        SpecFieldDescriptor {
            name: name.to_string(),
            type_name: "T".to_string(),
            label: name.to_uppercase(),
            order_key,
            if_hidden: false,
            replacements: vec![],
            width: None,
        }
    }

    #[test]
    fn test_indices_are_a_bijection_increasing_with_order_key() {
        let l_descriptors = vec![
            descriptor("c", 30),
            descriptor("a", -5),
            descriptor("d", 31),
            descriptor("b", 7),
        ];
        let map = plan_column_index_map("T", l_descriptors, 26).unwrap();

        assert_eq!(map.len(), 4);
        let mut l_indices: Vec<usize> = map.to_dict().into_values().collect();
        l_indices.sort_unstable();
        assert_eq!(l_indices, vec![0, 1, 2, 3]);

        let l_pairs: Vec<(usize, i64)> = map
            .iter_ordered()
            .map(|(n_idx, d)| (n_idx, d.order_key))
            .collect();
        assert!(l_pairs.windows(2).all(|w| w[0].1 < w[1].1));
        for (n_idx, d) in map.iter_ordered() {
            assert_eq!(map.get(&d.name), Some(n_idx));
        }
        assert_eq!(map.get("a"), Some(0));
        assert_eq!(map.get("d"), Some(3));
    }

    #[test]
    fn test_field_cap_is_inclusive() {
        let l_26: Vec<_> = (0..26).map(|i| descriptor(&format!("f{i}"), i)).collect();
        assert_eq!(plan_column_index_map("T", l_26, 26).unwrap().len(), 26);

        let l_27: Vec<_> = (0..27).map(|i| descriptor(&format!("f{i}"), i)).collect();
        let err = plan_column_index_map("Wide", l_27, 26).unwrap_err();
        assert!(matches!(
            err,
            ExportError::FieldCountExceeded { ref type_name, n_fields: 27, n_fields_max: 26 }
                if type_name == "Wide"
        ));
    }

    #[test]
    fn test_field_cap_is_configurable() {
        let l_27: Vec<_> = (0..27).map(|i| descriptor(&format!("f{i}"), i)).collect();
        assert_eq!(plan_column_index_map("T", l_27, 64).unwrap().len(), 27);
    }

    #[test]
    fn test_duplicate_order_key_is_rejected() {
        let l_descriptors = vec![
            descriptor("name", 1),
            descriptor("age", 2),
            descriptor("create_user", 2),
        ];
        let err = plan_column_index_map("Human", l_descriptors, 26).unwrap_err();
        match err {
            ExportError::DuplicateOrderKey {
                type_name,
                order_key,
                field_names,
            } => {
                assert_eq!(type_name, "Human");
                assert_eq!(order_key, 2);
                assert_eq!(field_names, vec!["age", "create_user"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_field_name_exported_by_two_levels_is_rejected() {
        let mut d_parent = descriptor("code", 5);
        d_parent.type_name = "Parent".to_string();
        d_parent.replacements = vec!["是_1".to_string()];
        let l_descriptors = vec![descriptor("name", 1), descriptor("code", 2), d_parent];

        let err = plan_column_index_map("Child", l_descriptors, 26).unwrap_err();
        assert!(matches!(
            err,
            ExportError::MalformedMetadata { ref type_name, ref field_name, .. }
                if type_name == "Child" && field_name == "code"
        ));
        assert!(err.to_string().contains("Parent"));
    }

    #[test]
    fn test_empty_descriptor_list_yields_empty_map() {
        let map = plan_column_index_map("Empty", vec![], 26).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_validate_options() {
        assert!(validate_options(&SpecExportOptions::default()).is_ok());

        let options = SpecExportOptions {
            row_validation_min: 10,
            row_validation_max: 9,
            ..Default::default()
        };
        assert!(matches!(
            validate_options(&options),
            Err(ExportError::InvalidOptions(_))
        ));

        let options = SpecExportOptions {
            n_fields_max: 0,
            ..Default::default()
        };
        assert!(validate_options(&options).is_err());
    }
}
