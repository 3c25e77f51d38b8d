//! Field descriptor extraction over a record type hierarchy.

use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::spec::{SpecExcelMeta, SpecFieldDescriptor, SpecRecordType};

/// Ancestor chain of `record_type`, most-derived type first.
///
/// The universal root is implicit (`parent == None`) and never included.
pub fn derive_ancestor_chain<'t, 'a>(
    record_type: &'t SpecRecordType<'a>,
) -> Vec<&'t SpecRecordType<'a>> {
    let mut l_chain = Vec::new();
    let mut cursor = Some(record_type);
    while let Some(type_current) = cursor {
        l_chain.push(type_current);
        cursor = type_current.parent;
    }
    l_chain
}

/// Collect exportable field descriptors in discovery order.
///
/// Fields of the most-derived type come first (declaration order), then each
/// ancestor in turn. Fields without export metadata and hidden fields are
/// skipped.
pub fn derive_field_descriptors(
    record_type: &SpecRecordType<'_>,
) -> ExportResult<Vec<SpecFieldDescriptor>> {
    let mut l_descriptors = Vec::new();

    for type_current in derive_ancestor_chain(record_type) {
        let mut n_collected = 0usize;
        for field in type_current.fields {
            let Some(meta) = &field.meta_export else {
                continue;
            };
            if meta.if_hidden {
                continue;
            }

            l_descriptors.push(SpecFieldDescriptor {
                name: field.name.to_string(),
                type_name: type_current.name.to_string(),
                label: meta.label.to_string(),
                order_key: parse_order_key(meta, type_current.name, field.name)?,
                if_hidden: false,
                replacements: meta.replace.iter().map(|s| s.to_string()).collect(),
                width: meta.width,
            });
            n_collected += 1;
        }
        debug!(
            type_name = type_current.name,
            n_fields = n_collected,
            "collected exportable fields"
        );
    }

    Ok(l_descriptors)
}

/// The key must be a plain decimal integer; surrounding whitespace is malformed.
fn parse_order_key(
    meta: &SpecExcelMeta<'_>,
    type_name: &str,
    field_name: &str,
) -> ExportResult<i64> {
    meta.order_num
        .parse::<i64>()
        .map_err(|err| ExportError::MalformedMetadata {
            type_name: type_name.to_string(),
            field_name: field_name.to_string(),
            message: format!("order key {:?} is not an integer: {err}", meta.order_num),
        })
}
