//! Attaches scanned modifications to schema attributes.
//!
//! Matching is by field name only, case-insensitive — a script shared
//! across forms can attribute the same modification to same-named
//! fields on unrelated entities. That looseness is intentional and
//! preserved; downstream consumers rely on the current behavior.

use crate::model::{AttributeMetadata, CorrelatedAttribute, FieldModification};

/// Pure merge: for every attribute, in input order, collect the
/// modifications whose field name matches its logical column name.
/// Modification order within an attribute is discovery order.
pub fn correlate(
    attributes: &[AttributeMetadata],
    modifications: &[FieldModification],
) -> Vec<CorrelatedAttribute> {
    attributes
        .iter()
        .map(|attribute| {
            let matched: Vec<FieldModification> = modifications
                .iter()
                .filter(|m| m.field_name.eq_ignore_ascii_case(&attribute.column_logical))
                .cloned()
                .collect();
            CorrelatedAttribute {
                attribute: attribute.clone(),
                modifications: matched,
            }
        })
        .collect()
}
