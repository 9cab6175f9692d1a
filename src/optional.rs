//! Conservative optionality: mark every nested field and element as possibly
//! absent, independent of what the samples actually showed.

use crate::model::{FieldType, ObjectField};

/// Recursively optionalize the *contents* of `ty` without wrapping `ty`
/// itself. This is the public entry point: the outermost type stays bare.
pub fn deepen(ty: FieldType) -> FieldType {
    match ty {
        FieldType::Object(name, fields) => {
            let fields = fields
                .into_iter()
                .map(|field| ObjectField {
                    name: field.name,
                    ty: optionalize(field.ty),
                })
                .collect();
            FieldType::Object(name, fields)
        }
        FieldType::List(element) => FieldType::List(Box::new(deepen(*element))),
        FieldType::Enum(name, members) => {
            FieldType::Enum(name, members.into_iter().map(deepen).collect())
        }
        // one flattening step, consistent with the per-field transform
        FieldType::Optional(inner) => FieldType::optional(deepen(*inner)),
        scalar @ (FieldType::Text | FieldType::Number(_) | FieldType::Unknown(_)) => scalar,
    }
}

// Per-field transform: strip one optional layer, deepen, re-wrap. Stripping
// first keeps already-optional fields from double-wrapping.
fn optionalize(ty: FieldType) -> FieldType {
    FieldType::optional(deepen(ty.strip_optional()))
}

// ------------------------------- Tests ------------------------------------ //
