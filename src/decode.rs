//! Sample decoding: one document value to one `FieldType`.
//!
//! Total over the closed `serde_json` value domain; there is no error case.
//! List elements observed inside a single sample are folded with the unifier,
//! map values are decoded independently (keys are unique within one sample).

use serde_json::{Map, Value};

use crate::merge::merge;
use crate::model::{FieldType, NumberKind, ObjectField};

pub fn decode(value: &Value) -> FieldType {
    match value {
        Value::Null => FieldType::optional(FieldType::Unknown(None)),
        Value::Bool(_) => FieldType::Number(NumberKind::Bool),
        Value::Number(n) => {
            if n.as_i64().is_some() || n.as_u64().is_some() {
                FieldType::Number(NumberKind::Int)
            } else {
                // JSON floats are double precision; Float only enters the
                // lattice through imported schema documents
                FieldType::Number(NumberKind::Double)
            }
        }
        Value::String(_) => FieldType::Text,
        Value::Array(items) => decode_list(items),
        Value::Object(map) => decode_object(map),
    }
}

/// Fold a batch of independent samples into one type.
pub fn decode_all<'a, I>(values: I) -> FieldType
where
    I: IntoIterator<Item = &'a Value>,
{
    values
        .into_iter()
        .map(decode)
        .reduce(merge)
        .unwrap_or(FieldType::Unknown(None))
}

fn decode_list(items: &[Value]) -> FieldType {
    let element = items
        .iter()
        .map(decode)
        .reduce(merge)
        .unwrap_or(FieldType::Unknown(None));
    FieldType::List(Box::new(element))
}

fn decode_object(map: &Map<String, Value>) -> FieldType {
    let fields = map
        .iter()
        .map(|(key, value)| ObjectField {
            name: key.clone(),
            ty: decode(value),
        })
        .collect();
    FieldType::Object(None, fields)
}

// ------------------------------- Tests ------------------------------------ //
