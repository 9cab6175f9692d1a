//! Interchange schema documents.
//!
//! A flat JSON format with a `definitions` table: export hoists *named*
//! object/union nodes behind `$ref`, import restores them. The definitions
//! accumulator is threaded explicitly so the engine stays stateless. The
//! engine itself never sees this format; it only hands over and receives
//! fully normalized `FieldType` values.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{FieldType, NumberKind, ObjectField};

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT FORMAT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDoc {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// one of string|int|float|double|bool|object|list|any
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// object members, keyed by field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaDoc>>,

    /// list element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Box<SchemaDoc>>,

    /// union members, for `type: any`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub of: Option<Vec<SchemaDoc>>,

    #[serde(rename = "isOptional", default, skip_serializing_if = "is_false")]
    pub is_optional: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<IndexMap<String, SchemaDoc>>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown schema type `{0}`")]
    UnknownType(String),
    #[error("schema node has neither a type nor a $ref")]
    MissingType,
    #[error("dangling $ref `{0}`: no such definition")]
    DanglingRef(String),
    #[error("circular $ref chain through `{0}`")]
    CircularRef(String),
}

// ————————————————————————————————————————————————————————————————————————————
// EXPORT
// ————————————————————————————————————————————————————————————————————————————

/// Export as a standalone document, definitions table included.
pub fn export(ty: &FieldType) -> SchemaDoc {
    let mut definitions = IndexMap::new();
    let mut doc = export_node(ty, &mut definitions);
    if !definitions.is_empty() {
        doc.definitions = Some(definitions);
    }
    doc
}

/// Backend entry point: one schema document per root type. The root node is
/// given `name` when the inference left it anonymous.
pub fn translate(ty: &FieldType, name: &str) -> Vec<(String, String)> {
    let doc = export(&named(ty.clone(), name));
    let src = serde_json::to_string_pretty(&doc).expect("schema documents serialize to JSON");
    vec![(format!("{name}.schema.json"), src)]
}

fn export_node(ty: &FieldType, definitions: &mut IndexMap<String, SchemaDoc>) -> SchemaDoc {
    match ty {
        FieldType::Text => leaf("string"),
        FieldType::Number(NumberKind::Bool) => leaf("bool"),
        FieldType::Number(NumberKind::Int) => leaf("int"),
        FieldType::Number(NumberKind::Float) => leaf("float"),
        FieldType::Number(NumberKind::Double) => leaf("double"),
        FieldType::Unknown(name) => SchemaDoc {
            kind: Some("any".to_string()),
            name: name.clone(),
            ..Default::default()
        },
        FieldType::List(element) => SchemaDoc {
            kind: Some("list".to_string()),
            content: Some(Box::new(export_node(element, definitions))),
            ..Default::default()
        },
        FieldType::Optional(inner) => {
            let mut doc = export_node(inner, definitions);
            doc.is_optional = true;
            doc
        }
        FieldType::Object(name, fields) => {
            let mut properties = IndexMap::new();
            for field in fields {
                properties.insert(field.name.clone(), export_node(&field.ty, definitions));
            }
            let doc = SchemaDoc {
                kind: Some("object".to_string()),
                name: name.clone(),
                properties: Some(properties),
                ..Default::default()
            };
            hoist(name.as_deref(), doc, definitions)
        }
        FieldType::Enum(name, members) => {
            let of = members
                .iter()
                .map(|member| export_node(member, definitions))
                .collect();
            let doc = SchemaDoc {
                kind: Some("any".to_string()),
                name: name.clone(),
                of: Some(of),
                ..Default::default()
            };
            hoist(name.as_deref(), doc, definitions)
        }
    }
}

fn leaf(kind: &str) -> SchemaDoc {
    SchemaDoc {
        kind: Some(kind.to_string()),
        ..Default::default()
    }
}

// Named object/union nodes move into the definitions table; the tree keeps a
// $ref. First definition wins, which is safe because equal names with equal
// shapes export identically.
fn hoist(
    name: Option<&str>,
    doc: SchemaDoc,
    definitions: &mut IndexMap<String, SchemaDoc>,
) -> SchemaDoc {
    match name {
        Some(name) => {
            definitions.entry(name.to_string()).or_insert(doc);
            SchemaDoc {
                reference: Some(name.to_string()),
                ..Default::default()
            }
        }
        None => doc,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPORT
// ————————————————————————————————————————————————————————————————————————————

pub fn import(doc: &SchemaDoc) -> Result<FieldType, SchemaError> {
    let empty = IndexMap::new();
    let definitions = doc.definitions.as_ref().unwrap_or(&empty);
    import_node(doc, definitions, &mut Vec::new())
}

fn import_node(
    doc: &SchemaDoc,
    definitions: &IndexMap<String, SchemaDoc>,
    resolving: &mut Vec<String>,
) -> Result<FieldType, SchemaError> {
    let ty = if let Some(name) = &doc.reference {
        if resolving.iter().any(|seen| seen == name) {
            return Err(SchemaError::CircularRef(name.clone()));
        }
        let target = definitions
            .get(name)
            .ok_or_else(|| SchemaError::DanglingRef(name.clone()))?;
        resolving.push(name.clone());
        let resolved = import_node(target, definitions, resolving)?;
        resolving.pop();
        // a resolved definition inherits its table key as the display name
        named(resolved, name)
    } else {
        let kind = doc.kind.as_deref().ok_or(SchemaError::MissingType)?;
        match kind {
            "string" => FieldType::Text,
            "bool" => FieldType::Number(NumberKind::Bool),
            "int" => FieldType::Number(NumberKind::Int),
            "float" => FieldType::Number(NumberKind::Float),
            "double" => FieldType::Number(NumberKind::Double),
            "object" => {
                let mut fields = BTreeSet::new();
                if let Some(properties) = &doc.properties {
                    for (key, property) in properties {
                        fields.insert(ObjectField {
                            name: key.clone(),
                            ty: import_node(property, definitions, resolving)?,
                        });
                    }
                }
                FieldType::Object(doc.name.clone(), fields)
            }
            "list" => {
                let element = match &doc.content {
                    Some(content) => import_node(content, definitions, resolving)?,
                    None => FieldType::Unknown(None),
                };
                FieldType::List(Box::new(element))
            }
            "any" => match &doc.of {
                Some(members) => {
                    let mut set = BTreeSet::new();
                    for member in members {
                        set.insert(import_node(member, definitions, resolving)?);
                    }
                    FieldType::Enum(doc.name.clone(), set)
                }
                None => FieldType::Unknown(doc.name.clone()),
            },
            other => return Err(SchemaError::UnknownType(other.to_string())),
        }
    };
    Ok(if doc.is_optional {
        FieldType::optional(ty)
    } else {
        ty
    })
}

// Attach a display name to the variants that carry one, keeping any existing
// name.
fn named(ty: FieldType, name: &str) -> FieldType {
    match ty {
        FieldType::Object(existing, fields) => {
            FieldType::Object(existing.or_else(|| Some(name.to_string())), fields)
        }
        FieldType::Enum(existing, members) => {
            FieldType::Enum(existing.or_else(|| Some(name.to_string())), members)
        }
        FieldType::Unknown(existing) => {
            FieldType::Unknown(existing.or_else(|| Some(name.to_string())))
        }
        other => other,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType::*, NumberKind::*};

    fn field(name: &str, ty: FieldType) -> ObjectField {
        ObjectField {
            name: name.to_string(),
            ty,
        }
    }

    fn sample_type() -> FieldType {
        Object(
            Some("Account".to_string()),
            [
                field("id", Number(Int)),
                field("score", FieldType::optional(Number(Double))),
                field("tags", List(Box::new(Text))),
                field(
                    "payload",
                    Enum(None, [Text, Number(Bool)].into_iter().collect()),
                ),
                field("extra", Unknown(None)),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn export_import_round_trips() {
        let ty = sample_type();
        let doc = export(&ty);
        assert_eq!(import(&doc).expect("imports"), ty);
    }

    #[test]
    fn named_nodes_hoist_into_definitions() {
        let doc = export(&sample_type());
        assert_eq!(doc.reference.as_deref(), Some("Account"));
        let definitions = doc.definitions.as_ref().expect("definitions table");
        assert!(definitions.contains_key("Account"));
    }

    #[test]
    fn optionality_survives_the_round_trip() {
        let ty = Object(
            None,
            [field("maybe", FieldType::optional(Text))]
                .into_iter()
                .collect(),
        );
        let doc = export(&ty);
        assert_eq!(import(&doc).expect("imports"), ty);
    }

    #[test]
    fn dangling_refs_are_reported() {
        let doc = SchemaDoc {
            reference: Some("Missing".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            import(&doc),
            Err(SchemaError::DanglingRef(name)) if name == "Missing"
        ));
    }

    #[test]
    fn circular_refs_are_reported() {
        let mut definitions = IndexMap::new();
        definitions.insert(
            "Loop".to_string(),
            SchemaDoc {
                reference: Some("Loop".to_string()),
                ..Default::default()
            },
        );
        let doc = SchemaDoc {
            reference: Some("Loop".to_string()),
            definitions: Some(definitions),
            ..Default::default()
        };
        assert!(matches!(import(&doc), Err(SchemaError::CircularRef(_))));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let doc = SchemaDoc {
            kind: Some("tuple".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            import(&doc),
            Err(SchemaError::UnknownType(kind)) if kind == "tuple"
        ));
    }

    #[test]
    fn documents_parse_from_json_text() {
        let src = r#"{
            "type": "object",
            "properties": {
                "id": { "type": "int" },
                "label": { "type": "string", "isOptional": true }
            }
        }"#;
        let doc: SchemaDoc = serde_json::from_str(src).expect("parses");
        let ty = import(&doc).expect("imports");
        let expected = Object(
            None,
            [
                field("id", Number(Int)),
                field("label", FieldType::optional(Text)),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(ty, expected);
    }

    #[test]
    fn translate_names_the_root() {
        let anonymous = Object(
            None,
            [field("id", Number(Int))].into_iter().collect(),
        );
        let outputs = translate(&anonymous, "Root");
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, "Root.schema.json");
        let doc: SchemaDoc = serde_json::from_str(&outputs[0].1).expect("parses");
        let definitions = doc.definitions.as_ref().expect("definitions table");
        assert!(definitions.contains_key("Root"));
    }
}
