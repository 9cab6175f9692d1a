//! Swagger 2.0 import: walk every `paths.*.*.responses.*.schema` node and
//! build one model per response.
//!
//! Only the subset of the format the type model can express is interpreted;
//! `required` membership maps onto the present-vs-`Optional` distinction and
//! `#/definitions/...` references become named objects.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{FieldType, NumberKind, ObjectField};

#[derive(Debug, Error)]
pub enum SwaggerError {
    #[error("document has no `paths` object")]
    MissingPaths,
    #[error("unsupported $ref `{0}`: expected #/definitions/<name>")]
    UnsupportedRef(String),
    #[error("dangling $ref `{0}`: no such definition")]
    DanglingRef(String),
    #[error("circular $ref chain through `{0}`")]
    CircularRef(String),
    #[error("unsupported schema type `{0}`")]
    UnsupportedType(String),
}

/// One response model: the operation it came from, the status code, and the
/// imported type.
#[derive(Debug, Clone)]
pub struct ResponseModel {
    pub operation: String,
    pub status: String,
    pub ty: FieldType,
}

impl ResponseModel {
    /// Identifier-friendly name, e.g. "GET /pets/{id}" + "200" becomes
    /// "GetPetsId200".
    pub fn model_name(&self) -> String {
        let mut out = String::new();
        let mut upper_next = true;
        for c in format!("{} {}", self.operation, self.status).chars() {
            if c.is_ascii_alphanumeric() {
                if upper_next {
                    out.push(c.to_ascii_uppercase());
                } else {
                    out.push(c.to_ascii_lowercase());
                }
                upper_next = false;
            } else {
                upper_next = true;
            }
        }
        out
    }
}

const HTTP_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

pub fn import_document(doc: &Value) -> Result<Vec<ResponseModel>, SwaggerError> {
    let definitions = doc.get("definitions").and_then(Value::as_object);
    let paths = doc
        .get("paths")
        .and_then(Value::as_object)
        .ok_or(SwaggerError::MissingPaths)?;

    let mut models = Vec::new();
    for (path, item) in paths {
        let Some(operations) = item.as_object() else {
            continue;
        };
        for (method, operation) in operations {
            if !HTTP_METHODS.contains(&method.to_lowercase().as_str()) {
                continue;
            }
            let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
                continue;
            };
            for (status, response) in responses {
                let Some(schema) = response.get("schema") else {
                    continue;
                };
                let ty = import_schema(schema, definitions, &mut Vec::new())?;
                models.push(ResponseModel {
                    operation: format!("{} {}", method.to_uppercase(), path),
                    status: status.clone(),
                    ty,
                });
            }
        }
    }
    Ok(models)
}

fn import_schema(
    node: &Value,
    definitions: Option<&Map<String, Value>>,
    resolving: &mut Vec<String>,
) -> Result<FieldType, SwaggerError> {
    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        let name = reference
            .strip_prefix("#/definitions/")
            .ok_or_else(|| SwaggerError::UnsupportedRef(reference.to_string()))?;
        if resolving.iter().any(|seen| seen == name) {
            return Err(SwaggerError::CircularRef(name.to_string()));
        }
        let target = definitions
            .and_then(|table| table.get(name))
            .ok_or_else(|| SwaggerError::DanglingRef(name.to_string()))?;
        resolving.push(name.to_string());
        let resolved = import_schema(target, definitions, resolving)?;
        resolving.pop();
        return Ok(named(resolved, name));
    }

    let nullable = node
        .get("x-nullable")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let ty = match node.get("type").and_then(Value::as_str) {
        Some("string") => FieldType::Text,
        Some("boolean") => FieldType::Number(NumberKind::Bool),
        Some("integer") => FieldType::Number(NumberKind::Int),
        Some("number") => match node.get("format").and_then(Value::as_str) {
            Some("float") => FieldType::Number(NumberKind::Float),
            _ => FieldType::Number(NumberKind::Double),
        },
        Some("array") => {
            let element = match node.get("items") {
                Some(items) => import_schema(items, definitions, resolving)?,
                None => FieldType::Unknown(None),
            };
            FieldType::List(Box::new(element))
        }
        Some("object") => import_object(node, definitions, resolving)?,
        // untyped nodes with properties are objects in the wild
        None if node.get("properties").is_some() => import_object(node, definitions, resolving)?,
        None => FieldType::Unknown(None),
        Some(other) => return Err(SwaggerError::UnsupportedType(other.to_string())),
    };

    Ok(if nullable {
        FieldType::optional(ty)
    } else {
        ty
    })
}

fn import_object(
    node: &Value,
    definitions: Option<&Map<String, Value>>,
    resolving: &mut Vec<String>,
) -> Result<FieldType, SwaggerError> {
    let required: Vec<&str> = node
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut fields = BTreeSet::new();
    if let Some(properties) = node.get("properties").and_then(Value::as_object) {
        for (key, property) in properties {
            let ty = import_schema(property, definitions, resolving)?;
            let ty = if required.contains(&key.as_str()) {
                ty
            } else {
                FieldType::optional(ty)
            };
            fields.insert(ObjectField {
                name: key.clone(),
                ty,
            });
        }
    }
    Ok(FieldType::Object(
        node.get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        fields,
    ))
}

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
    use serde_json::json;

    fn field(name: &str, ty: FieldType) -> ObjectField {
        ObjectField {
            name: name.to_string(),
            ty,
        }
    }

    fn petstore() -> Value {
        json!({
            "swagger": "2.0",
            "paths": {
                "/pets/{id}": {
                    "get": {
                        "responses": {
                            "200": { "schema": { "$ref": "#/definitions/Pet" } },
                            "404": { "description": "not found" }
                        }
                    },
                    "parameters": [{ "name": "id", "in": "path" }]
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" },
                        "weight": { "type": "number", "format": "float" },
                        "tags": { "type": "array", "items": { "type": "string" } }
                    }
                }
            }
        })
    }

    #[test]
    fn responses_import_with_required_mapping() {
        let models = import_document(&petstore()).expect("imports");
        assert_eq!(models.len(), 1);

        let model = &models[0];
        assert_eq!(model.operation, "GET /pets/{id}");
        assert_eq!(model.status, "200");
        assert_eq!(model.model_name(), "GetPetsId200");

        let expected = Object(
            Some("Pet".to_string()),
            [
                field("id", Number(Int)),
                field("name", Text),
                field("weight", FieldType::optional(Number(Float))),
                field("tags", FieldType::optional(List(Box::new(Text)))),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(model.ty, expected);
    }

    #[test]
    fn nullable_extension_maps_to_optional() {
        let doc = json!({
            "paths": {
                "/x": {
                    "get": {
                        "responses": {
                            "200": {
                                "schema": {
                                    "type": "object",
                                    "required": ["note"],
                                    "properties": {
                                        "note": { "type": "string", "x-nullable": true }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let models = import_document(&doc).expect("imports");
        assert_eq!(
            models[0].ty,
            Object(
                None,
                [field("note", FieldType::optional(Text))]
                    .into_iter()
                    .collect()
            )
        );
    }

    #[test]
    fn dangling_definition_refs_fail() {
        let doc = json!({
            "paths": {
                "/x": {
                    "get": {
                        "responses": {
                            "200": { "schema": { "$ref": "#/definitions/Nope" } }
                        }
                    }
                }
            }
        });
        assert!(matches!(
            import_document(&doc),
            Err(SwaggerError::DanglingRef(name)) if name == "Nope"
        ));
    }

    #[test]
    fn self_referential_definitions_fail() {
        let doc = json!({
            "paths": {
                "/x": {
                    "get": {
                        "responses": {
                            "200": { "schema": { "$ref": "#/definitions/Node" } }
                        }
                    }
                }
            },
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": { "next": { "$ref": "#/definitions/Node" } }
                }
            }
        });
        assert!(matches!(
            import_document(&doc),
            Err(SwaggerError::CircularRef(_))
        ));
    }

    #[test]
    fn documents_without_paths_fail() {
        assert!(matches!(
            import_document(&json!({"swagger": "2.0"})),
            Err(SwaggerError::MissingPaths)
        ));
    }
}
