//! Strict Rust model emission.
//!
//! Purely templated: name escaping, indentation, and a queue of nested
//! definitions. Receives fully normalized types (no redundant optional
//! nesting, deduplicated union members) and never re-normalizes.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{FieldType, NumberKind, ObjectField};

static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid regex"));

static RUST_KEYWORDS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
        "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
        "where", "while",
    ]
    .into_iter()
    .collect()
});

// keywords that cannot be raw identifiers
const UNESCAPABLE: [&str; 4] = ["self", "Self", "super", "crate"];

/// Backend entry point: one generated source file per root type.
pub fn translate(ty: &FieldType, name: &str) -> Vec<(String, String)> {
    let mut cg = Codegen::new();
    cg.emit(ty, name);
    vec![(format!("{}.rs", field_name(name)), cg.into_string())]
}

pub struct Codegen {
    out: String,
    emitted: BTreeSet<String>,
}

impl Codegen {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            emitted: BTreeSet::new(),
        }
    }

    pub fn emit(&mut self, ty: &FieldType, name: &str) {
        let type_name = type_name(name);
        match ty {
            FieldType::Object(_, fields) => self.emit_struct(&type_name, fields),
            FieldType::Enum(_, members) => self.emit_enum(&type_name, members),
            other => {
                let mut nested = Vec::new();
                let expr = self.type_expr(other, &type_name, &mut nested);
                self.out
                    .push_str(&format!("pub type {type_name} = {expr};\n\n"));
                for (nested_name, nested_ty) in nested {
                    self.emit(&nested_ty, &nested_name);
                }
            }
        }
    }

    pub fn into_string(self) -> String {
        let date = chrono::Utc::now().format("%Y-%m-%d");
        format!(
            "// @generated by json-unify on {date}\n\nuse serde::{{Deserialize, Serialize}};\n\n{}",
            self.out
        )
    }

    fn emit_struct(&mut self, type_name: &str, fields: &BTreeSet<ObjectField>) {
        if !self.emitted.insert(type_name.to_string()) {
            return;
        }
        let mut nested = Vec::new();
        let mut body = String::new();
        for field in fields {
            let hint = format!("{type_name}{}", type_name_fragment(&field.name));
            let expr = self.type_expr(&field.ty, &hint, &mut nested);
            let ident = field_ident(&field.name);
            if ident.trim_start_matches("r#") != field.name {
                body.push_str(&format!("    #[serde(rename = \"{}\")]\n", field.name));
            }
            body.push_str(&format!("    pub {ident}: {expr},\n"));
        }
        self.out.push_str(&format!(
            "#[derive(Debug, Clone, Serialize, Deserialize)]\npub struct {type_name} {{\n{body}}}\n\n"
        ));
        for (nested_name, nested_ty) in nested {
            self.emit(&nested_ty, &nested_name);
        }
    }

    fn emit_enum(&mut self, type_name: &str, members: &BTreeSet<FieldType>) {
        if !self.emitted.insert(type_name.to_string()) {
            return;
        }
        let mut nested = Vec::new();
        let mut body = String::new();
        for member in members {
            // member case names are unique: the unifier never leaves two
            // same-shape members in one union
            let variant = member
                .name()
                .map(type_name_fragment)
                .unwrap_or_else(|| type_name_fragment(member.case_name()));
            let hint = format!("{type_name}{variant}");
            let expr = self.type_expr(member, &hint, &mut nested);
            body.push_str(&format!("    {variant}({expr}),\n"));
        }
        self.out.push_str(&format!(
            "#[derive(Debug, Clone, Serialize, Deserialize)]\n#[serde(untagged)]\npub enum {type_name} {{\n{body}}}\n\n"
        ));
        for (nested_name, nested_ty) in nested {
            self.emit(&nested_ty, &nested_name);
        }
    }

    // Type expression for a field or element position. Object/union nodes
    // yield a type name (their own, or one derived from the field path) and
    // queue the definition.
    fn type_expr(
        &self,
        ty: &FieldType,
        hint: &str,
        nested: &mut Vec<(String, FieldType)>,
    ) -> String {
        match ty {
            FieldType::Text => "String".to_string(),
            FieldType::Number(NumberKind::Bool) => "bool".to_string(),
            FieldType::Number(NumberKind::Int) => "i64".to_string(),
            FieldType::Number(NumberKind::Float) => "f32".to_string(),
            FieldType::Number(NumberKind::Double) => "f64".to_string(),
            FieldType::Unknown(_) => "serde_json::Value".to_string(),
            FieldType::Optional(inner) => {
                format!("Option<{}>", self.type_expr(inner, hint, nested))
            }
            FieldType::List(element) => {
                format!(
                    "Vec<{}>",
                    self.type_expr(element, &format!("{hint}Item"), nested)
                )
            }
            FieldType::Object(name, _) | FieldType::Enum(name, _) => {
                let type_name = type_name(name.as_deref().unwrap_or(hint));
                nested.push((type_name.clone(), ty.clone()));
                type_name
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NAME ESCAPING
// ————————————————————————————————————————————————————————————————————————————

fn type_name_fragment(name: &str) -> String {
    NON_IDENT
        .replace_all(name, "_")
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn type_name(name: &str) -> String {
    let mut ident = type_name_fragment(name);
    if ident.is_empty() {
        ident = "Anonymous".to_string();
    }
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn field_name(name: &str) -> String {
    let cleaned = NON_IDENT.replace_all(name, "_");
    let mut out = String::new();
    let mut prev_lower = false;
    for c in cleaned.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out.trim_matches('_').to_string()
}

fn field_ident(name: &str) -> String {
    let mut ident = field_name(name);
    if ident.is_empty() {
        ident = "field".to_string();
    }
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if UNESCAPABLE.contains(&ident.as_str()) {
        format!("{ident}_")
    } else if RUST_KEYWORDS.contains(ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}

// ------------------------------- Tests ------------------------------------ //
