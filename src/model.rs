//! The structural type model every other module produces or consumes.
//!
//! A `FieldType` is immutable once built; decode and merge return new values.
//! Display names on `Object`/`Enum`/`Unknown` nodes are metadata only and are
//! excluded from equality, ordering, and hashing, so two same-shape nodes with
//! different names deduplicate inside the set-typed payloads.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// Scalar kind carried by [`FieldType::Number`].
///
/// Declaration order is the widening lattice `Int < Float < Double`.
/// `Bool` sorts below all of them and never widens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumberKind {
    Bool,
    Int,
    Float,
    Double,
}

#[derive(Debug, Clone)]
pub enum FieldType {
    Text,
    Number(NumberKind),
    Object(Option<String>, BTreeSet<ObjectField>),
    List(Box<FieldType>),
    Enum(Option<String>, BTreeSet<FieldType>),
    Unknown(Option<String>),
    Optional(Box<FieldType>),
}

/// A named object member. Equality is on name *and* type; the merge
/// discipline keeps at most one field per name inside an object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectField {
    pub name: String,
    pub ty: FieldType,
}

impl FieldType {
    /// Wrap in `Optional`, flattening so optionality never nests.
    pub fn optional(ty: FieldType) -> FieldType {
        match ty {
            FieldType::Optional(_) => ty,
            other => FieldType::Optional(Box::new(other)),
        }
    }

    /// Remove one `Optional` layer if present.
    pub fn strip_optional(self) -> FieldType {
        match self {
            FieldType::Optional(inner) => *inner,
            other => other,
        }
    }

    /// Display name, for the variants that carry one.
    pub fn name(&self) -> Option<&str> {
        match self {
            FieldType::Object(name, _) | FieldType::Enum(name, _) | FieldType::Unknown(name) => {
                name.as_deref()
            }
            _ => None,
        }
    }

    /// Canonical case name per variant, used for union branch identifiers in
    /// generated code.
    pub fn case_name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number(NumberKind::Bool) => "bool",
            FieldType::Number(NumberKind::Int) => "int",
            FieldType::Number(NumberKind::Float) => "float",
            FieldType::Number(NumberKind::Double) => "double",
            FieldType::Object(..) => "object",
            FieldType::List(_) => "list",
            FieldType::Enum(..) => "enum",
            FieldType::Unknown(_) => "unknown",
            FieldType::Optional(_) => "optional",
        }
    }
}

fn rank(ty: &FieldType) -> u8 {
    match ty {
        FieldType::Text => 0,
        FieldType::Number(_) => 1,
        FieldType::Object(..) => 2,
        FieldType::List(_) => 3,
        FieldType::Enum(..) => 4,
        FieldType::Unknown(_) => 5,
        FieldType::Optional(_) => 6,
    }
}

// Structural total order: variant rank, then payload. `BTreeSet` iteration is
// already sorted under this order, so set payloads compare and hash as
// canonical element sequences regardless of how they were built.
impl Ord for FieldType {
    fn cmp(&self, other: &Self) -> Ordering {
        use FieldType::*;
        match (self, other) {
            (Text, Text) => Ordering::Equal,
            (Number(a), Number(b)) => a.cmp(b),
            (Object(_, a), Object(_, b)) => a.iter().cmp(b.iter()),
            (List(a), List(b)) => a.cmp(b),
            (Enum(_, a), Enum(_, b)) => a.iter().cmp(b.iter()),
            (Unknown(_), Unknown(_)) => Ordering::Equal,
            (Optional(a), Optional(b)) => a.cmp(b),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

impl PartialOrd for FieldType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FieldType {}

impl Hash for FieldType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        rank(self).hash(state);
        match self {
            FieldType::Text | FieldType::Unknown(_) => {}
            FieldType::Number(kind) => kind.hash(state),
            FieldType::Object(_, fields) => {
                fields.len().hash(state);
                for field in fields {
                    field.hash(state);
                }
            }
            FieldType::List(element) => element.hash(state),
            FieldType::Enum(_, members) => {
                members.len().hash(state);
                for member in members {
                    member.hash(state);
                }
            }
            FieldType::Optional(inner) => inner.hash(state),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
