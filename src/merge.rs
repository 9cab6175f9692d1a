//! Unification: combine two observed types into the most specific common one.
//!
//! Merge ⊔ is associative/commutative/idempotent over well-formed inputs, so
//! sample folds may run in any order, including tree reductions.
//!
//! Case precedence is load-bearing: optional and unknown absorption run
//! before any structural decision so a null-tainted sample never manufactures
//! a spurious union, and numeric widening runs before the union fallback so
//! Int/Float/Double observed across samples collapse to one scalar instead of
//! a three-way union.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{FieldType, NumberKind, ObjectField};

pub fn merge(a: FieldType, b: FieldType) -> FieldType {
    if a == b {
        return a;
    }
    match (a, b) {
        // "maybe absent" is sticky and never nests
        (FieldType::Optional(x), other) | (other, FieldType::Optional(x)) => {
            FieldType::optional(merge(*x, other.strip_optional()))
        }
        // an unknown sample carries no structural information
        (FieldType::Unknown(_), other) | (other, FieldType::Unknown(_)) => other,
        (a, b) => match unify_shapes(a, b) {
            Ok(merged) => merged,
            Err((a, b)) => into_union(a, b),
        },
    }
}

/// Numeric widening and same-shape structural merge. Hands the operands back
/// on failure so the caller can fall through to the union case.
fn unify_shapes(a: FieldType, b: FieldType) -> Result<FieldType, (FieldType, FieldType)> {
    match (a, b) {
        // Bool is not a magnitude; it never widens into the numeric lattice
        (FieldType::Number(x), FieldType::Number(y))
            if x != NumberKind::Bool && y != NumberKind::Bool =>
        {
            Ok(FieldType::Number(x.max(y)))
        }
        (FieldType::Object(n1, f1), FieldType::Object(n2, f2)) => {
            Ok(merge_objects(n1, f1, n2, f2))
        }
        (FieldType::List(e1), FieldType::List(e2)) => {
            Ok(FieldType::List(Box::new(merge(*e1, *e2))))
        }
        (a, b) => Err((a, b)),
    }
}

// Field-wise object merge. A field present on only one side becomes Optional:
// "some samples omit this key" must not make the objects incompatible.
fn merge_objects(
    n1: Option<String>,
    f1: BTreeSet<ObjectField>,
    n2: Option<String>,
    f2: BTreeSet<ObjectField>,
) -> FieldType {
    let mut right: BTreeMap<String, FieldType> =
        f2.into_iter().map(|field| (field.name, field.ty)).collect();

    let mut fields = BTreeSet::new();
    for field in f1 {
        let ty = match right.remove(&field.name) {
            Some(other) => merge(field.ty, other),
            None => FieldType::optional(field.ty),
        };
        fields.insert(ObjectField { name: field.name, ty });
    }
    for (name, ty) in right {
        fields.insert(ObjectField {
            name,
            ty: FieldType::optional(ty),
        });
    }

    FieldType::Object(n1.or(n2), fields)
}

// Union fallback. Existing member sets are folded into rather than
// concatenated, keeping membership minimal and coalesced.
fn into_union(a: FieldType, b: FieldType) -> FieldType {
    match (a, b) {
        (FieldType::Enum(n1, mut members), FieldType::Enum(n2, incoming)) => {
            for member in incoming {
                absorb_member(&mut members, member);
            }
            FieldType::Enum(n1.or(n2), members)
        }
        (FieldType::Enum(name, mut members), other)
        | (other, FieldType::Enum(name, mut members)) => {
            absorb_member(&mut members, other);
            FieldType::Enum(name, members)
        }
        (a, b) => {
            let mut members = BTreeSet::new();
            members.insert(a);
            members.insert(b);
            FieldType::Enum(None, members)
        }
    }
}

// Fold one incoming type into a member set: keep the set unchanged if the
// type is already present, coalesce it into the single structurally
// compatible member, or append it as a new member. Members stay pairwise
// incompatible, so at most one member can coalesce.
fn absorb_member(members: &mut BTreeSet<FieldType>, incoming: FieldType) {
    if members.contains(&incoming) {
        return;
    }
    for member in members.iter().cloned().collect::<Vec<_>>() {
        if let Some(merged) = coalesce(member.clone(), incoming.clone()) {
            members.remove(&member);
            members.insert(merged);
            return;
        }
    }
    members.insert(incoming);
}

// The non-union merge cases only; None where a full merge would reach the
// union fallback. Keeps member folding from nesting unions without bound.
fn coalesce(a: FieldType, b: FieldType) -> Option<FieldType> {
    if a == b {
        return Some(a);
    }
    match (a, b) {
        (FieldType::Optional(x), other) | (other, FieldType::Optional(x)) => {
            Some(FieldType::optional(merge(*x, other.strip_optional())))
        }
        (FieldType::Unknown(_), other) | (other, FieldType::Unknown(_)) => Some(other),
        (a, b) => unify_shapes(a, b).ok(),
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

    fn object(fields: impl IntoIterator<Item = ObjectField>) -> FieldType {
        Object(None, fields.into_iter().collect())
    }

    fn list(element: FieldType) -> FieldType {
        List(Box::new(element))
    }

    fn union(members: impl IntoIterator<Item = FieldType>) -> FieldType {
        Enum(None, members.into_iter().collect())
    }

    #[test]
    fn merge_is_idempotent() {
        let samples = [
            Text,
            Number(Double),
            list(Text),
            object([field("a", Text), field("b", Number(Int))]),
            union([Text, Number(Bool)]),
            FieldType::optional(Number(Int)),
        ];
        for ty in samples {
            assert_eq!(merge(ty.clone(), ty.clone()), ty);
        }
    }

    #[test]
    fn unknown_is_the_merge_identity() {
        let ty = object([field("a", Text)]);
        assert_eq!(merge(ty.clone(), Unknown(None)), ty);
        assert_eq!(merge(Unknown(None), ty.clone()), ty);
    }

    #[test]
    fn optional_absorbs_and_never_nests() {
        let merged = merge(FieldType::optional(Text), Text);
        assert_eq!(merged, FieldType::optional(Text));

        let both = merge(
            FieldType::optional(Number(Int)),
            FieldType::optional(Number(Double)),
        );
        assert_eq!(both, FieldType::optional(Number(Double)));
        assert!(!matches!(&both, Optional(inner) if matches!(inner.as_ref(), Optional(_))));
    }

    #[test]
    fn numeric_widening_follows_the_lattice() {
        assert_eq!(merge(Number(Int), Number(Double)), Number(Double));
        assert_eq!(merge(Number(Int), Number(Float)), Number(Float));
        assert_eq!(merge(Number(Float), Number(Double)), Number(Double));
        assert_eq!(merge(Number(Double), Number(Int)), Number(Double));
    }

    #[test]
    fn bool_never_widens_into_numbers() {
        let merged = merge(Number(Bool), Number(Double));
        assert_eq!(merged, union([Number(Bool), Number(Double)]));
    }

    #[test]
    fn union_members_coalesce_instead_of_accumulating() {
        // Double ⊔ Bool ⊔ Int must end as {Bool, Double}: the Int widens into
        // the existing Double member rather than becoming a third branch.
        let folded = merge(merge(Number(Double), Number(Bool)), Number(Int));
        assert_eq!(folded, union([Number(Bool), Number(Double)]));
    }

    #[test]
    fn merging_a_union_with_an_existing_member_changes_nothing() {
        let existing = union([Text, Number(Bool)]);
        assert_eq!(merge(existing.clone(), Text), existing);
    }

    #[test]
    fn unions_merge_into_each_other() {
        let left = union([Text, Number(Int)]);
        let right = union([Number(Double), list(Text)]);
        let merged = merge(left, right);
        assert_eq!(merged, union([Text, Number(Double), list(Text)]));
    }

    #[test]
    fn missing_fields_become_optional_in_both_orders() {
        let empty = object([]);
        let with_string = object([field("string", Text)]);
        let expected = object([field("string", FieldType::optional(Text))]);

        assert_eq!(merge(empty.clone(), with_string.clone()), expected);
        assert_eq!(merge(with_string, empty), expected);
    }

    #[test]
    fn shared_fields_merge_recursively() {
        let a = object([field("n", Number(Int)), field("s", Text)]);
        let b = object([field("n", Number(Double))]);
        let merged = merge(a, b);
        assert_eq!(
            merged,
            object([
                field("n", Number(Double)),
                field("s", FieldType::optional(Text)),
            ])
        );
    }

    #[test]
    fn lists_merge_element_types() {
        let merged = merge(list(Number(Int)), list(Number(Double)));
        assert_eq!(merged, list(Number(Double)));
    }

    #[test]
    fn object_names_survive_merging() {
        let named = Object(
            Some("Account".to_string()),
            [field("id", Number(Int))].into_iter().collect(),
        );
        let anonymous = object([field("id", Number(Int)), field("tag", Text)]);
        let merged = merge(named, anonymous);
        assert_eq!(merged.name(), Some("Account"));
    }

    #[test]
    fn recursive_union_list_interplay() {
        // Folding the field values ["String"], 10, [10.0], [null] must give
        // {List(Optional({Text, Double})), Int}.
        let samples = [
            list(Text),
            Number(Int),
            list(Number(Double)),
            list(FieldType::optional(Unknown(None))),
        ];
        let folded = samples
            .into_iter()
            .reduce(merge)
            .unwrap_or(Unknown(None));
        let expected = union([
            list(FieldType::optional(union([Text, Number(Double)]))),
            Number(Int),
        ]);
        assert_eq!(folded, expected);
    }

    #[test]
    fn merge_commutes_on_incompatible_shapes() {
        let ab = merge(Text, Number(Bool));
        let ba = merge(Number(Bool), Text);
        assert_eq!(ab, ba);
    }
}
