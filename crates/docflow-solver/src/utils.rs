//! Union construction.
//!
//! Every union in the crate is built here so the canonical-form invariants
//! listed in [`crate::types`] hold everywhere.

use crate::types::{ScalarKind, TypeExpr};
use rustc_hash::FxHashSet;

/// Union of two types.
pub fn union(a: &TypeExpr, b: &TypeExpr) -> TypeExpr {
    union_all([a.clone(), b.clone()])
}

/// Union of any number of types. An empty input is `never`.
pub fn union_all(types: impl IntoIterator<Item = TypeExpr>) -> TypeExpr {
    let mut seen: FxHashSet<TypeExpr> = FxHashSet::default();
    let mut flat: Vec<TypeExpr> = Vec::new();

    for ty in types {
        let members = match ty {
            TypeExpr::Union(members) => members,
            other => vec![other],
        };
        for member in members {
            match member {
                TypeExpr::Scalar(ScalarKind::Mixed) => return TypeExpr::MIXED,
                TypeExpr::Scalar(ScalarKind::Never) => {}
                member => {
                    if seen.insert(member.clone()) {
                        flat.push(member);
                    }
                }
            }
        }
    }

    // `false` is already covered by `bool`.
    if seen.contains(&TypeExpr::BOOL) {
        flat.retain(|member| *member != TypeExpr::FALSE);
    }

    match flat.len() {
        0 => TypeExpr::NEVER,
        1 => flat.swap_remove(0),
        _ => {
            flat.sort_by_cached_key(|member| (member.is_null(), member.render()));
            TypeExpr::Union(flat)
        }
    }
}

/// Reduces a vector of types to a union, single type, or `never`.
pub fn union_or_single(mut types: Vec<TypeExpr>) -> TypeExpr {
    match types.len() {
        0 => TypeExpr::NEVER,
        1 => types.swap_remove(0),
        _ => union_all(types),
    }
}
