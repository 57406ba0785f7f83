//! Tests for union construction.

use crate::types::TypeExpr;
use crate::utils::{union, union_all, union_or_single};

#[test]
fn test_unions_flatten() {
    let inner = union_all([TypeExpr::INT, TypeExpr::STRING]);
    let outer = union_all([inner, TypeExpr::NULL, TypeExpr::INT]);
    assert_eq!(
        outer,
        TypeExpr::Union(vec![TypeExpr::INT, TypeExpr::STRING, TypeExpr::NULL])
    );
}

#[test]
fn test_bool_absorbs_false() {
    assert_eq!(union(&TypeExpr::FALSE, &TypeExpr::BOOL), TypeExpr::BOOL);
    assert_eq!(
        union(&TypeExpr::FALSE, &TypeExpr::INT).render(),
        "false|int"
    );
}

#[test]
fn test_union_or_single() {
    assert_eq!(union_or_single(Vec::new()), TypeExpr::NEVER);
    assert_eq!(union_or_single(vec![TypeExpr::INT]), TypeExpr::INT);
    assert_eq!(
        union_or_single(vec![TypeExpr::NULL, TypeExpr::STRING]).render(),
        "string|null"
    );
}

#[test]
fn test_type_queries() {
    let ty = union_all([TypeExpr::class("A"), TypeExpr::NULL]);
    assert!(ty.is_nullable());
    assert_eq!(ty.without_null(), TypeExpr::class("A"));
    assert!(ty.contains_class("a"));
    assert_eq!(TypeExpr::NULL.without_null(), TypeExpr::NEVER);

    let arr = TypeExpr::keyed_array(TypeExpr::INT, TypeExpr::STRING);
    assert_eq!(arr.array_value_type(), Some(TypeExpr::STRING));
    assert_eq!(arr.array_key_type(), Some(TypeExpr::INT));
    assert_eq!(TypeExpr::array().array_value_type(), Some(TypeExpr::MIXED));
    assert_eq!(TypeExpr::INT.array_value_type(), None);
}
