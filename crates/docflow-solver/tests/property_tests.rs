//! Property-based tests for the union algebra and canonical rendering.
//!
//! Types are generated through the public constructors and `union_all`, so
//! every generated value is one the rest of the analyzer can build.

use crate::parse::parse_type_expr;
use crate::subtype::is_subtype;
use crate::types::{ScalarKind, TypeExpr};
use crate::utils::{union, union_all};
use proptest::prelude::*;

fn arb_scalar() -> impl Strategy<Value = TypeExpr> {
    prop_oneof![
        Just(ScalarKind::Int),
        Just(ScalarKind::String),
        Just(ScalarKind::Bool),
        Just(ScalarKind::False),
        Just(ScalarKind::Float),
        Just(ScalarKind::Null),
        Just(ScalarKind::Mixed),
        Just(ScalarKind::Void),
        Just(ScalarKind::Callable),
        Just(ScalarKind::Object),
        Just(ScalarKind::Never),
    ]
    .prop_map(TypeExpr::Scalar)
}

fn arb_class_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("A"),
        Just("B"),
        Just("Exception"),
        Just("Foo\\Bar"),
        Just("Generator"),
    ]
}

fn arb_leaf() -> impl Strategy<Value = TypeExpr> {
    prop_oneof![
        3 => arb_scalar(),
        1 => arb_class_name().prop_map(TypeExpr::class),
        1 => Just(TypeExpr::array()),
    ]
}

/// Arbitrary types: unions, arrays and generic classes over the leaves.
fn arb_type() -> impl Strategy<Value = TypeExpr> {
    arb_leaf().prop_recursive(
        3,  // max depth
        32, // max nodes
        4,  // items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 2..4).prop_map(union_all),
                inner.clone().prop_map(TypeExpr::array_of),
                (inner.clone(), inner.clone())
                    .prop_map(|(key, value)| TypeExpr::keyed_array(key, value)),
                (arb_class_name(), prop::collection::vec(inner, 1..3))
                    .prop_map(|(name, args)| TypeExpr::generic(name, args)),
            ]
        },
    )
}

proptest! {
    #[test]
    fn union_is_commutative(a in arb_type(), b in arb_type()) {
        prop_assert_eq!(union(&a, &b), union(&b, &a));
    }

    #[test]
    fn union_is_idempotent(a in arb_type()) {
        prop_assert_eq!(union(&a, &a), a);
    }

    #[test]
    fn union_is_associative(a in arb_type(), b in arb_type(), c in arb_type()) {
        prop_assert_eq!(union(&union(&a, &b), &c), union(&a, &union(&b, &c)));
    }

    #[test]
    fn mixed_absorbs_and_never_is_identity(a in arb_type()) {
        prop_assert_eq!(union(&a, &TypeExpr::MIXED), TypeExpr::MIXED);
        prop_assert_eq!(union(&a, &TypeExpr::NEVER), a);
    }

    #[test]
    fn rendered_types_parse_back(a in arb_type()) {
        let rendered = a.render();
        let parsed = parse_type_expr(&rendered);
        prop_assert_eq!(parsed, Ok(a), "rendered as `{}`", rendered);
    }

    #[test]
    fn subtype_is_reflexive(a in arb_type()) {
        prop_assert!(is_subtype(&a, &a));
    }

    #[test]
    fn each_side_is_a_subtype_of_the_union(a in arb_type(), b in arb_type()) {
        let joined = union(&a, &b);
        prop_assert!(is_subtype(&a, &joined), "{} <: {}", a, joined);
        prop_assert!(is_subtype(&b, &joined), "{} <: {}", b, joined);
    }
}
