//! Tests for narrowing by runtime type tests.

use crate::narrowing::{Narrowed, NarrowingContext, TypeTest};
use crate::parse::parse_type_expr;
use crate::subtype::{NoopResolver, TypeResolver, is_subtype};
use crate::types::TypeExpr;
use crate::utils::union;

fn ty(source: &str) -> TypeExpr {
    parse_type_expr(source).expect("valid type")
}

fn narrow(source: &str, test: TypeTest) -> Narrowed {
    NarrowingContext::new(&NoopResolver).narrow(&ty(source), &test)
}

struct Hierarchy;

impl TypeResolver for Hierarchy {
    fn is_class_descendant(&self, child: &str, ancestor: &str) -> bool {
        child.eq_ignore_ascii_case("B") && ancestor.eq_ignore_ascii_case("A")
    }
}

// =============================================================================
// is_* builtins
// =============================================================================

#[test]
fn test_is_string_on_union() {
    let narrowed = narrow("int|string", TypeTest::IsString);
    assert_eq!(narrowed.when_true, TypeExpr::STRING);
    assert_eq!(narrowed.when_false, TypeExpr::INT);
}

#[test]
fn test_no_overlap_gives_never() {
    let narrowed = narrow("int|float", TypeTest::IsString);
    assert_eq!(narrowed.when_true, TypeExpr::NEVER);
    assert_eq!(narrowed.when_false, ty("float|int"));

    let narrowed = narrow("array<mixed, array<mixed, mixed>>", TypeTest::IsArray);
    assert_eq!(narrowed.when_false, TypeExpr::NEVER);
}

#[test]
fn test_mixed_narrows_to_tested_type() {
    let narrowed = narrow("mixed", TypeTest::IsString);
    assert_eq!(narrowed.when_true, TypeExpr::STRING);
    assert_eq!(narrowed.when_false, TypeExpr::MIXED);

    let narrowed = narrow("mixed", TypeTest::IsArray);
    assert_eq!(narrowed.when_true, TypeExpr::array());
}

#[test]
fn test_is_scalar_and_is_bool() {
    let narrowed = narrow("int|A|false", TypeTest::IsScalar);
    assert_eq!(narrowed.when_true, ty("false|int"));
    assert_eq!(narrowed.when_false, ty("A"));

    let narrowed = narrow("bool|null", TypeTest::IsBool);
    assert_eq!(narrowed.when_true, TypeExpr::BOOL);
    assert_eq!(narrowed.when_false, TypeExpr::NULL);
}

#[test]
fn test_negation_swaps_branches() {
    let narrowed = narrow("int|string", TypeTest::IsInt).negate();
    assert_eq!(narrowed.when_true, TypeExpr::STRING);
    assert_eq!(narrowed.when_false, TypeExpr::INT);
}

// =============================================================================
// instanceof
// =============================================================================

#[test]
fn test_instanceof_filters_classes() {
    let narrowed = narrow("A|C|null", TypeTest::InstanceOf("A".to_string()));
    assert_eq!(narrowed.when_true, ty("A"));
    assert_eq!(narrowed.when_false, ty("C|null"));
}

#[test]
fn test_instanceof_subclass_refines_parent() {
    let ctx = NarrowingContext::new(&Hierarchy);
    let narrowed = ctx.narrow(&ty("A"), &TypeTest::InstanceOf("B".to_string()));
    assert_eq!(narrowed.when_true, ty("B"));
    assert_eq!(narrowed.when_false, ty("A"));

    let narrowed = ctx.narrow(&ty("B|int"), &TypeTest::InstanceOf("A".to_string()));
    assert_eq!(narrowed.when_true, ty("B"));
    assert_eq!(narrowed.when_false, TypeExpr::INT);
}

// =============================================================================
// Identity and truthiness
// =============================================================================

#[test]
fn test_identical_false() {
    let narrowed = narrow("int|false", TypeTest::IdenticalFalse);
    assert_eq!(narrowed.when_true, TypeExpr::FALSE);
    assert_eq!(narrowed.when_false, TypeExpr::INT);

    let narrowed = narrow("bool", TypeTest::IdenticalFalse);
    assert_eq!(narrowed.when_true, TypeExpr::FALSE);
    assert_eq!(narrowed.when_false, TypeExpr::BOOL);
}

#[test]
fn test_identical_null() {
    let narrowed = narrow("?A", TypeTest::IdenticalNull);
    assert_eq!(narrowed.when_true, TypeExpr::NULL);
    assert_eq!(narrowed.when_false, ty("A"));
}

#[test]
fn test_truthiness() {
    let narrowed = narrow("A|null", TypeTest::Truthy);
    assert_eq!(narrowed.when_true, ty("A"));
    assert_eq!(narrowed.when_false, TypeExpr::NULL);

    let narrowed = narrow("string|false", TypeTest::Truthy);
    assert_eq!(narrowed.when_true, TypeExpr::STRING);
    assert_eq!(narrowed.when_false, ty("false|string"));

    let narrowed = narrow("mixed", TypeTest::Truthy);
    assert_eq!(narrowed.when_true, TypeExpr::MIXED);
    assert_eq!(narrowed.when_false, TypeExpr::MIXED);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_join_of_branches_is_within_original() {
    let sources = ["int|string", "A|null", "bool", "int|false", "mixed", "array<int>|A"];
    let tests = [
        TypeTest::IsString,
        TypeTest::IsArray,
        TypeTest::IsNull,
        TypeTest::Truthy,
        TypeTest::IdenticalFalse,
        TypeTest::InstanceOf("A".to_string()),
    ];
    for source in sources {
        let original = ty(source);
        for test in &tests {
            let narrowed = NarrowingContext::new(&NoopResolver).narrow(&original, test);
            let joined = union(&narrowed.when_true, &narrowed.when_false);
            assert!(
                is_subtype(&joined, &original),
                "{source} narrowed by {test:?} joined to {joined}"
            );
        }
    }
}

#[test]
fn test_true_branch_of_exact_member_is_exact() {
    let narrowed = narrow("A|B", TypeTest::InstanceOf("A".to_string()));
    assert_eq!(narrowed.when_true, ty("A"));
}

#[test]
fn test_function_name_lookup() {
    assert_eq!(TypeTest::from_function_name("is_string"), Some(TypeTest::IsString));
    assert_eq!(TypeTest::from_function_name("\\is_array"), Some(TypeTest::IsArray));
    assert_eq!(TypeTest::from_function_name("IS_INT"), Some(TypeTest::IsInt));
    assert_eq!(TypeTest::from_function_name("strlen"), None);
}
