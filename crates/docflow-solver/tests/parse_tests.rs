//! Tests for type-expression parsing and canonical rendering.

use crate::parse::{TypeParseError, parse_type_expr};
use crate::types::{ScalarKind, TypeExpr};
use crate::utils::union_all;

fn parse(source: &str) -> TypeExpr {
    parse_type_expr(source).unwrap_or_else(|err| panic!("`{source}` should parse: {err}"))
}

// =============================================================================
// Scalars and classes
// =============================================================================

#[test]
fn test_scalar_keywords() {
    assert_eq!(parse("int"), TypeExpr::INT);
    assert_eq!(parse("string"), TypeExpr::STRING);
    assert_eq!(parse("bool"), TypeExpr::BOOL);
    assert_eq!(parse("float"), TypeExpr::FLOAT);
    assert_eq!(parse("null"), TypeExpr::NULL);
    assert_eq!(parse("mixed"), TypeExpr::MIXED);
    assert_eq!(parse("void"), TypeExpr::VOID);
    assert_eq!(parse("object"), TypeExpr::OBJECT);
    assert_eq!(parse("callable"), TypeExpr::CALLABLE);
    assert_eq!(parse("false"), TypeExpr::FALSE);
}

#[test]
fn test_keywords_are_case_insensitive_and_aliased() {
    assert_eq!(parse("Int"), TypeExpr::INT);
    assert_eq!(parse("STRING"), TypeExpr::STRING);
    assert_eq!(parse("integer"), TypeExpr::INT);
    assert_eq!(parse("boolean"), TypeExpr::BOOL);
    assert_eq!(parse("double"), TypeExpr::FLOAT);
    assert_eq!(parse("true"), TypeExpr::BOOL);
}

#[test]
fn test_unknown_names_are_classes() {
    assert_eq!(parse("Exception"), TypeExpr::class("Exception"));
    assert_eq!(parse("Foo\\A"), TypeExpr::class("Foo\\A"));
    assert_eq!(parse("\\Foo\\A"), TypeExpr::class("Foo\\A"));
    assert_eq!(parse("a"), TypeExpr::class("a"));
}

#[test]
fn test_bare_array_is_class_without_args() {
    assert_eq!(parse("array"), TypeExpr::array());
    assert_eq!(parse("Array"), TypeExpr::array());
}

// =============================================================================
// Composite forms
// =============================================================================

#[test]
fn test_nullable_prefix_is_union_with_null() {
    assert_eq!(
        parse("?string"),
        TypeExpr::Union(vec![TypeExpr::STRING, TypeExpr::NULL])
    );
    assert_eq!(parse("?A").render(), "A|null");
}

#[test]
fn test_union_is_canonical() {
    let ty = parse("null|string|int");
    assert_eq!(
        ty,
        TypeExpr::Union(vec![TypeExpr::INT, TypeExpr::STRING, TypeExpr::NULL])
    );
    assert_eq!(ty.render(), "int|string|null");
    assert_eq!(parse("string|int"), parse("int|string"));
    assert_eq!(parse("int|int"), TypeExpr::INT);
}

#[test]
fn test_union_with_mixed_collapses() {
    assert_eq!(parse("int|mixed|A"), TypeExpr::MIXED);
}

#[test]
fn test_generic_arguments() {
    assert_eq!(
        parse("array<int, string>"),
        TypeExpr::keyed_array(TypeExpr::INT, TypeExpr::STRING)
    );
    assert_eq!(parse("array<int,string>"), parse("array< int , string >"));
    assert_eq!(
        parse("array<Exception>"),
        TypeExpr::array_of(TypeExpr::class("Exception"))
    );
    assert_eq!(
        parse("Generator<int,int>"),
        TypeExpr::generic("Generator", vec![TypeExpr::INT, TypeExpr::INT])
    );
}

#[test]
fn test_generic_arguments_may_be_unions_or_nullable() {
    let ty = parse("?array<int, string|null>");
    let expected = union_all([
        TypeExpr::keyed_array(
            TypeExpr::INT,
            union_all([TypeExpr::STRING, TypeExpr::NULL]),
        ),
        TypeExpr::NULL,
    ]);
    assert_eq!(ty, expected);
    assert_eq!(ty.render(), "array<int, string|null>|null");

    assert_eq!(
        parse("array<mixed, array<mixed, mixed>>"),
        TypeExpr::keyed_array(
            TypeExpr::MIXED,
            TypeExpr::keyed_array(TypeExpr::MIXED, TypeExpr::MIXED)
        )
    );
}

#[test]
fn test_array_shorthand_and_groups() {
    assert_eq!(parse("int[]"), TypeExpr::array_of(TypeExpr::INT));
    assert_eq!(
        parse("string[][]"),
        TypeExpr::array_of(TypeExpr::array_of(TypeExpr::STRING))
    );
    assert_eq!(
        parse("(A|B)[]"),
        TypeExpr::array_of(union_all([TypeExpr::class("A"), TypeExpr::class("B")]))
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_empty_payload_fails() {
    assert_eq!(parse_type_expr(""), Err(TypeParseError::Empty));
    assert_eq!(parse_type_expr("   "), Err(TypeParseError::Empty));
}

#[test]
fn test_numerals_fail() {
    assert!(matches!(
        parse_type_expr("1"),
        Err(TypeParseError::Numeral { .. })
    ));
    assert!(matches!(
        parse_type_expr("1,"),
        Err(TypeParseError::Numeral { .. })
    ));
}

#[test]
fn test_variable_name_fails() {
    assert_eq!(
        parse_type_expr("$thus"),
        Err(TypeParseError::VariableName {
            raw: "$thus".to_string()
        })
    );
}

#[test]
fn test_dangling_and_leading_commas_fail() {
    assert!(matches!(
        parse_type_expr("a,"),
        Err(TypeParseError::Unexpected { found: ',', .. })
    ));
    assert!(matches!(
        parse_type_expr(",a"),
        Err(TypeParseError::Unexpected { found: ',', .. })
    ));
    assert!(matches!(
        parse_type_expr("array<int,>"),
        Err(TypeParseError::Unexpected { found: '>', .. })
    ));
}

#[test]
fn test_unclosed_brackets_fail() {
    assert!(matches!(
        parse_type_expr("array<int"),
        Err(TypeParseError::UnexpectedEnd { .. })
    ));
    assert!(matches!(
        parse_type_expr("(A|B"),
        Err(TypeParseError::UnexpectedEnd { .. })
    ));
    assert!(matches!(
        parse_type_expr("int|"),
        Err(TypeParseError::UnexpectedEnd { .. })
    ));
}

#[test]
fn test_trailing_garbage_fails() {
    assert!(matches!(
        parse_type_expr("int string"),
        Err(TypeParseError::Unexpected { found: 's', .. })
    ));
    assert!(parse_type_expr("int>").is_err());
}

#[test]
fn test_namespace_separator_needs_an_identifier() {
    assert_eq!(
        parse_type_expr("\\"),
        Err(TypeParseError::UnexpectedEnd { raw: "\\".to_string() })
    );
    assert!(matches!(
        parse_type_expr("Foo\\"),
        Err(TypeParseError::UnexpectedEnd { .. })
    ));
    assert!(matches!(
        parse_type_expr("Foo\\|int"),
        Err(TypeParseError::Unexpected { found: '|', .. })
    ));
    assert!(matches!(
        parse_type_expr("Foo\\\\Bar"),
        Err(TypeParseError::Unexpected { found: '\\', .. })
    ));
    assert!(matches!(
        parse_type_expr("array<\\>"),
        Err(TypeParseError::Unexpected { found: '>', .. })
    ));
    assert_eq!(parse("\\Foo\\Bar"), TypeExpr::class("Foo\\Bar"));
}

#[test]
fn test_excessive_nesting_fails() {
    let deep = format!("{}int{}", "array<".repeat(40), ">".repeat(40));
    assert!(matches!(
        parse_type_expr(&deep),
        Err(TypeParseError::TooDeep { .. })
    ));
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_render_parse_round_trip() {
    let sources = [
        "int",
        "string|null",
        "int|string",
        "array",
        "array<int, string>",
        "array<Exception>",
        "Foo\\A|null",
        "Generator<int, int>",
        "array<int, array<string, bool|null>>|false",
        "A|B|int",
    ];
    for source in sources {
        let ty = parse(source);
        assert_eq!(parse(&ty.render()), ty, "round trip of `{source}`");
    }
}

#[test]
fn test_render_is_canonical_text() {
    assert_eq!(parse("?array<int,string>").render(), "array<int, string>|null");
    assert_eq!(parse("null|B|A").render(), "A|B|null");
    assert_eq!(
        TypeExpr::Scalar(ScalarKind::Never).render(),
        "never"
    );
}
