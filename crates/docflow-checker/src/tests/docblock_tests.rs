use crate::docblock::*;
use docflow_common::IssueKind;
use docflow_solver::{TypeExpr, parse_type_expr};

fn ty(source: &str) -> TypeExpr {
    parse_type_expr(source).expect("test type should parse")
}

#[test]
fn test_function_tags_are_parsed_in_order() {
    let raw = "/**\n * @param string $a\n * @param int|null $b\n * @return bool\n */";
    let parsed = parse_docblock(raw, DocblockSite::Function, 10);

    assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
    let doc = &parsed.docblock;
    assert_eq!(doc.tags().len(), 3);
    assert_eq!(doc.param_type("$a"), Some(&TypeExpr::STRING));
    assert_eq!(doc.param_type("$b"), Some(&ty("int|null")));
    assert_eq!(doc.param_type("$c"), None);
    assert_eq!(doc.return_type(), Some(&TypeExpr::BOOL));

    let lines: Vec<u32> = doc.tags().iter().map(|tag| tag.source_line).collect();
    assert_eq!(lines, vec![11, 12, 13]);
}

#[test]
fn test_param_without_variable_is_badly_formatted() {
    let raw = "/**\n * @param string\n * @return void\n */";
    let parsed = parse_docblock(raw, DocblockSite::Function, 2);

    assert_eq!(
        parsed.issues,
        vec![DocblockIssue {
            message: "Badly-formatted @param".to_string(),
            line: 3,
        }]
    );
    // The well-formed tag survives.
    assert_eq!(parsed.docblock.return_type(), Some(&TypeExpr::VOID));
}

#[test]
fn test_malformed_return_payloads() {
    for payload in ["$thus", "1", "1,", "a,", "\\", "Foo\\"] {
        let raw = format!("/** @return {payload} */");
        let parsed = parse_docblock(&raw, DocblockSite::Function, 1);
        assert_eq!(parsed.issues.len(), 1, "payload {payload:?}");
        assert_eq!(parsed.docblock.return_type(), None, "payload {payload:?}");
    }
}

#[test]
fn test_duplicate_return_is_reported() {
    let raw = "/**\n * @return int\n * @return string\n */";
    let parsed = parse_docblock(raw, DocblockSite::Function, 1);

    assert_eq!(parsed.issues.len(), 1);
    assert_eq!(parsed.issues[0].message, "Duplicate @return tag");
    assert_eq!(parsed.docblock.return_type(), Some(&TypeExpr::INT));
}

#[test]
fn test_inline_var_named_and_unnamed() {
    let parsed = parse_docblock("/** @var array<Exception> */", DocblockSite::Inline, 4);
    assert!(parsed.issues.is_empty());
    assert_eq!(parsed.docblock.var_type(), Some(&ty("array<Exception>")));
    assert_eq!(parsed.docblock.named_vars().count(), 0);

    let parsed = parse_docblock("/** @var int $a */", DocblockSite::Inline, 4);
    assert_eq!(parsed.docblock.var_type(), None);
    let named: Vec<(&str, &TypeExpr)> = parsed.docblock.named_vars().collect();
    assert_eq!(named, vec![("$a", &TypeExpr::INT)]);
}

#[test]
fn test_suppressions_accept_lists_and_skip_unknown_names() {
    let raw = "/**\n * @psalm-suppress MixedArgument, MixedOperand\n * @psalm-suppress NotAThing\n */";
    let parsed = parse_docblock(raw, DocblockSite::Function, 1);

    assert!(parsed.issues.is_empty());
    let suppressions = parsed.docblock.suppressions();
    assert_eq!(suppressions.len(), 2);
    assert!(suppressions.contains(&IssueKind::MixedArgument));
    assert!(suppressions.contains(&IssueKind::MixedOperand));
}

#[test]
fn test_flags() {
    let raw = "/**\n * @deprecated\n * @psalm-ignore-nullable-return\n * @return ?string\n */";
    let parsed = parse_docblock(raw, DocblockSite::Function, 1);

    assert!(parsed.docblock.is_deprecated());
    assert!(parsed.docblock.ignores_nullable_return());
    assert_eq!(parsed.docblock.return_type(), Some(&ty("?string")));
}

#[test]
fn test_class_properties_drop_the_dollar() {
    let raw = "/**\n * @property string $foo\n * @property-read int $bar\n */";
    let parsed = parse_docblock(raw, DocblockSite::Class, 1);

    let props: Vec<(&str, &TypeExpr)> = parsed.docblock.properties().collect();
    assert_eq!(
        props,
        vec![("foo", &TypeExpr::STRING), ("bar", &TypeExpr::INT)]
    );
}

#[test]
fn test_tags_irrelevant_to_site_are_ignored() {
    let raw = "/**\n * @return int\n * @param string $a\n */";
    let parsed = parse_docblock(raw, DocblockSite::Property, 1);

    assert!(parsed.issues.is_empty());
    assert!(parsed.docblock.tags().is_empty());
}

#[test]
fn test_generic_type_with_spaces_stays_one_token() {
    let raw = "/** @param array<int, string> $map */";
    let parsed = parse_docblock(raw, DocblockSite::Function, 1);

    assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
    assert_eq!(parsed.docblock.param_type("$map"), Some(&ty("array<int,string>")));
}

#[test]
fn test_generator_return() {
    let raw = "/**\n * @return Generator\n * @psalm-generator-return string\n */";
    let parsed = parse_docblock(raw, DocblockSite::Function, 1);

    assert_eq!(parsed.docblock.generator_return_type(), Some(&TypeExpr::STRING));
}
