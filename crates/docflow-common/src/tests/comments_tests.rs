use crate::comments::*;

#[test]
fn test_is_docblock_comment() {
    assert!(is_docblock_comment("/** @var int */"));
    assert!(is_docblock_comment("  /**\n * @return void\n */"));
    assert!(!is_docblock_comment("/* plain */"));
    assert!(!is_docblock_comment("/*** banner ***/"));
    assert!(!is_docblock_comment("// line"));
}

#[test]
fn test_docblock_lines_strip_gutters_and_keep_offsets() {
    let text = "/**\n * @param string $a\n *\n * @return int\n */";
    let lines = get_docblock_lines(text);

    assert_eq!(
        lines,
        vec![
            DocblockLine {
                line_offset: 1,
                text: "@param string $a"
            },
            DocblockLine {
                line_offset: 3,
                text: "@return int"
            },
        ]
    );
}

#[test]
fn test_single_line_docblock() {
    let lines = get_docblock_lines("/** @var array<Exception> */");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_offset, 0);
    assert_eq!(lines[0].text, "@var array<Exception>");
}

#[test]
fn test_carriage_returns_are_ignored() {
    let lines = get_docblock_lines("/**\r\n * @return void\r\n */");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text, "@return void");
}
