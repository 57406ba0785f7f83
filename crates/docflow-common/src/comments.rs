//! Docblock comment text helpers.
//!
//! The syntax-tree walker hands the analyzer raw comment text (delimiters
//! included). These helpers strip the `/** … */` framing and leading `*`
//! gutters while remembering which source line each content line came
//! from, so tag diagnostics can point at the right place.

/// One content line of a docblock, with its offset from the comment's first line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocblockLine<'a> {
    pub line_offset: u32,
    pub text: &'a str,
}

/// Check if a comment is a docblock comment (`/** … */`, not `/*** … */`).
pub fn is_docblock_comment(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with("/**") && !text.starts_with("/***")
}

/// Split a docblock into its content lines.
///
/// Accepts text with or without the `/**` and `*/` delimiters. Blank lines
/// are dropped; offsets of the remaining lines are preserved.
pub fn get_docblock_lines(text: &str) -> Vec<DocblockLine<'_>> {
    let mut inner = text.trim();
    if let Some(rest) = inner.strip_prefix("/**") {
        inner = rest;
    }
    if let Some(rest) = inner.strip_suffix("*/") {
        inner = rest;
    }

    inner
        .split('\n')
        .enumerate()
        .filter_map(|(offset, raw)| {
            let trimmed = raw.trim_end_matches('\r').trim_start();
            let content = match trimmed.strip_prefix('*') {
                Some(rest) => rest.trim(),
                None => trimmed.trim(),
            };
            if content.is_empty() {
                return None;
            }
            Some(DocblockLine {
                line_offset: offset as u32,
                text: content,
            })
        })
        .collect()
}
