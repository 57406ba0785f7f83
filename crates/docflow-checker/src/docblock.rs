//! Docblock annotation parsing.
//!
//! Turns the raw text of one doc comment into an ordered list of typed
//! tags. Recognised tags:
//!
//! ```text
//! @param <Type> $<name>
//! @return <Type>
//! @var <Type> [$<name>]
//! @property <Type> $<name>        (also @property-read / @property-write)
//! @deprecated
//! @psalm-suppress <IssueKind>[, <IssueKind>…]
//! @psalm-ignore-nullable-return
//! @psalm-generator-return <Type>
//! ```
//!
//! A malformed tag produces one `DocblockIssue` and is dropped; the other
//! tags of the block are kept. Unknown tags, and tags that make no sense at
//! the documented site, are ignored.

use docflow_common::IssueKind;
use docflow_common::comments::get_docblock_lines;
use docflow_solver::{TypeExpr, parse_type_expr};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKind {
    Param,
    Return,
    Var,
    Property,
    Deprecated,
    Suppress,
    IgnoreNullableReturn,
    GeneratorReturn,
}

impl TagKind {
    fn from_tag_name(name: &str) -> Option<TagKind> {
        let kind = match name {
            "param" => TagKind::Param,
            "return" => TagKind::Return,
            "var" => TagKind::Var,
            "property" | "property-read" | "property-write" => TagKind::Property,
            "deprecated" => TagKind::Deprecated,
            "psalm-suppress" => TagKind::Suppress,
            "psalm-ignore-nullable-return" => TagKind::IgnoreNullableReturn,
            "psalm-generator-return" => TagKind::GeneratorReturn,
            _ => return None,
        };
        Some(kind)
    }

    pub const fn tag_name(self) -> &'static str {
        match self {
            TagKind::Param => "@param",
            TagKind::Return => "@return",
            TagKind::Var => "@var",
            TagKind::Property => "@property",
            TagKind::Deprecated => "@deprecated",
            TagKind::Suppress => "@psalm-suppress",
            TagKind::IgnoreNullableReturn => "@psalm-ignore-nullable-return",
            TagKind::GeneratorReturn => "@psalm-generator-return",
        }
    }

    fn applies_to(self, site: DocblockSite) -> bool {
        use DocblockSite::*;
        match self {
            TagKind::Param
            | TagKind::Return
            | TagKind::IgnoreNullableReturn
            | TagKind::GeneratorReturn => site == Function,
            TagKind::Var => matches!(site, Property | Inline),
            TagKind::Property => site == Class,
            TagKind::Deprecated => matches!(site, Class | Function | Property),
            TagKind::Suppress => true,
        }
    }
}

/// What kind of node a doc comment is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocblockSite {
    Class,
    Function,
    Property,
    /// A statement-level comment (`/** @var int $a */`).
    Inline,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationTag {
    pub kind: TagKind,
    pub raw_payload: String,
    pub resolved_type: Option<TypeExpr>,
    /// With the `$` for `@param`/`@var`; without it for `@property`.
    pub target_name: Option<String>,
    pub source_line: u32,
}

/// The parsed tags of one doc comment. Read-only once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Docblock {
    tags: SmallVec<[AnnotationTag; 4]>,
    deprecated: bool,
    ignore_nullable_return: bool,
    suppressions: FxHashSet<IssueKind>,
}

impl Docblock {
    pub fn tags(&self) -> &[AnnotationTag] {
        &self.tags
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn ignores_nullable_return(&self) -> bool {
        self.ignore_nullable_return
    }

    pub fn suppressions(&self) -> &FxHashSet<IssueKind> {
        &self.suppressions
    }

    fn typed_tag(&self, kind: TagKind) -> Option<&TypeExpr> {
        self.tags
            .iter()
            .find(|tag| tag.kind == kind)
            .and_then(|tag| tag.resolved_type.as_ref())
    }

    pub fn return_type(&self) -> Option<&TypeExpr> {
        self.typed_tag(TagKind::Return)
    }

    pub fn generator_return_type(&self) -> Option<&TypeExpr> {
        self.typed_tag(TagKind::GeneratorReturn)
    }

    /// Type of the `@param` naming `name` (with the `$`).
    pub fn param_type(&self, name: &str) -> Option<&TypeExpr> {
        self.named(TagKind::Param, name)
    }

    /// Type of the unnamed `@var`.
    pub fn var_type(&self) -> Option<&TypeExpr> {
        self.tags
            .iter()
            .find(|tag| tag.kind == TagKind::Var && tag.target_name.is_none())
            .and_then(|tag| tag.resolved_type.as_ref())
    }

    /// Every `@var` tag that names a variable, as `(name, type)`.
    pub fn named_vars(&self) -> impl Iterator<Item = (&str, &TypeExpr)> {
        self.tags.iter().filter_map(|tag| match (&tag.target_name, &tag.resolved_type) {
            (Some(name), Some(ty)) if tag.kind == TagKind::Var => Some((name.as_str(), ty)),
            _ => None,
        })
    }

    /// `@property` tags, as `(name, type)`.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &TypeExpr)> {
        self.tags.iter().filter_map(|tag| match (&tag.target_name, &tag.resolved_type) {
            (Some(name), Some(ty)) if tag.kind == TagKind::Property => {
                Some((name.as_str(), ty))
            }
            _ => None,
        })
    }

    fn named(&self, kind: TagKind, name: &str) -> Option<&TypeExpr> {
        self.tags
            .iter()
            .find(|tag| tag.kind == kind && tag.target_name.as_deref() == Some(name))
            .and_then(|tag| tag.resolved_type.as_ref())
    }
}

/// A malformed tag. Always reported as `InvalidDocblock`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocblockIssue {
    pub message: String,
    pub line: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedDocblock {
    pub docblock: Docblock,
    pub issues: Vec<DocblockIssue>,
}

/// Parse one doc comment attached at `site`, whose `/**` is on `start_line`.
pub fn parse_docblock(raw: &str, site: DocblockSite, start_line: u32) -> ParsedDocblock {
    let mut parsed = ParsedDocblock::default();

    for line in get_docblock_lines(raw) {
        let Some(tag_text) = line.text.strip_prefix('@') else {
            continue;
        };
        let (name, payload) = match tag_text.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (tag_text, ""),
        };
        let Some(kind) = TagKind::from_tag_name(name) else {
            continue;
        };
        if !kind.applies_to(site) {
            trace!(tag = name, ?site, "tag ignored at this site");
            continue;
        }
        parse_tag(&mut parsed, kind, payload, start_line + line.line_offset);
    }

    parsed
}

fn parse_tag(parsed: &mut ParsedDocblock, kind: TagKind, payload: &str, line: u32) {
    let issue = |message: String| DocblockIssue { message, line };

    match kind {
        TagKind::Deprecated => {
            parsed.docblock.deprecated = true;
            return;
        }
        TagKind::IgnoreNullableReturn => {
            parsed.docblock.ignore_nullable_return = true;
            return;
        }
        TagKind::Suppress => {
            for name in payload
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|name| !name.is_empty())
            {
                match name.parse::<IssueKind>() {
                    Ok(issue_kind) => {
                        parsed.docblock.suppressions.insert(issue_kind);
                    }
                    Err(err) => trace!(%err, "ignoring suppression"),
                }
            }
            parsed.docblock.tags.push(AnnotationTag {
                kind,
                raw_payload: payload.to_string(),
                resolved_type: None,
                target_name: None,
                source_line: line,
            });
            return;
        }
        _ => {}
    }

    let (type_token, rest) = split_type_token(payload);
    let target = first_variable(rest);

    let needs_name = matches!(kind, TagKind::Param | TagKind::Property);
    if type_token.starts_with('$') || (needs_name && (type_token.is_empty() || target.is_none()))
    {
        parsed
            .issues
            .push(issue(format!("Badly-formatted {}", kind.tag_name())));
        return;
    }

    if kind == TagKind::Return && parsed.docblock.tags.iter().any(|t| t.kind == TagKind::Return) {
        parsed.issues.push(issue("Duplicate @return tag".to_string()));
        return;
    }
    if kind == TagKind::Var
        && target.is_none()
        && parsed.docblock.var_type().is_some()
    {
        parsed.issues.push(issue("Duplicate @var tag".to_string()));
        return;
    }

    let resolved = match parse_type_expr(type_token) {
        Ok(ty) => ty,
        Err(err) => {
            parsed.issues.push(issue(format!(
                "Invalid type in {}: {err}",
                kind.tag_name()
            )));
            return;
        }
    };

    let target_name = target.map(|name| match kind {
        TagKind::Property => name.trim_start_matches('$').to_string(),
        _ => name.to_string(),
    });

    parsed.docblock.tags.push(AnnotationTag {
        kind,
        raw_payload: payload.to_string(),
        resolved_type: Some(resolved),
        target_name,
        source_line: line,
    });
}

/// Split a tag payload into its type token and the remainder.
///
/// The type token ends at the first whitespace outside `<…>` and `(…)`.
fn split_type_token(payload: &str) -> (&str, &str) {
    let mut depth = 0i32;
    for (i, c) in payload.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            c if c.is_whitespace() && depth <= 0 => {
                return (&payload[..i], payload[i..].trim_start());
            }
            _ => {}
        }
    }
    (payload, "")
}

/// The `$name` that opens `rest`, ignoring `&` and `...` markers.
fn first_variable(rest: &str) -> Option<&str> {
    let token = rest.split_whitespace().next()?;
    let token = token.trim_start_matches('&').trim_start_matches("...");
    let name = token.strip_prefix('$')?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii());
    valid.then_some(token)
}
