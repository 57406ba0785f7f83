//! Type-expression parser.
//!
//! Grammar (whitespace is allowed between tokens):
//!
//! ```text
//! union    := nullable ( '|' nullable )*
//! nullable := '?' postfix | postfix
//! postfix  := atom ( '[' ']' )*
//! atom     := '(' union ')' | name ( '<' union ( ',' union )* '>' )?
//! name     := '\'? ident ( '\' ident )*
//! ```
//!
//! Scalar keywords are resolved here, case-insensitively. Every other name
//! is a class type; whether that class exists is the registry's concern.

use crate::types::{ARRAY_CLASS, ScalarKind, TypeExpr};
use crate::utils::union_all;
use docflow_common::limits::MAX_TYPE_EXPR_DEPTH;
use smallvec::SmallVec;
use tracing::trace;

/// Why a type expression failed to parse. Each variant carries the raw text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeParseError {
    #[error("empty type")]
    Empty,
    #[error("`{raw}` is a number, not a type")]
    Numeral { raw: String },
    #[error("`{raw}` is a variable name, not a type")]
    VariableName { raw: String },
    #[error("unexpected `{found}` at offset {offset} in `{raw}`")]
    Unexpected {
        raw: String,
        found: char,
        offset: usize,
    },
    #[error("unexpected end of `{raw}`")]
    UnexpectedEnd { raw: String },
    #[error("`{raw}` is nested too deeply")]
    TooDeep { raw: String },
}

/// Parse a type expression such as `?array<int, string>` or `A|B|null`.
pub fn parse_type_expr(source: &str) -> Result<TypeExpr, TypeParseError> {
    let text = source.trim();
    if text.is_empty() {
        return Err(TypeParseError::Empty);
    }

    let mut parser = TypeParser {
        raw: text,
        chars: text.char_indices().collect(),
        pos: 0,
        depth: 0,
    };
    let ty = parser.parse_union()?;
    parser.skip_whitespace();
    if let Some((offset, found)) = parser.peek_indexed() {
        return Err(parser.unexpected(found, offset));
    }
    trace!(source = text, parsed = %ty, "parsed type expression");
    Ok(ty)
}

struct TypeParser<'a> {
    raw: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    depth: u32,
}

impl TypeParser<'_> {
    fn parse_union(&mut self) -> Result<TypeExpr, TypeParseError> {
        let mut members: SmallVec<[TypeExpr; 4]> = SmallVec::new();
        members.push(self.parse_nullable()?);
        loop {
            self.skip_whitespace();
            if self.peek() != Some('|') {
                break;
            }
            self.pos += 1;
            members.push(self.parse_nullable()?);
        }
        if members.len() == 1 {
            return Ok(members.remove(0));
        }
        Ok(union_all(members))
    }

    fn parse_nullable(&mut self) -> Result<TypeExpr, TypeParseError> {
        self.skip_whitespace();
        if self.peek() == Some('?') {
            self.pos += 1;
            let inner = self.parse_postfix()?;
            return Ok(TypeExpr::nullable(inner));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<TypeExpr, TypeParseError> {
        let mut ty = self.parse_atom()?;
        loop {
            self.skip_whitespace();
            if self.peek() != Some('[') {
                return Ok(ty);
            }
            self.pos += 1;
            self.skip_whitespace();
            self.expect(']')?;
            ty = TypeExpr::array_of(ty);
        }
    }

    fn parse_atom(&mut self) -> Result<TypeExpr, TypeParseError> {
        self.skip_whitespace();
        let Some((offset, c)) = self.peek_indexed() else {
            return Err(self.unexpected_end());
        };

        match c {
            '(' => {
                self.pos += 1;
                self.enter()?;
                let inner = self.parse_union()?;
                self.skip_whitespace();
                self.expect(')')?;
                self.depth -= 1;
                Ok(inner)
            }
            '$' => Err(TypeParseError::VariableName {
                raw: self.raw.to_string(),
            }),
            c if c.is_ascii_digit() || c == '-' => Err(TypeParseError::Numeral {
                raw: self.raw.to_string(),
            }),
            c if is_ident_start(c) || c == '\\' => {
                let name = self.parse_name()?;
                self.skip_whitespace();
                if self.peek() == Some('<') {
                    self.pos += 1;
                    self.enter()?;
                    let args = self.parse_generic_args()?;
                    self.depth -= 1;
                    return Ok(TypeExpr::generic(class_name(&name), args));
                }
                Ok(match ScalarKind::from_keyword(&name) {
                    Some(kind) => TypeExpr::Scalar(kind),
                    None => TypeExpr::class(class_name(&name)),
                })
            }
            other => Err(self.unexpected(other, offset)),
        }
    }

    /// Arguments after an opening `<`, through the closing `>`.
    fn parse_generic_args(&mut self) -> Result<Vec<TypeExpr>, TypeParseError> {
        let mut args = vec![self.parse_union()?];
        loop {
            self.skip_whitespace();
            match self.peek_indexed() {
                Some((_, ',')) => {
                    self.pos += 1;
                    args.push(self.parse_union()?);
                }
                Some((_, '>')) => {
                    self.pos += 1;
                    return Ok(args);
                }
                Some((offset, other)) => return Err(self.unexpected(other, offset)),
                None => return Err(self.unexpected_end()),
            }
        }
    }

    /// `'\'? ident ( '\' ident )*`. Every `\` must be followed by an identifier.
    fn parse_name(&mut self) -> Result<String, TypeParseError> {
        let start = self.pos;
        if self.peek() == Some('\\') {
            self.pos += 1;
        }
        loop {
            match self.peek_indexed() {
                Some((_, c)) if is_ident_start(c) => self.pos += 1,
                Some((offset, other)) => return Err(self.unexpected(other, offset)),
                None => return Err(self.unexpected_end()),
            }
            while self.peek().is_some_and(|c| is_ident_start(c) || c.is_ascii_digit()) {
                self.pos += 1;
            }
            if self.peek() != Some('\\') {
                break;
            }
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().map(|&(_, c)| c).collect())
    }

    fn enter(&mut self) -> Result<(), TypeParseError> {
        self.depth += 1;
        if self.depth > MAX_TYPE_EXPR_DEPTH {
            return Err(TypeParseError::TooDeep {
                raw: self.raw.to_string(),
            });
        }
        Ok(())
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        match self.peek_indexed() {
            Some((_, c)) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some((offset, other)) => Err(self.unexpected(other, offset)),
            None => Err(self.unexpected_end()),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_indexed(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn unexpected(&self, found: char, offset: usize) -> TypeParseError {
        TypeParseError::Unexpected {
            raw: self.raw.to_string(),
            found,
            offset,
        }
    }

    fn unexpected_end(&self) -> TypeParseError {
        TypeParseError::UnexpectedEnd {
            raw: self.raw.to_string(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// Class names lose their leading `\`; `array` is normalised to lower case.
fn class_name(name: &str) -> String {
    let name = name.strip_prefix('\\').unwrap_or(name);
    if name.eq_ignore_ascii_case(ARRAY_CLASS) {
        return ARRAY_CLASS.to_string();
    }
    name.to_string()
}
