//! Canonical rendering of types.
//!
//! The rendered form is what diagnostics print and what tests assert on.
//! Parsing a rendered type yields the same value.

use crate::types::TypeExpr;
use std::fmt;

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Scalar(kind) => f.write_str(kind.keyword()),
            TypeExpr::Class { name, args } => {
                f.write_str(name)?;
                if args.is_empty() {
                    return Ok(());
                }
                f.write_str("<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            TypeExpr::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}

impl TypeExpr {
    /// Canonical text form.
    pub fn render(&self) -> String {
        self.to_string()
    }
}
