//! Type algebra for the docflow analyzer.
//!
//! This crate owns everything that can be said about types without looking
//! at a syntax tree:
//!
//! - **`TypeExpr`**: immutable scalar / class / union values
//! - **Parsing**: type-expression strings (`?array<int, string>`, `A|B|null`)
//! - **Rendering**: canonical text, the inverse of parsing
//! - **Unions**: flattening, dedupe and `mixed` absorption
//! - **Subtyping**: `SubtypeChecker` over a pluggable class hierarchy
//! - **Narrowing**: splitting a type by a runtime type test
mod format;
pub mod narrowing;
pub mod parse;
pub mod subtype;
pub mod types;
pub mod utils;

pub use narrowing::{Narrowed, NarrowingContext, TypeTest};
pub use parse::{TypeParseError, parse_type_expr};
pub use subtype::{NoopResolver, SubtypeChecker, TypeResolver, is_subtype};
pub use types::{ScalarKind, TypeExpr};
pub use utils::{union, union_all, union_or_single};

#[cfg(test)]
#[path = "../tests/parse_tests.rs"]
mod parse_tests;
#[cfg(test)]
#[path = "../tests/union_tests.rs"]
mod union_tests;
#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod subtype_tests;
#[cfg(test)]
#[path = "../tests/narrowing_tests.rs"]
mod narrowing_tests;
#[cfg(test)]
#[path = "../tests/property_tests.rs"]
mod property_tests;
