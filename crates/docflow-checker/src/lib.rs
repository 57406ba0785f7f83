//! Flow-sensitive docblock and type checker.
//!
//! This crate walks a parsed unit statement by statement, tracking variable
//! types through branches and loops, and reports issues where docblock
//! annotations, native hints and observed usage disagree.
//!
//! - `ast`: the read-only syntax tree the checker consumes
//! - `docblock`: annotation parsing
//! - `registry` / `signature_collector`: declaration signatures shared
//!   across units
//! - `state` and its `impl` blocks: the per-unit traversal
//! - `program`: the multi-unit driver

pub mod ast;
pub mod builtins;
pub mod context;
pub mod docblock;
pub mod error;
pub mod program;
pub mod registry;
pub mod signature_collector;
pub mod state;
pub mod statements;

// CheckerState impl blocks
mod call_checker;
mod class_checker;
mod declarations;
mod expr;
mod flow_narrowing;
mod param_inference;
mod property_checker;
mod state_checking;

pub use ast::{
    ArrayItem, BinaryOp, CastKind, ClassDecl, ClassRef, DocComment, FunctionDecl, Literal, Node,
    NodeArena, NodeIndex, NodeKind, ParamDecl, PropertyDecl, SyntaxTree, UnaryOp,
};
pub use context::ScopeContext;
pub use docblock::{
    AnnotationTag, Docblock, DocblockIssue, DocblockSite, ParsedDocblock, TagKind, parse_docblock,
};
pub use error::CheckError;
pub use program::{
    AnalysisSummary, AnalysisUnit, UnitFailure, analyze, check_units, collect_signatures,
};
pub use registry::{
    ClassSignature, FunctionSignature, InMemoryRegistry, ParamSignature, PropertyLookup,
    PropertySignature, RegistryResolver, SignatureRegistry,
};
pub use signature_collector::{SignatureCollector, anonymous_class_name};
pub use state::{CheckerState, UnitReport, check_unit};
pub use statements::{StatementCheckCallbacks, StatementChecker};

#[cfg(test)]
#[path = "tests/docblock_tests.rs"]
mod docblock_tests;
#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod context_tests;
