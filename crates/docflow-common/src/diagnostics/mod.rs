//! Issue types for the analyzer.
//!
//! Issue kinds form a closed set: adding a new kind means adding a variant
//! here, which makes every exhaustive `match` over `IssueKind` fail to build
//! until the new kind is handled.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod engine;

// =============================================================================
// Issue Kinds
// =============================================================================

/// Every diagnostic the analyzer can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueKind {
    InvalidDocblock,
    DeprecatedMethod,
    DeprecatedFunction,
    DeprecatedClass,
    DeprecatedProperty,
    InvalidReturnType,
    InvalidPropertyAssignment,
    UntypedParam,
    TooManyArguments,
    TooFewArguments,
    MethodSignatureMismatch,
    MixedArgument,
    MixedOperand,
    MixedAssignment,
    UndefinedClass,
    UndefinedFunction,
    InvalidArgument,
    PossiblyNullArgument,
    PossiblyNullReference,
}

impl IssueKind {
    pub const ALL: [IssueKind; 19] = [
        IssueKind::InvalidDocblock,
        IssueKind::DeprecatedMethod,
        IssueKind::DeprecatedFunction,
        IssueKind::DeprecatedClass,
        IssueKind::DeprecatedProperty,
        IssueKind::InvalidReturnType,
        IssueKind::InvalidPropertyAssignment,
        IssueKind::UntypedParam,
        IssueKind::TooManyArguments,
        IssueKind::TooFewArguments,
        IssueKind::MethodSignatureMismatch,
        IssueKind::MixedArgument,
        IssueKind::MixedOperand,
        IssueKind::MixedAssignment,
        IssueKind::UndefinedClass,
        IssueKind::UndefinedFunction,
        IssueKind::InvalidArgument,
        IssueKind::PossiblyNullArgument,
        IssueKind::PossiblyNullReference,
    ];

    /// The name used in output and in `@psalm-suppress` tags.
    pub const fn as_str(self) -> &'static str {
        match self {
            IssueKind::InvalidDocblock => "InvalidDocblock",
            IssueKind::DeprecatedMethod => "DeprecatedMethod",
            IssueKind::DeprecatedFunction => "DeprecatedFunction",
            IssueKind::DeprecatedClass => "DeprecatedClass",
            IssueKind::DeprecatedProperty => "DeprecatedProperty",
            IssueKind::InvalidReturnType => "InvalidReturnType",
            IssueKind::InvalidPropertyAssignment => "InvalidPropertyAssignment",
            IssueKind::UntypedParam => "UntypedParam",
            IssueKind::TooManyArguments => "TooManyArguments",
            IssueKind::TooFewArguments => "TooFewArguments",
            IssueKind::MethodSignatureMismatch => "MethodSignatureMismatch",
            IssueKind::MixedArgument => "MixedArgument",
            IssueKind::MixedOperand => "MixedOperand",
            IssueKind::MixedAssignment => "MixedAssignment",
            IssueKind::UndefinedClass => "UndefinedClass",
            IssueKind::UndefinedFunction => "UndefinedFunction",
            IssueKind::InvalidArgument => "InvalidArgument",
            IssueKind::PossiblyNullArgument => "PossiblyNullArgument",
            IssueKind::PossiblyNullReference => "PossiblyNullReference",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a suppression tag or config key names no known issue kind.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown issue kind `{0}`")]
pub struct UnknownIssueKind(pub String);

impl FromStr for IssueKind {
    type Err = UnknownIssueKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownIssueKind(s.to_string()))
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Effective severity of an issue kind for one analysis run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Suppressed,
}

// =============================================================================
// Issue
// =============================================================================

/// A single diagnostic. Immutable once recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub severity: Severity,
}

impl Issue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}:{} - {}",
            self.kind, self.file, self.line, self.message
        )
    }
}
