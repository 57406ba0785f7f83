//! Hard failures of a unit traversal.
//!
//! Everything the analyzer can say about the analyzed code is an `Issue`.
//! A `CheckError` means the syntax tree itself is unusable; the unit is
//! abandoned and none of its issues are reported.

use crate::ast::NodeIndex;
use docflow_solver::TypeParseError;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CheckError {
    #[error("tree has no root node")]
    MissingRoot,
    #[error("node {0:?} is referenced but missing from the tree")]
    MissingNode(NodeIndex),
    #[error("node {index:?} is not a valid {expected}")]
    UnexpectedNode {
        index: NodeIndex,
        expected: &'static str,
    },
    #[error("node {index:?} carries an unparsable type hint: {source}")]
    InvalidTypeHint {
        index: NodeIndex,
        #[source]
        source: TypeParseError,
    },
}
