//! Statement dispatch.
//!
//! `StatementChecker` only decides which handler a statement goes to. The
//! handlers are provided through `StatementCheckCallbacks`, implemented by
//! `CheckerState` in `state_checking.rs`.

use crate::ast::{Node, NodeIndex, NodeKind};
use crate::error::CheckError;
use docflow_common::limits::MAX_STATEMENT_DEPTH;
use tracing::warn;

/// Statement handlers the dispatcher delegates to.
pub trait StatementCheckCallbacks {
    fn statement_node(&self, index: NodeIndex) -> Result<&Node, CheckError>;

    /// Current statement nesting, for the depth guard.
    fn statement_depth(&mut self) -> &mut u32;

    fn check_expression_statement(&mut self, node: &Node, expr: NodeIndex) -> Result<(), CheckError>;
    fn check_echo(&mut self, exprs: &[NodeIndex]) -> Result<(), CheckError>;
    fn check_return(&mut self, expr: Option<NodeIndex>) -> Result<(), CheckError>;
    fn check_if(
        &mut self,
        condition: NodeIndex,
        then_branch: &[NodeIndex],
        else_branch: &[NodeIndex],
    ) -> Result<(), CheckError>;
    fn check_while(&mut self, condition: NodeIndex, body: &[NodeIndex]) -> Result<(), CheckError>;
    fn check_foreach(
        &mut self,
        subject: NodeIndex,
        key_var: Option<&str>,
        value_var: &str,
        body: &[NodeIndex],
    ) -> Result<(), CheckError>;
    fn check_doc_only_statement(&mut self, node: &Node) -> Result<(), CheckError>;
    fn check_function_declaration(&mut self, index: NodeIndex) -> Result<(), CheckError>;
    fn check_class_declaration(&mut self, index: NodeIndex) -> Result<(), CheckError>;
}

pub struct StatementChecker;

impl StatementChecker {
    /// Check one statement.
    pub fn check<S: StatementCheckCallbacks>(index: NodeIndex, state: &mut S) -> Result<(), CheckError> {
        if *state.statement_depth() >= MAX_STATEMENT_DEPTH {
            warn!(?index, "statement nesting too deep, skipping");
            return Ok(());
        }
        *state.statement_depth() += 1;
        let result = Self::dispatch(index, state);
        *state.statement_depth() -= 1;
        result
    }

    /// Check statements in order.
    pub fn check_block<S: StatementCheckCallbacks>(
        statements: &[NodeIndex],
        state: &mut S,
    ) -> Result<(), CheckError> {
        for &statement in statements {
            Self::check(statement, state)?;
        }
        Ok(())
    }

    fn dispatch<S: StatementCheckCallbacks>(index: NodeIndex, state: &mut S) -> Result<(), CheckError> {
        // Own the node data before handing out `&mut state`.
        let node = state.statement_node(index)?.clone();

        match &node.kind {
            NodeKind::SourceFile { statements } => Self::check_block(statements, state),
            NodeKind::ExpressionStatement { expr } => state.check_expression_statement(&node, *expr),
            NodeKind::Echo { exprs } => state.check_echo(exprs),
            NodeKind::Return { expr } => state.check_return(*expr),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => state.check_if(*condition, then_branch, else_branch),
            NodeKind::While { condition, body } => state.check_while(*condition, body),
            NodeKind::Foreach {
                subject,
                key_var,
                value_var,
                body,
            } => state.check_foreach(*subject, key_var.as_deref(), value_var, body),
            NodeKind::Nop => state.check_doc_only_statement(&node),
            NodeKind::Function(_) => state.check_function_declaration(index),
            NodeKind::Class(_) => state.check_class_declaration(index),
            NodeKind::Property(_) => Err(CheckError::UnexpectedNode {
                index,
                expected: "statement",
            }),
            // A bare expression in statement position.
            _ => state.check_expression_statement(&node, index),
        }
    }
}
