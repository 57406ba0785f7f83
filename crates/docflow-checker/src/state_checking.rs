//! Statement handlers.
//!
//! `CheckerState`'s implementation of `StatementCheckCallbacks`: scope
//! updates for expression statements and inline `@var` comments, branch
//! forking and joining for `if`, and the two-pass loop analysis.

use crate::ast::{Node, NodeIndex, NodeKind};
use crate::context::ScopeContext;
use crate::docblock::DocblockSite;
use crate::error::CheckError;
use crate::state::CheckerState;
use crate::statements::{StatementCheckCallbacks, StatementChecker};
use docflow_common::IssueKind;
use docflow_solver::TypeExpr;
use tracing::{Level, span, trace};

/// How a loop body pass starts.
#[derive(Clone, Copy)]
enum LoopEntry<'n> {
    While { condition: NodeIndex },
    Foreach {
        key: Option<&'n str>,
        value: &'n str,
        key_type: &'n TypeExpr,
        value_type: &'n TypeExpr,
    },
}

impl<'a> StatementCheckCallbacks for CheckerState<'a> {
    fn statement_node(&self, index: NodeIndex) -> Result<&Node, CheckError> {
        self.node(index)
    }

    fn statement_depth(&mut self) -> &mut u32 {
        &mut self.stmt_depth
    }

    fn check_expression_statement(&mut self, node: &Node, expr: NodeIndex) -> Result<(), CheckError> {
        if node.docblock().is_none() {
            self.infer_expression(expr)?;
            return Ok(());
        }

        let docblock = self.enter_docblock(node, DocblockSite::Inline);
        let expr_node = self.node(expr)?;

        let mut assigned: Option<&str> = None;
        let result = match &expr_node.kind {
            NodeKind::Assign { target, value } => match &self.node(*target)?.kind {
                NodeKind::Variable { name } => {
                    assigned = Some(name.as_str());
                    let declared = docblock
                        .named_vars()
                        .find(|(var, _)| *var == name.as_str())
                        .map(|(_, ty)| ty)
                        .or(docblock.var_type())
                        .cloned();
                    self.check_variable_assignment(name, *value, declared, expr_node.line)
                        .map(drop)
                }
                _ => self.infer_expression(expr).map(drop),
            },
            _ => self.infer_expression(expr).map(drop),
        };

        // `@var` tags naming other variables act like a standalone comment.
        for (name, ty) in docblock.named_vars() {
            if Some(name) != assigned {
                self.override_variable(name, ty.clone());
            }
        }
        self.leave_docblock();
        result
    }

    fn check_echo(&mut self, exprs: &[NodeIndex]) -> Result<(), CheckError> {
        for (position, &expr) in exprs.iter().enumerate() {
            let ty = self.infer_expression(expr)?;
            if ty.is_mixed() {
                let line = self.node(expr)?.line;
                self.record(
                    IssueKind::MixedArgument,
                    format!(
                        "Argument {} of echo cannot be mixed, expecting string",
                        position + 1
                    ),
                    line,
                );
            }
            self.record_argument_usage(expr, &TypeExpr::STRING)?;
        }
        Ok(())
    }

    fn check_return(&mut self, expr: Option<NodeIndex>) -> Result<(), CheckError> {
        let ty = expr.map(|expr| self.infer_expression(expr)).transpose()?;
        if let Some(frame) = self.frame.as_mut() {
            match ty {
                Some(ty) => frame.return_types.push(ty),
                None => frame.has_bare_return = true,
            }
        }
        self.ctx.exited = true;
        Ok(())
    }

    fn check_if(
        &mut self,
        condition: NodeIndex,
        then_branch: &[NodeIndex],
        else_branch: &[NodeIndex],
    ) -> Result<(), CheckError> {
        self.infer_expression(condition)?;
        let pre = self.ctx.clone();

        let when_true = self.narrow_condition(condition, pre.fork(), true)?;
        let when_false = self.narrow_condition(condition, pre.fork(), false)?;

        let then_out = self.check_branch(when_true, &pre, then_branch)?;
        let else_out = self.check_branch(when_false, &pre, else_branch)?;

        self.ctx = ScopeContext::join(&pre, vec![then_out, else_out]);
        Ok(())
    }

    fn check_while(&mut self, condition: NodeIndex, body: &[NodeIndex]) -> Result<(), CheckError> {
        self.infer_expression(condition)?;
        let after = self.check_loop(LoopEntry::While { condition }, body)?;
        self.ctx = self.narrow_condition(condition, after, false)?;
        Ok(())
    }

    fn check_foreach(
        &mut self,
        subject: NodeIndex,
        key_var: Option<&str>,
        value_var: &str,
        body: &[NodeIndex],
    ) -> Result<(), CheckError> {
        let subject_type = self.infer_expression(subject)?;
        let value_type = subject_type.array_value_type().unwrap_or(TypeExpr::MIXED);
        let key_type = subject_type.array_key_type().unwrap_or(TypeExpr::MIXED);
        let entry = LoopEntry::Foreach {
            key: key_var,
            value: value_var,
            key_type: &key_type,
            value_type: &value_type,
        };
        self.ctx = self.check_loop(entry, body)?;
        Ok(())
    }

    fn check_doc_only_statement(&mut self, node: &Node) -> Result<(), CheckError> {
        let docblock = self.enter_docblock(node, DocblockSite::Inline);
        for (name, ty) in docblock.named_vars() {
            self.override_variable(name, ty.clone());
        }
        self.leave_docblock();
        Ok(())
    }

    fn check_function_declaration(&mut self, index: NodeIndex) -> Result<(), CheckError> {
        // A function declared inside a method body is not a member.
        let classes = std::mem::take(&mut self.class_stack);
        let result = self.check_function_like(index);
        self.class_stack = classes;
        result
    }

    fn check_class_declaration(&mut self, index: NodeIndex) -> Result<(), CheckError> {
        self.check_class_like(index).map(drop)
    }
}

impl<'a> CheckerState<'a> {
    /// Analyse `statements` starting from `ctx` and return the resulting scope.
    fn check_branch(
        &mut self,
        ctx: ScopeContext,
        pre: &ScopeContext,
        statements: &[NodeIndex],
    ) -> Result<ScopeContext, CheckError> {
        if let Some(&first) = statements.first()
            && let Some(name) = ctx.newly_never(pre).next()
        {
            let line = self.node(first)?.line;
            trace!(%name, line, "branch is unreachable");
            self.unreachable_lines.push(line);
        }

        let outer = std::mem::replace(&mut self.ctx, ctx);
        let result = StatementChecker::check_block(statements, self);
        let branch = std::mem::replace(&mut self.ctx, outer);
        result.map(|()| branch)
    }

    /// Two body passes: a muted one from the pre-loop scope, then a
    /// recording one from pre joined with the first pass. Returns pre joined
    /// with the second pass.
    fn check_loop(&mut self, entry: LoopEntry<'_>, body: &[NodeIndex]) -> Result<ScopeContext, CheckError> {
        let _span = span!(Level::TRACE, "loop", statements = body.len()).entered();
        let pre = self.ctx.clone();

        self.diagnostics.mute();
        let first = self.loop_pass(entry, &pre, body);
        self.diagnostics.unmute();
        let widened = ScopeContext::join_loop(&pre, first?);

        let second = self.loop_pass(entry, &widened, body)?;
        Ok(ScopeContext::join_loop(&pre, second))
    }

    fn loop_pass(
        &mut self,
        entry: LoopEntry<'_>,
        start: &ScopeContext,
        body: &[NodeIndex],
    ) -> Result<ScopeContext, CheckError> {
        let ctx = match entry {
            LoopEntry::While { condition } => self.narrow_condition(condition, start.fork(), true)?,
            LoopEntry::Foreach {
                key,
                value,
                key_type,
                value_type,
            } => {
                let mut ctx = start.fork();
                if let Some(key) = key {
                    self.release_param(key);
                    ctx.assign(key, key_type.clone());
                }
                self.release_param(value);
                ctx.assign(value, value_type.clone());
                ctx
            }
        };
        self.check_branch(ctx, start, body)
    }

    /// Apply a standalone `@var T $name`.
    fn override_variable(&mut self, name: &str, ty: TypeExpr) {
        trace!(%name, %ty, "@var override");
        self.release_param(name);
        self.ctx.assign(name, ty);
    }
}
