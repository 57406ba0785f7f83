//! Condition narrowing.
//!
//! `narrow_condition` maps a condition expression and a scope to the scope
//! that holds when the condition evaluates to `when`. The condition itself
//! must already have been typed in the incoming scope; this pass reports
//! nothing and only rebinds the variables the condition tests.

use crate::ast::{BinaryOp, Literal, NodeIndex, NodeKind, UnaryOp};
use crate::context::ScopeContext;
use crate::error::CheckError;
use crate::state::CheckerState;
use docflow_solver::TypeTest;
use tracing::trace;

/// Result of comparing an expression with a literal.
enum LiteralSide {
    False,
    Null,
}

impl<'a> CheckerState<'a> {
    pub(crate) fn narrow_condition(
        &mut self,
        condition: NodeIndex,
        ctx: ScopeContext,
        when: bool,
    ) -> Result<ScopeContext, CheckError> {
        let node = self.node(condition)?;
        match &node.kind {
            NodeKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.narrow_condition(*operand, ctx, !when),

            NodeKind::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => self.narrow_conjunction(*left, *right, ctx, when),
            // `a || b` is `!(!a && !b)`.
            NodeKind::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => self.narrow_disjunction(*left, *right, ctx, when),

            NodeKind::Binary {
                op: op @ (BinaryOp::Identical | BinaryOp::NotIdentical),
                left,
                right,
            } => {
                let when = if *op == BinaryOp::NotIdentical { !when } else { when };
                self.narrow_identity(*left, *right, ctx, when, false)
            }
            NodeKind::Binary {
                op: op @ (BinaryOp::Equal | BinaryOp::NotEqual),
                left,
                right,
            } => {
                let when = if *op == BinaryOp::NotEqual { !when } else { when };
                self.narrow_identity(*left, *right, ctx, when, true)
            }

            NodeKind::Call { name, args } => {
                let (Some(test), [arg]) = (TypeTest::from_function_name(name), args.as_slice()) else {
                    return Ok(ctx);
                };
                match self.narrowable_name(*arg)? {
                    Some(var) => Ok(self.narrow_variable(ctx, &var, &test, when)),
                    None => Ok(ctx),
                }
            }

            NodeKind::InstanceOf { expr, class } => {
                let (Some(var), Some(class)) = (self.narrowable_name(*expr)?, self.resolve_class_name(class)) else {
                    return Ok(ctx);
                };
                Ok(self.narrow_variable(ctx, &var, &TypeTest::InstanceOf(class), when))
            }

            NodeKind::Empty { expr } => match self.narrowable_name(*expr)? {
                Some(var) => Ok(self.narrow_variable(ctx, &var, &TypeTest::Truthy, !when)),
                None => Ok(ctx),
            },

            NodeKind::Isset { exprs } => self.narrow_isset(exprs, ctx, when),

            NodeKind::Variable { .. } | NodeKind::Assign { .. } => match self.narrowable_name(condition)? {
                Some(var) => Ok(self.narrow_variable(ctx, &var, &TypeTest::Truthy, when)),
                None => Ok(ctx),
            },

            _ => Ok(ctx),
        }
    }

    fn narrow_conjunction(
        &mut self,
        left: NodeIndex,
        right: NodeIndex,
        ctx: ScopeContext,
        when: bool,
    ) -> Result<ScopeContext, CheckError> {
        let left_true = self.narrow_condition(left, ctx.fork(), true)?;
        if when {
            return self.narrow_condition(right, left_true, true);
        }
        let left_false = self.narrow_condition(left, ctx.fork(), false)?;
        let right_false = self.narrow_condition(right, left_true, false)?;
        Ok(ScopeContext::join(&ctx, vec![left_false, right_false]))
    }

    fn narrow_disjunction(
        &mut self,
        left: NodeIndex,
        right: NodeIndex,
        ctx: ScopeContext,
        when: bool,
    ) -> Result<ScopeContext, CheckError> {
        let left_false = self.narrow_condition(left, ctx.fork(), false)?;
        if !when {
            return self.narrow_condition(right, left_false, false);
        }
        let left_true = self.narrow_condition(left, ctx.fork(), true)?;
        let right_true = self.narrow_condition(right, left_false, true)?;
        Ok(ScopeContext::join(&ctx, vec![left_true, right_true]))
    }

    /// `$x === false`, `null === $x` and friends. A loose comparison
    /// (`$x == null`, `$x == false`) holds for every falsy value.
    fn narrow_identity(
        &mut self,
        left: NodeIndex,
        right: NodeIndex,
        ctx: ScopeContext,
        when: bool,
        loose: bool,
    ) -> Result<ScopeContext, CheckError> {
        let (subject, side) = match (self.literal_side(left)?, self.literal_side(right)?) {
            (None, Some(side)) => (left, side),
            (Some(side), None) => (right, side),
            _ => return Ok(ctx),
        };
        let Some(var) = self.narrowable_name(subject)? else {
            return Ok(ctx);
        };
        if loose {
            return Ok(self.narrow_variable(ctx, &var, &TypeTest::Truthy, !when));
        }
        let test = match side {
            LiteralSide::False => TypeTest::IdenticalFalse,
            LiteralSide::Null => TypeTest::IdenticalNull,
        };
        Ok(self.narrow_variable(ctx, &var, &test, when))
    }

    fn literal_side(&self, index: NodeIndex) -> Result<Option<LiteralSide>, CheckError> {
        Ok(match &self.node(index)?.kind {
            NodeKind::Literal(Literal::Bool(false)) => Some(LiteralSide::False),
            NodeKind::Literal(Literal::Null) => Some(LiteralSide::Null),
            NodeKind::ConstFetch { name } if name.eq_ignore_ascii_case("false") => Some(LiteralSide::False),
            NodeKind::ConstFetch { name } if name.eq_ignore_ascii_case("null") => Some(LiteralSide::Null),
            _ => None,
        })
    }

    /// `isset($a, $b)` holds when every operand is set and non-null; its
    /// negation only says something when there is a single operand.
    fn narrow_isset(
        &mut self,
        exprs: &[NodeIndex],
        mut ctx: ScopeContext,
        when: bool,
    ) -> Result<ScopeContext, CheckError> {
        if !when && exprs.len() != 1 {
            return Ok(ctx);
        }
        for &expr in exprs {
            let Some(var) = self.narrowable_name(expr)? else {
                continue;
            };
            ctx = self.narrow_variable(ctx, &var, &TypeTest::IdenticalNull, !when);
            if when {
                ctx.possibly_undefined.remove(&var);
            }
        }
        Ok(ctx)
    }

    /// The variable a condition operand tests, if any. `($a = f())` tests `$a`.
    fn narrowable_name(&self, index: NodeIndex) -> Result<Option<String>, CheckError> {
        Ok(match &self.node(index)?.kind {
            NodeKind::Variable { name } if name != "$this" => Some(name.clone()),
            NodeKind::Assign { target, .. } => match &self.node(*target)?.kind {
                NodeKind::Variable { name } if name != "$this" => Some(name.clone()),
                _ => None,
            },
            _ => None,
        })
    }

    fn narrow_variable(&mut self, mut ctx: ScopeContext, name: &str, test: &TypeTest, when: bool) -> ScopeContext {
        let Some(current) = ctx.get(name).cloned() else {
            return ctx;
        };
        if current.is_mixed()
            && let Some(asserted) = test.assertion()
        {
            self.record_param_assertion(name, asserted);
        }

        let narrowed = self.narrowing().narrow(&current, test);
        let ty = if when { narrowed.when_true } else { narrowed.when_false };
        trace!(%name, ?test, when, %ty, "narrowed");
        ctx.bind(name, ty);
        ctx
    }
}
