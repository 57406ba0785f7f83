//! Expression typing.
//!
//! `infer_expression` computes the type of an expression node against the
//! current scope, applying the expression's effects (assignments, reference
//! links, calls) to it along the way.

use crate::ast::{ArrayItem, BinaryOp, CastKind, Literal, NodeIndex, NodeKind, UnaryOp};
use crate::context::ScopeContext;
use crate::error::CheckError;
use crate::state::CheckerState;
use docflow_common::IssueKind;
use docflow_common::limits::MAX_EXPR_CHECK_DEPTH;
use docflow_solver::{TypeExpr, TypeTest, union, union_all};
use tracing::{trace, warn};

fn literal_type(literal: &Literal) -> TypeExpr {
    match literal {
        Literal::Int(_) => TypeExpr::INT,
        Literal::Float(_) => TypeExpr::FLOAT,
        Literal::String(_) => TypeExpr::STRING,
        Literal::Bool(false) => TypeExpr::FALSE,
        Literal::Bool(true) => TypeExpr::BOOL,
        Literal::Null => TypeExpr::NULL,
    }
}

fn arithmetic_type(op: BinaryOp, left: &TypeExpr, right: &TypeExpr) -> TypeExpr {
    let int_or_float = || union(&TypeExpr::INT, &TypeExpr::FLOAT);
    if op == BinaryOp::Mod {
        return TypeExpr::INT;
    }
    match (left, right) {
        (l, r) if *l == TypeExpr::INT && *r == TypeExpr::INT => {
            if op == BinaryOp::Div {
                int_or_float()
            } else {
                TypeExpr::INT
            }
        }
        (l, r)
            if [l, r]
                .iter()
                .all(|ty| **ty == TypeExpr::INT || **ty == TypeExpr::FLOAT) =>
        {
            TypeExpr::FLOAT
        }
        _ => int_or_float(),
    }
}

impl<'a> CheckerState<'a> {
    /// Type of the expression at `index`.
    pub(crate) fn infer_expression(&mut self, index: NodeIndex) -> Result<TypeExpr, CheckError> {
        if self.expr_depth >= MAX_EXPR_CHECK_DEPTH {
            warn!(?index, "expression nesting too deep, treating as mixed");
            return Ok(TypeExpr::MIXED);
        }
        self.expr_depth += 1;
        let result = self.compute_expression_type(index);
        self.expr_depth -= 1;
        result
    }

    fn compute_expression_type(&mut self, index: NodeIndex) -> Result<TypeExpr, CheckError> {
        let node = self.node(index)?;
        let line = node.line;
        match &node.kind {
            NodeKind::Variable { name } => Ok(self.variable_type(name)),
            NodeKind::Literal(literal) => Ok(literal_type(literal)),
            NodeKind::ArrayLiteral { items } => self.array_literal_type(items),
            NodeKind::Assign { target, value } => self.check_assignment(*target, *value, line),
            NodeKind::AssignRef { target, source } => self.check_reference_assignment(*target, *source),
            NodeKind::Binary { op, left, right } => self.binary_type(*op, *left, *right, line),
            NodeKind::Unary { op, operand } => self.unary_type(*op, *operand),
            NodeKind::Cast { to, expr } => self.cast_type(*to, *expr),
            NodeKind::Call { name, args } => self.check_function_call(name, args, line),
            NodeKind::StaticCall {
                class,
                method,
                args,
            } => self.check_static_call(class, method, args, line),
            NodeKind::MethodCall {
                object,
                method,
                args,
            } => self.check_method_call(*object, method, args, line),
            NodeKind::New { class, args } => self.check_new(class, args, line),
            NodeKind::PropertyFetch { object, property } => {
                self.check_property_fetch(*object, property, line)
            }
            NodeKind::ArrayDimFetch { array, dim } => self.dim_fetch_type(*array, *dim),
            NodeKind::ConstFetch { name } => Ok(self.constant_type(name)),
            NodeKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => self.ternary_type(*condition, *then_expr, *else_expr),
            NodeKind::InstanceOf { expr, class } => {
                self.infer_expression(*expr)?;
                self.check_class_exists(class, line);
                Ok(TypeExpr::BOOL)
            }
            NodeKind::Empty { expr } => {
                self.infer_expression(*expr)?;
                Ok(TypeExpr::BOOL)
            }
            NodeKind::Isset { exprs } => {
                for &expr in exprs {
                    self.infer_expression(expr)?;
                }
                Ok(TypeExpr::BOOL)
            }
            NodeKind::Yield { value } => {
                if let Some(value) = value {
                    self.infer_expression(*value)?;
                }
                if let Some(frame) = self.frame.as_mut() {
                    frame.has_yield = true;
                }
                Ok(TypeExpr::MIXED)
            }
            NodeKind::SourceFile { .. }
            | NodeKind::Function(_)
            | NodeKind::Class(_)
            | NodeKind::Property(_)
            | NodeKind::ExpressionStatement { .. }
            | NodeKind::Echo { .. }
            | NodeKind::Return { .. }
            | NodeKind::If { .. }
            | NodeKind::While { .. }
            | NodeKind::Foreach { .. }
            | NodeKind::Nop => Err(CheckError::UnexpectedNode {
                index,
                expected: "expression",
            }),
        }
    }

    fn variable_type(&self, name: &str) -> TypeExpr {
        if name == "$this" {
            return match self.current_class() {
                Some(class) => TypeExpr::class(class.name.clone()),
                None => TypeExpr::MIXED,
            };
        }
        self.ctx.get(name).cloned().unwrap_or(TypeExpr::MIXED)
    }

    fn constant_type(&self, name: &str) -> TypeExpr {
        match name.to_ascii_lowercase().as_str() {
            "true" => TypeExpr::BOOL,
            "false" => TypeExpr::FALSE,
            "null" => TypeExpr::NULL,
            _ => self
                .constants
                .get(name.strip_prefix('\\').unwrap_or(name))
                .cloned()
                .unwrap_or(TypeExpr::MIXED),
        }
    }

    fn array_literal_type(&mut self, items: &[ArrayItem]) -> Result<TypeExpr, CheckError> {
        if items.is_empty() {
            return Ok(TypeExpr::array());
        }
        let mut keys = Vec::with_capacity(items.len());
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            keys.push(match item.key {
                Some(key) => self.infer_expression(key)?,
                None => TypeExpr::INT,
            });
            values.push(self.infer_expression(item.value)?);
        }
        Ok(TypeExpr::keyed_array(union_all(keys), union_all(values)))
    }

    // =========================================================================
    // Assignments
    // =========================================================================

    fn check_assignment(&mut self, target: NodeIndex, value: NodeIndex, line: u32) -> Result<TypeExpr, CheckError> {
        match &self.node(target)?.kind {
            NodeKind::Variable { name } => self.check_variable_assignment(name, value, None, line),
            NodeKind::PropertyFetch { object, property } => {
                let ty = self.infer_expression(value)?;
                self.check_property_assignment(*object, property, &ty, line)?;
                Ok(ty)
            }
            NodeKind::ArrayDimFetch { array, dim } => {
                let ty = self.infer_expression(value)?;
                self.check_dim_assignment(*array, *dim, &ty)?;
                Ok(ty)
            }
            _ => self.infer_expression(value),
        }
    }

    /// `$name = value`, with the `@var` type documenting it, if any.
    pub(crate) fn check_variable_assignment(
        &mut self,
        name: &str,
        value: NodeIndex,
        declared: Option<TypeExpr>,
        line: u32,
    ) -> Result<TypeExpr, CheckError> {
        let inferred = self.infer_expression(value)?;
        let ty = match declared {
            Some(declared) => {
                let compatible = inferred.is_mixed()
                    || self.is_subtype(&inferred, &declared)
                    || self.is_subtype(&declared, &inferred);
                if !compatible {
                    self.record(
                        IssueKind::InvalidDocblock,
                        format!(
                            "Docblock type '{declared}' for {name} is incompatible with inferred type '{inferred}'"
                        ),
                        line,
                    );
                }
                declared
            }
            None => {
                if inferred.is_mixed() {
                    self.record(
                        IssueKind::MixedAssignment,
                        format!("Cannot assign {name} to a mixed type"),
                        line,
                    );
                }
                inferred
            }
        };
        trace!(%name, %ty, "assign");
        self.release_param(name);
        self.ctx.assign(name, ty.clone());
        Ok(ty)
    }

    /// `$target =& $source`.
    fn check_reference_assignment(&mut self, target: NodeIndex, source: NodeIndex) -> Result<TypeExpr, CheckError> {
        let NodeKind::Variable { name: target } = &self.node(target)?.kind else {
            return self.infer_expression(source);
        };
        let NodeKind::Variable { name: source_name } = &self.node(source)?.kind else {
            let ty = self.infer_expression(source)?;
            self.release_param(target);
            self.ctx.assign(target, ty.clone());
            return Ok(ty);
        };

        // Referencing an unset variable creates it as null.
        if !self.ctx.has(source_name) {
            self.ctx.assign(source_name, TypeExpr::NULL);
        }
        let ty = self.variable_type(source_name);
        self.release_param(target);
        self.ctx.assign(target, ty.clone());
        self.ctx.link_references(target, source_name);
        Ok(ty)
    }

    /// `$array[dim] = value` widens the array type of a variable.
    fn check_dim_assignment(
        &mut self,
        array: NodeIndex,
        dim: Option<NodeIndex>,
        value: &TypeExpr,
    ) -> Result<(), CheckError> {
        let key = match dim {
            Some(dim) => self.infer_expression(dim)?,
            None => TypeExpr::INT,
        };
        let NodeKind::Variable { name } = &self.node(array)?.kind else {
            self.infer_expression(array)?;
            return Ok(());
        };

        let updated = match self.ctx.get(name) {
            // A bare `array` carries no element information worth keeping.
            Some(current) if current.is_array() && *current != TypeExpr::array() => {
                let key = match current.array_key_type() {
                    Some(existing) => union(&existing, &key),
                    None => key,
                };
                let value_type = current.array_value_type().unwrap_or(TypeExpr::MIXED);
                TypeExpr::keyed_array(key, union(&value_type, value))
            }
            _ => TypeExpr::keyed_array(key, value.clone()),
        };
        self.release_param(name);
        self.ctx.assign(name, updated);
        Ok(())
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn binary_type(
        &mut self,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
        line: u32,
    ) -> Result<TypeExpr, CheckError> {
        match op {
            BinaryOp::And | BinaryOp::Or => return self.logical_type(op, left, right),
            BinaryOp::Coalesce => return self.coalesce_type(left, right),
            _ => {}
        }

        let left_type = self.infer_expression(left)?;
        let right_type = self.infer_expression(right)?;
        let ty = match op {
            BinaryOp::Concat => {
                self.check_string_operand(left, &left_type, "Left", line)?;
                self.check_string_operand(right, &right_type, "Right", line)?;
                TypeExpr::STRING
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                for (side, ty) in [("Left", &left_type), ("Right", &right_type)] {
                    if ty.is_mixed() {
                        self.record(
                            IssueKind::MixedOperand,
                            format!("{side} operand cannot be mixed"),
                            line,
                        );
                    }
                }
                arithmetic_type(op, &left_type, &right_type)
            }
            BinaryOp::Spaceship => TypeExpr::INT,
            _ => TypeExpr::BOOL,
        };
        Ok(ty)
    }

    fn check_string_operand(
        &mut self,
        operand: NodeIndex,
        ty: &TypeExpr,
        side: &str,
        line: u32,
    ) -> Result<(), CheckError> {
        if ty.is_mixed() {
            self.record(
                IssueKind::MixedOperand,
                format!("{side} operand cannot be mixed"),
                line,
            );
        }
        self.record_argument_usage(operand, &TypeExpr::STRING)
    }

    /// `&&` / `||`: the right side is typed under the left side's narrowing.
    fn logical_type(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> Result<TypeExpr, CheckError> {
        self.infer_expression(left)?;
        let pre = self.ctx.clone();
        let narrowed = self.narrow_condition(left, pre.fork(), op == BinaryOp::And)?;
        let (_, after_right) = self.infer_in(narrowed, right)?;
        self.ctx = ScopeContext::join(&pre, vec![pre.clone(), after_right]);
        Ok(TypeExpr::BOOL)
    }

    /// `left ?? right`: `left` without null when it may be missing or null.
    fn coalesce_type(&mut self, left: NodeIndex, right: NodeIndex) -> Result<TypeExpr, CheckError> {
        let left_node = self.node(left)?;
        let (left_type, may_be_missing) = match &left_node.kind {
            NodeKind::Variable { name } if name != "$this" => match self.ctx.get(name) {
                Some(ty) => (ty.clone(), self.ctx.possibly_undefined.contains(name)),
                None => (TypeExpr::NULL, true),
            },
            NodeKind::ArrayDimFetch { .. } | NodeKind::PropertyFetch { .. } => {
                (self.infer_expression(left)?, true)
            }
            _ => (self.infer_expression(left)?, false),
        };
        let right_type = self.infer_expression(right)?;

        if !may_be_missing && !left_type.is_nullable() {
            return Ok(left_type);
        }
        Ok(union(&left_type.without_null(), &right_type))
    }

    fn unary_type(&mut self, op: UnaryOp, operand: NodeIndex) -> Result<TypeExpr, CheckError> {
        let ty = self.infer_expression(operand)?;
        Ok(match op {
            UnaryOp::Not => TypeExpr::BOOL,
            UnaryOp::Minus | UnaryOp::Plus => {
                if ty == TypeExpr::INT || ty == TypeExpr::FLOAT {
                    ty
                } else {
                    union(&TypeExpr::INT, &TypeExpr::FLOAT)
                }
            }
        })
    }

    fn cast_type(&mut self, to: CastKind, expr: NodeIndex) -> Result<TypeExpr, CheckError> {
        let inner = self.infer_expression(expr)?;
        Ok(match to {
            CastKind::Int => TypeExpr::INT,
            CastKind::Float => TypeExpr::FLOAT,
            CastKind::String => TypeExpr::STRING,
            CastKind::Bool => TypeExpr::BOOL,
            CastKind::Array if inner.is_array() => inner,
            CastKind::Array => TypeExpr::array(),
            CastKind::Object if inner.is_object_class() => inner,
            CastKind::Object => TypeExpr::OBJECT,
        })
    }

    // =========================================================================
    // Access and branching expressions
    // =========================================================================

    fn dim_fetch_type(&mut self, array: NodeIndex, dim: Option<NodeIndex>) -> Result<TypeExpr, CheckError> {
        let container = self.infer_expression(array)?;
        if let Some(dim) = dim {
            self.infer_expression(dim)?;
        }
        if let Some(value) = container.array_value_type() {
            return Ok(value);
        }
        if container == TypeExpr::STRING {
            return Ok(TypeExpr::STRING);
        }
        Ok(TypeExpr::MIXED)
    }

    fn ternary_type(
        &mut self,
        condition: NodeIndex,
        then_expr: Option<NodeIndex>,
        else_expr: NodeIndex,
    ) -> Result<TypeExpr, CheckError> {
        let condition_type = self.infer_expression(condition)?;
        let pre = self.ctx.clone();
        let when_true = self.narrow_condition(condition, pre.fork(), true)?;
        let when_false = self.narrow_condition(condition, pre.fork(), false)?;

        let (then_type, then_ctx) = match then_expr {
            Some(expr) => self.infer_in(when_true, expr)?,
            None => {
                let truthy = self.narrowing().narrow(&condition_type, &TypeTest::Truthy);
                (truthy.when_true, when_true)
            }
        };
        let (else_type, else_ctx) = self.infer_in(when_false, else_expr)?;

        self.ctx = ScopeContext::join(&pre, vec![then_ctx, else_ctx]);
        Ok(union(&then_type, &else_type))
    }

    /// Type `expr` within `ctx`, returning the type and the resulting scope.
    fn infer_in(&mut self, ctx: ScopeContext, expr: NodeIndex) -> Result<(TypeExpr, ScopeContext), CheckError> {
        let outer = std::mem::replace(&mut self.ctx, ctx);
        let result = self.infer_expression(expr);
        let inner = std::mem::replace(&mut self.ctx, outer);
        result.map(|ty| (ty, inner))
    }

    /// Report `UndefinedClass` for a class reference that resolves to nothing.
    pub(crate) fn check_class_exists(&mut self, class: &str, line: u32) -> bool {
        let Some(name) = self.resolve_class_name(class) else {
            return false;
        };
        if self.registry.resolve_class(&name).is_some() {
            return true;
        }
        self.record(
            IssueKind::UndefinedClass,
            format!("Class {name} does not exist"),
            line,
        );
        false
    }
}
