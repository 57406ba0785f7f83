//! Call sites: functions, static and instance methods, and `new`.
//!
//! Each call is resolved through the registry, then checked for deprecated
//! targets and for argument count and argument types.

use crate::ast::{ClassRef, Literal, NodeIndex, NodeKind};
use crate::error::CheckError;
use crate::registry::{ClassSignature, FunctionSignature, normalize};
use crate::state::CheckerState;
use docflow_common::IssueKind;
use docflow_solver::{TypeExpr, union_all};
use tracing::trace;

impl<'a> CheckerState<'a> {
    pub(crate) fn check_function_call(
        &mut self,
        name: &str,
        args: &[NodeIndex],
        line: u32,
    ) -> Result<TypeExpr, CheckError> {
        let registry = self.registry;
        let Some(signature) = registry.resolve_function(name) else {
            self.infer_arguments(args)?;
            self.record(
                IssueKind::UndefinedFunction,
                format!("Function {name} does not exist"),
                line,
            );
            return Ok(TypeExpr::MIXED);
        };

        if signature.deprecated {
            self.record(
                IssueKind::DeprecatedFunction,
                format!("The function {} has been marked as deprecated", signature.name),
                line,
            );
        }
        let arg_types = self.check_arguments(signature, &signature.name, args, line)?;

        if normalize(name) == "define" {
            self.record_constant(args, &arg_types)?;
        }
        Ok(signature.call_return_type())
    }

    /// `define("NAME", value)` with a literal name.
    fn record_constant(&mut self, args: &[NodeIndex], arg_types: &[TypeExpr]) -> Result<(), CheckError> {
        let (Some(&name), Some(value)) = (args.first(), arg_types.get(1)) else {
            return Ok(());
        };
        if let NodeKind::Literal(Literal::String(name)) = &self.node(name)?.kind {
            trace!(%name, %value, "constant defined");
            self.constants.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    pub(crate) fn check_static_call(
        &mut self,
        class: &str,
        method: &str,
        args: &[NodeIndex],
        line: u32,
    ) -> Result<TypeExpr, CheckError> {
        let Some(class_sig) = self.resolve_referenced_class(class, line) else {
            self.infer_arguments(args)?;
            return Ok(TypeExpr::MIXED);
        };
        let registry = self.registry;
        let Some((owner, signature)) = registry.resolve_method(&class_sig.name, method) else {
            self.infer_arguments(args)?;
            return Ok(TypeExpr::MIXED);
        };

        self.check_deprecated_method(owner, signature, line);
        let display = format!("{}::{}", owner.name, signature.name);
        self.check_arguments(signature, &display, args, line)?;
        Ok(signature.call_return_type())
    }

    pub(crate) fn check_method_call(
        &mut self,
        object: NodeIndex,
        method: &str,
        args: &[NodeIndex],
        line: u32,
    ) -> Result<TypeExpr, CheckError> {
        let receiver = self.infer_expression(object)?;
        if receiver.is_nullable() && !receiver.is_null() {
            self.record(
                IssueKind::PossiblyNullReference,
                format!("Cannot call method {method} on possibly null value"),
                line,
            );
        }

        let registry = self.registry;
        let receiver = receiver.without_null();
        let resolved: Vec<(&ClassSignature, &FunctionSignature)> = receiver
            .members()
            .iter()
            .filter_map(TypeExpr::class_name)
            .filter_map(|class| registry.resolve_method(class, method))
            .collect();

        let Some(&(owner, signature)) = resolved.first() else {
            self.infer_arguments(args)?;
            return Ok(TypeExpr::MIXED);
        };
        for &(owner, signature) in &resolved {
            self.check_deprecated_method(owner, signature, line);
        }
        let display = format!("{}::{}", owner.name, signature.name);
        self.check_arguments(signature, &display, args, line)?;

        Ok(union_all(
            resolved
                .iter()
                .map(|(_, signature)| signature.call_return_type()),
        ))
    }

    pub(crate) fn check_new(
        &mut self,
        class: &ClassRef,
        args: &[NodeIndex],
        line: u32,
    ) -> Result<TypeExpr, CheckError> {
        let name = match class {
            ClassRef::Anonymous(decl) => self.check_class_like(*decl)?,
            ClassRef::Named(class) => {
                let Some(class_sig) = self.resolve_referenced_class(class, line) else {
                    self.infer_arguments(args)?;
                    let name = self.resolve_class_name(class).unwrap_or_else(|| class.clone());
                    return Ok(TypeExpr::class(name));
                };
                class_sig.name.clone()
            }
        };

        let registry = self.registry;
        match registry.resolve_method(&name, "__construct") {
            Some((owner, constructor)) => {
                self.check_deprecated_method(owner, constructor, line);
                let display = format!("{}::{}", owner.name, constructor.name);
                self.check_arguments(constructor, &display, args, line)?;
            }
            None => self.infer_arguments(args)?,
        }
        Ok(TypeExpr::class(name))
    }

    /// Resolve a class named at a use site, reporting unknown and
    /// deprecated classes.
    fn resolve_referenced_class(&mut self, class: &str, line: u32) -> Option<&'a ClassSignature> {
        let name = self.resolve_class_name(class)?;
        let registry = self.registry;
        let Some(class_sig) = registry.resolve_class(&name) else {
            self.record(
                IssueKind::UndefinedClass,
                format!("Class {name} does not exist"),
                line,
            );
            return None;
        };

        let inside_itself = self
            .current_class()
            .is_some_and(|current| current.name.eq_ignore_ascii_case(&class_sig.name));
        if class_sig.deprecated && !inside_itself {
            self.record(
                IssueKind::DeprecatedClass,
                format!("{} is marked deprecated", class_sig.name),
                line,
            );
        }
        Some(class_sig)
    }

    fn check_deprecated_method(&mut self, owner: &ClassSignature, method: &FunctionSignature, line: u32) {
        if method.deprecated {
            self.record(
                IssueKind::DeprecatedMethod,
                format!(
                    "The method {}::{} has been marked as deprecated",
                    owner.name, method.name
                ),
                line,
            );
        }
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    fn infer_arguments(&mut self, args: &[NodeIndex]) -> Result<(), CheckError> {
        for &arg in args {
            self.infer_expression(arg)?;
        }
        Ok(())
    }

    /// Check `args` against `signature`; returns the argument types.
    pub(crate) fn check_arguments(
        &mut self,
        signature: &FunctionSignature,
        display: &str,
        args: &[NodeIndex],
        line: u32,
    ) -> Result<Vec<TypeExpr>, CheckError> {
        let count = args.len();
        if let Some(max) = signature.max_param_count()
            && count > max
        {
            self.record(
                IssueKind::TooManyArguments,
                format!("Too many arguments for {display} - expecting {max} but saw {count}"),
                line,
            );
        }
        let required = signature.required_param_count();
        if count < required {
            self.record(
                IssueKind::TooFewArguments,
                format!("Too few arguments for {display} - expecting {required} but saw {count}"),
                line,
            );
        }

        let mut types = Vec::with_capacity(count);
        for (position, &arg) in args.iter().enumerate() {
            let ty = self.infer_expression(arg)?;
            if let Some(expected) = signature
                .param_for_argument(position)
                .and_then(|param| param.declared_type())
            {
                self.check_argument_type(display, position + 1, arg, &ty, expected, line)?;
            }
            types.push(ty);
        }
        Ok(types)
    }

    fn check_argument_type(
        &mut self,
        display: &str,
        argument: usize,
        arg: NodeIndex,
        actual: &TypeExpr,
        expected: &TypeExpr,
        line: u32,
    ) -> Result<(), CheckError> {
        if expected.is_mixed() {
            return Ok(());
        }
        if actual.is_mixed() {
            self.record(
                IssueKind::MixedArgument,
                format!("Argument {argument} of {display} cannot be mixed, expecting {expected}"),
                line,
            );
            return self.record_argument_usage(arg, expected);
        }
        if self.is_subtype(actual, expected) {
            return Ok(());
        }
        if actual.is_nullable() && self.is_subtype(&actual.without_null(), expected) {
            self.record(
                IssueKind::PossiblyNullArgument,
                format!("Argument {argument} of {display} cannot be null, possibly null value provided"),
                line,
            );
        } else {
            self.record(
                IssueKind::InvalidArgument,
                format!("Argument {argument} of {display} expects {expected}, {actual} provided"),
                line,
            );
        }
        Ok(())
    }

    /// An argument (or operand) at `arg` reached a position expecting `expected`.
    pub(crate) fn record_argument_usage(&mut self, arg: NodeIndex, expected: &TypeExpr) -> Result<(), CheckError> {
        if let NodeKind::Variable { name } = &self.node(arg)?.kind {
            self.record_param_usage(name, expected);
        }
        Ok(())
    }
}
