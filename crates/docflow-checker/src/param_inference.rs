//! Type inference for parameters declared without any type.
//!
//! While an untyped parameter still holds its original binding (never
//! reassigned, still `mixed`), every place that constrains it is recorded:
//! argument positions with a declared parameter type and string operators
//! are *usages*; type tests on it are *assertions*. At the end of the
//! function the parameter is reported with the union of what was seen.

use crate::state::CheckerState;
use docflow_common::IssueKind;
use docflow_solver::{TypeExpr, union_all};
use tracing::trace;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ParamInference {
    pub usages: Vec<TypeExpr>,
    pub assertions: Vec<TypeExpr>,
    /// Cleared by the first assignment to the parameter.
    pub pristine: bool,
}

impl ParamInference {
    pub(crate) fn new() -> Self {
        Self {
            pristine: true,
            ..Self::default()
        }
    }

    /// `None` when no usage constrains the parameter.
    pub(crate) fn inferred(&self) -> Option<TypeExpr> {
        if self.usages.is_empty() {
            return None;
        }
        Some(union_all(
            self.usages.iter().chain(&self.assertions).cloned(),
        ))
    }
}

impl<'a> CheckerState<'a> {
    /// The inference slot of `name`, if it is an untouched untyped parameter
    /// whose current type is still `mixed`.
    fn pristine_param(&mut self, name: &str) -> Option<&mut ParamInference> {
        let still_mixed = self.ctx.get(name).is_none_or(TypeExpr::is_mixed);
        if !still_mixed {
            return None;
        }
        self.frame
            .as_mut()?
            .untyped
            .get_mut(name)
            .filter(|inference| inference.pristine)
    }

    /// `name` reached a position that expects `expected`.
    pub(crate) fn record_param_usage(&mut self, name: &str, expected: &TypeExpr) {
        if expected.is_mixed() {
            return;
        }
        if let Some(inference) = self.pristine_param(name) {
            trace!(%name, %expected, "parameter usage");
            inference.usages.push(expected.clone());
        }
    }

    /// `name` was tested to be `asserted`.
    pub(crate) fn record_param_assertion(&mut self, name: &str, asserted: TypeExpr) {
        if let Some(inference) = self.pristine_param(name) {
            trace!(%name, %asserted, "parameter assertion");
            inference.assertions.push(asserted);
        }
    }

    /// `name` was assigned; later reads no longer see the argument.
    pub(crate) fn release_param(&mut self, name: &str) {
        if let Some(inference) = self
            .frame
            .as_mut()
            .and_then(|frame| frame.untyped.get_mut(name))
        {
            inference.pristine = false;
        }
    }

    /// Report every untyped parameter of a finished function.
    pub(crate) fn report_untyped_params(
        &mut self,
        untyped: impl IntoIterator<Item = (String, ParamInference)>,
        line: u32,
    ) {
        for (name, inference) in untyped {
            let message = match inference.inferred() {
                Some(ty) => format!("Parameter {name} has no provided type, should be {ty}"),
                None => format!("Parameter {name} has no provided type, could not infer"),
            };
            self.record(IssueKind::UntypedParam, message, line);
        }
    }
}
