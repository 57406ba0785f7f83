//! Property reads and writes.

use crate::ast::NodeIndex;
use crate::error::CheckError;
use crate::registry::PropertyLookup;
use crate::state::CheckerState;
use docflow_common::IssueKind;
use docflow_solver::{TypeExpr, union_all};

impl<'a> CheckerState<'a> {
    /// `$object->property` as an rvalue.
    pub(crate) fn check_property_fetch(
        &mut self,
        object: NodeIndex,
        property: &str,
        line: u32,
    ) -> Result<TypeExpr, CheckError> {
        let receiver = self.infer_expression(object)?;
        if receiver.is_nullable() && !receiver.is_null() {
            self.record(
                IssueKind::PossiblyNullReference,
                format!("Cannot get property {property} on possibly null value"),
                line,
            );
        }

        let receiver = receiver.without_null();
        let types: Vec<TypeExpr> = receiver
            .members()
            .iter()
            .filter_map(TypeExpr::class_name)
            .map(|class| self.read_property(class, property, line))
            .collect();
        if types.is_empty() {
            return Ok(TypeExpr::MIXED);
        }
        Ok(union_all(types))
    }

    fn read_property(&mut self, class: &str, property: &str, line: u32) -> TypeExpr {
        let registry = self.registry;
        match registry.resolve_property(class, property) {
            Some(PropertyLookup::Declared {
                class: owner,
                property: declared,
            }) => {
                if declared.deprecated {
                    self.record(
                        IssueKind::DeprecatedProperty,
                        format!("{}::${property} is marked deprecated", owner.name),
                        line,
                    );
                }
                declared.declared.clone().unwrap_or(TypeExpr::MIXED)
            }
            Some(PropertyLookup::Magic { ty, .. }) => ty.clone(),
            // Undeclared: whatever `__get` returns.
            None => registry
                .resolve_method(class, "__get")
                .map_or(TypeExpr::MIXED, |(_, getter)| getter.call_return_type()),
        }
    }

    /// `$object->property = <value>`.
    pub(crate) fn check_property_assignment(
        &mut self,
        object: NodeIndex,
        property: &str,
        value: &TypeExpr,
        line: u32,
    ) -> Result<(), CheckError> {
        let receiver = self.infer_expression(object)?;
        if receiver.is_nullable() && !receiver.is_null() {
            self.record(
                IssueKind::PossiblyNullReference,
                format!("Cannot assign property {property} on possibly null value"),
                line,
            );
        }

        let registry = self.registry;
        let receiver = receiver.without_null();
        for class in receiver.members().iter().filter_map(TypeExpr::class_name) {
            match registry.resolve_property(class, property) {
                Some(PropertyLookup::Declared {
                    class: owner,
                    property: declared,
                }) => {
                    if declared.deprecated {
                        self.record(
                            IssueKind::DeprecatedProperty,
                            format!("{}::${property} is marked deprecated", owner.name),
                            line,
                        );
                    }
                    if let Some(expected) = &declared.declared {
                        self.check_property_value(&owner.name, property, expected, value, line);
                    }
                }
                Some(PropertyLookup::Magic { class: owner, ty }) => {
                    self.check_property_value(&owner.name, property, ty, value, line);
                }
                None => {}
            }
        }
        Ok(())
    }

    fn check_property_value(
        &mut self,
        class: &str,
        property: &str,
        expected: &TypeExpr,
        value: &TypeExpr,
        line: u32,
    ) {
        if value.is_mixed() || self.is_subtype(value, expected) {
            return;
        }
        self.record(
            IssueKind::InvalidPropertyAssignment,
            format!("{class}::${property} with declared type '{expected}' cannot be assigned type '{value}'"),
            line,
        );
    }
}
