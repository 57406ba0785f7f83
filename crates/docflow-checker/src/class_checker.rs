//! Class, interface and property declarations, and override compatibility.

use crate::ast::{ClassDecl, FunctionDecl, Literal, Node, NodeIndex, NodeKind, PropertyDecl};
use crate::context::ScopeContext;
use crate::docblock::DocblockSite;
use crate::error::CheckError;
use crate::signature_collector::{anonymous_class_name, parse_type_hint, qualify_relative};
use crate::state::{CheckerState, ClassFrame};
use docflow_common::IssueKind;
use docflow_solver::TypeExpr;
use tracing::{Level, span};

impl<'a> CheckerState<'a> {
    /// Check a class declaration and all its members. Returns the class name
    /// (the generated one for anonymous classes).
    pub(crate) fn check_class_like(&mut self, index: NodeIndex) -> Result<String, CheckError> {
        let node = self.node(index)?;
        let NodeKind::Class(decl) = &node.kind else {
            return Err(CheckError::UnexpectedNode {
                index,
                expected: "class",
            });
        };
        let name = decl
            .name
            .clone()
            .unwrap_or_else(|| anonymous_class_name(self.file(), index));
        let _span = span!(Level::DEBUG, "class", %name).entered();

        let _docblock = self.enter_docblock(node, DocblockSite::Class);
        self.check_class_references(decl, node.line);

        self.class_stack.push(ClassFrame {
            name: name.clone(),
            parent: decl.parent.clone(),
        });
        let result = self.check_class_members(decl);
        self.class_stack.pop();
        self.leave_docblock();

        result.map(|()| name)
    }

    fn check_class_references(&mut self, decl: &ClassDecl, line: u32) {
        for referenced in decl.parent.iter().chain(&decl.interfaces) {
            match self.registry.resolve_class(referenced) {
                None => self.record(
                    IssueKind::UndefinedClass,
                    format!("Class {referenced} does not exist"),
                    line,
                ),
                Some(parent) if parent.deprecated => self.record(
                    IssueKind::DeprecatedClass,
                    format!("{} is marked deprecated", parent.name),
                    line,
                ),
                Some(_) => {}
            }
        }
    }

    fn check_class_members(&mut self, decl: &ClassDecl) -> Result<(), CheckError> {
        for &member in &decl.members {
            let node = self.node(member)?;
            match &node.kind {
                NodeKind::Function(method) => {
                    self.check_override(method, node.line);
                    self.check_function_like(member)?;
                }
                NodeKind::Property(property) => {
                    self.check_property_declaration(member, node, property)?;
                }
                _ => {
                    return Err(CheckError::UnexpectedNode {
                        index: member,
                        expected: "class member",
                    });
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn check_property_declaration(
        &mut self,
        index: NodeIndex,
        node: &Node,
        decl: &PropertyDecl,
    ) -> Result<(), CheckError> {
        let docblock = self.enter_docblock(node, DocblockSite::Property);
        let result = self.check_property_types(index, node, decl, docblock.var_type());
        self.leave_docblock();
        result
    }

    fn check_property_types(
        &mut self,
        index: NodeIndex,
        node: &Node,
        decl: &PropertyDecl,
        documented: Option<&TypeExpr>,
    ) -> Result<(), CheckError> {
        let (class, parent) = match self.current_class() {
            Some(frame) => (Some(frame.name.clone()), frame.parent.clone()),
            None => (None, None),
        };
        let native = decl
            .type_hint
            .as_deref()
            .map(|hint| parse_type_hint(hint, index, class.as_deref(), parent.as_deref()))
            .transpose()?;
        let documented =
            documented.map(|ty| qualify_relative(ty.clone(), class.as_deref(), parent.as_deref()));

        let declared = match (documented, native) {
            (Some(doc), Some(native)) if !self.is_subtype(&doc, &native) => {
                self.record(
                    IssueKind::InvalidDocblock,
                    format!(
                        "Property ${} has wrong docblock type '{doc}', should be '{native}'",
                        decl.name
                    ),
                    node.line,
                );
                Some(native)
            }
            (doc, native) => doc.or(native),
        };

        let Some(default) = decl.default else {
            return Ok(());
        };
        if matches!(self.node(default)?.kind, NodeKind::Literal(Literal::Null)) {
            return Ok(());
        }

        // Defaults are constant expressions; type them outside any function scope.
        let outer = std::mem::replace(&mut self.ctx, ScopeContext::new());
        let value = self.infer_expression(default);
        self.ctx = outer;
        let value = value?;

        if let Some(declared) = declared
            && !value.is_mixed()
            && !self.is_subtype(&value, &declared)
        {
            let class = class.as_deref().unwrap_or_default();
            self.record(
                IssueKind::InvalidPropertyAssignment,
                format!(
                    "{class}::${} with declared type '{declared}' cannot be assigned type '{value}'",
                    decl.name
                ),
                node.line,
            );
        }
        Ok(())
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    /// Compare a method's parameters with the nearest ancestor declaring it.
    fn check_override(&mut self, method: &FunctionDecl, line: u32) {
        if method.name.eq_ignore_ascii_case("__construct") {
            return;
        }
        let Some(class) = self.current_class() else {
            return;
        };
        let class_name = class.name.clone();
        let registry = self.registry;
        let ancestry = registry.ancestry(&class_name);
        let Some((ancestor, parent_method)) = ancestry
            .iter()
            .skip(1)
            .find_map(|ancestor| ancestor.own_method(&method.name).map(|found| (*ancestor, found)))
        else {
            return;
        };
        let Some(own) = ancestry
            .first()
            .and_then(|own| own.own_method(&method.name))
        else {
            return;
        };

        for (position, (child, parent)) in own.params.iter().zip(&parent_method.params).enumerate() {
            let argument = position + 1;
            let child_type = child.declared_type().or(parent.doc_type.as_ref());
            match (child_type, parent.declared_type()) {
                (None, Some(expected)) if parent.native_type.is_some() => self.record(
                    IssueKind::MethodSignatureMismatch,
                    format!(
                        "Argument {argument} of {class_name}::{} has no type (UntypedParam), \
                         expecting '{expected}' as defined by {}::{}",
                        method.name, ancestor.name, parent_method.name
                    ),
                    line,
                ),
                (Some(actual), Some(expected)) if !self.is_subtype(expected, actual) => self.record(
                    IssueKind::MethodSignatureMismatch,
                    format!(
                        "Argument {argument} of {class_name}::{} has wrong type '{actual}', \
                         expecting '{expected}' as defined by {}::{}",
                        method.name, ancestor.name, parent_method.name
                    ),
                    line,
                ),
                _ => {}
            }
        }
    }
}
