//! Function and method declarations.
//!
//! Reconciles docblock types with native hints, checks the body in a fresh
//! scope, then compares what the body returned with the declared return
//! type and reports untyped parameters.

use crate::ast::{FunctionDecl, Literal, Node, NodeIndex, NodeKind, ParamDecl};
use crate::context::ScopeContext;
use crate::docblock::{Docblock, DocblockSite, parse_docblock};
use crate::error::CheckError;
use crate::param_inference::ParamInference;
use crate::signature_collector::{parse_type_hint, qualify_relative};
use crate::state::{CheckerState, FunctionFrame};
use crate::statements::StatementChecker;
use docflow_common::IssueKind;
use docflow_solver::{TypeExpr, union_all};
use tracing::{debug, trace};

/// Declared return information of a function being checked.
struct ReturnContract {
    declared: Option<TypeExpr>,
    generator_return: Option<TypeExpr>,
}

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Docblock scoping
    // =========================================================================

    /// Parse the doc comment of `node`, activate its suppressions and report
    /// its malformed tags at the node's line. Pair with `leave_docblock`.
    pub(crate) fn enter_docblock(&mut self, node: &Node, site: DocblockSite) -> Docblock {
        let Some(doc) = node.docblock() else {
            self.diagnostics.push_suppressions(Default::default());
            return Docblock::default();
        };
        let parsed = parse_docblock(&doc.text, site, doc.line);
        self.diagnostics
            .push_suppressions(parsed.docblock.suppressions().clone());
        for issue in parsed.issues {
            trace!(doc_line = issue.line, message = %issue.message, "malformed tag");
            self.record(IssueKind::InvalidDocblock, issue.message, node.line);
        }
        parsed.docblock
    }

    pub(crate) fn leave_docblock(&mut self) {
        self.diagnostics.pop_suppressions();
    }

    // =========================================================================
    // Functions and methods
    // =========================================================================

    /// Check a function, or a method of the class on top of `class_stack`.
    #[tracing::instrument(level = "debug", skip(self), fields(idx = index.0))]
    pub(crate) fn check_function_like(&mut self, index: NodeIndex) -> Result<(), CheckError> {
        let node = self.node(index)?;
        let NodeKind::Function(decl) = &node.kind else {
            return Err(CheckError::UnexpectedNode {
                index,
                expected: "function",
            });
        };

        let docblock = self.enter_docblock(node, DocblockSite::Function);
        let result = self.check_function_body(index, node, decl, &docblock);
        self.leave_docblock();
        result
    }

    fn check_function_body(
        &mut self,
        index: NodeIndex,
        node: &Node,
        decl: &FunctionDecl,
        docblock: &Docblock,
    ) -> Result<(), CheckError> {
        let display_name = match self.current_class() {
            Some(class) => format!("{}::{}", class.name, decl.name),
            None => decl.name.clone(),
        };

        let mut params: Vec<(String, TypeExpr)> = Vec::with_capacity(decl.params.len());
        let mut untyped: Vec<String> = Vec::new();
        for (position, param) in decl.params.iter().enumerate() {
            match self.param_type(index, node, decl, position, param, docblock)? {
                Some(ty) => params.push((param.name.clone(), ty)),
                None => {
                    params.push((param.name.clone(), TypeExpr::MIXED));
                    untyped.push(param.name.clone());
                }
            }
        }

        let contract = self.return_contract(index, node, decl, docblock, &display_name)?;

        let Some(body) = &decl.body else {
            return Ok(());
        };

        let mut scope = ScopeContext::new();
        for (name, ty) in params {
            scope.assign(&name, ty);
        }
        let mut frame = FunctionFrame::new(display_name);
        for name in untyped {
            frame.untyped.insert(name, ParamInference::new());
        }

        let outer_ctx = std::mem::replace(&mut self.ctx, scope);
        let outer_frame = self.frame.replace(frame);
        let outer_depth = std::mem::take(&mut self.expr_depth);

        let result = StatementChecker::check_block(body, self);
        let falls_through = !self.ctx.exited;

        self.ctx = outer_ctx;
        self.expr_depth = outer_depth;
        let frame = std::mem::replace(&mut self.frame, outer_frame);
        result?;
        let Some(frame) = frame else {
            return Ok(());
        };

        self.check_returns(&frame, &contract, falls_through, node.line);

        let is_magic = decl.name.starts_with("__");
        if !is_magic {
            self.report_untyped_params(frame.untyped, node.line);
        }
        Ok(())
    }

    /// Type of a parameter inside the body. `None` when nothing declares it.
    fn param_type(
        &mut self,
        index: NodeIndex,
        node: &Node,
        decl: &FunctionDecl,
        position: usize,
        param: &ParamDecl,
        docblock: &Docblock,
    ) -> Result<Option<TypeExpr>, CheckError> {
        let (class, parent) = self.class_names();
        let native = param
            .type_hint
            .as_deref()
            .map(|hint| parse_type_hint(hint, index, class.as_deref(), parent.as_deref()))
            .transpose()?;
        let documented = docblock
            .param_type(&param.name)
            .map(|ty| qualify_relative(ty.clone(), class.as_deref(), parent.as_deref()));

        let declared = match (documented, native) {
            (Some(doc), Some(native)) => {
                if self.is_subtype(&doc, &native) {
                    Some(doc)
                } else {
                    self.record(
                        IssueKind::InvalidDocblock,
                        format!(
                            "Parameter {} has wrong type '{doc}', should be '{native}'",
                            param.name
                        ),
                        node.line,
                    );
                    Some(native)
                }
            }
            (doc, native) => doc.or(native),
        };

        let declared = match declared {
            Some(ty) => Some(ty),
            None => self.inherited_param_type(&decl.name, position),
        };
        let Some(mut ty) = declared else {
            return Ok(None);
        };

        if let Some(default) = param.default
            && matches!(self.node(default)?.kind, NodeKind::Literal(Literal::Null))
        {
            ty = TypeExpr::nullable(ty);
        }
        if param.variadic {
            ty = TypeExpr::array_of(ty);
        }
        Ok(Some(ty))
    }

    /// Docblock type of the parameter at `position` of the nearest ancestor
    /// method named `method`. Native ancestor types are not inherited.
    fn inherited_param_type(&self, method: &str, position: usize) -> Option<TypeExpr> {
        let class = self.current_class()?;
        self.registry
            .ancestry(&class.name)
            .into_iter()
            .skip(1)
            .find_map(|ancestor| ancestor.own_method(method))
            .and_then(|parent| parent.params.get(position))
            .and_then(|param| param.doc_type.clone())
    }

    fn class_names(&self) -> (Option<String>, Option<String>) {
        match self.current_class() {
            Some(class) => (Some(class.name.clone()), class.parent.clone()),
            None => (None, None),
        }
    }

    fn return_contract(
        &mut self,
        index: NodeIndex,
        node: &Node,
        decl: &FunctionDecl,
        docblock: &Docblock,
        display_name: &str,
    ) -> Result<ReturnContract, CheckError> {
        let (class, parent) = self.class_names();
        let native = decl
            .return_type
            .as_deref()
            .map(|hint| parse_type_hint(hint, index, class.as_deref(), parent.as_deref()))
            .transpose()?;
        let documented = docblock
            .return_type()
            .map(|ty| qualify_relative(ty.clone(), class.as_deref(), parent.as_deref()));

        let declared = match (documented, native) {
            (Some(doc), Some(native)) => {
                if self.is_subtype(&doc, &native) {
                    Some(doc)
                } else {
                    self.record(
                        IssueKind::InvalidDocblock,
                        format!(
                            "Docblock return type '{doc}' for {display_name} is incompatible \
                             with signature type '{native}'"
                        ),
                        node.line,
                    );
                    Some(native)
                }
            }
            (doc, native) => doc.or(native),
        };

        Ok(ReturnContract {
            declared,
            generator_return: docblock.generator_return_type().cloned(),
        })
    }

    // =========================================================================
    // Return checks
    // =========================================================================

    fn check_returns(
        &mut self,
        frame: &FunctionFrame,
        contract: &ReturnContract,
        falls_through: bool,
        line: u32,
    ) {
        let name = &frame.display_name;

        if frame.has_yield {
            let Some(expected) = &contract.generator_return else {
                return;
            };
            for returned in &frame.return_types {
                if !self.is_subtype(returned, expected) {
                    self.record(
                        IssueKind::InvalidReturnType,
                        format!(
                            "The declared generator return type '{expected}' for {name} is \
                             incorrect, got '{returned}'"
                        ),
                        line,
                    );
                }
            }
            return;
        }

        let Some(declared) = &contract.declared else {
            return;
        };

        if declared.is_void() {
            if let Some(returned) = frame.return_types.first() {
                self.record(
                    IssueKind::InvalidReturnType,
                    format!("{name} is declared void but returns '{returned}'"),
                    line,
                );
            }
            return;
        }

        if frame.return_types.is_empty() && !frame.has_bare_return {
            self.record(
                IssueKind::InvalidReturnType,
                format!(
                    "No return statements were found for {name} but return type \
                     '{declared}' was expected"
                ),
                line,
            );
            return;
        }

        let mut returned = frame.return_types.clone();
        if frame.has_bare_return || falls_through {
            returned.push(TypeExpr::NULL);
        }
        let inferred = union_all(returned);
        debug!(%name, %inferred, %declared, "return check");
        if !self.is_subtype(&inferred, declared) {
            self.record(
                IssueKind::InvalidReturnType,
                format!("The declared return type '{declared}' for {name} is incorrect, got '{inferred}'"),
                line,
            );
        }
    }
}
