//! Checker state for one analysis unit.
//!
//! `CheckerState` owns everything a unit traversal mutates: the current
//! `ScopeContext`, the `DiagnosticEngine` and the frame of the function
//! being checked. The tree and the registry are shared, read-only.
//!
//! Checking logic lives in separate `impl CheckerState` blocks:
//! - `statements.rs` / `state_checking.rs`: statement dispatch and handlers
//! - `expr.rs`: expression typing
//! - `call_checker.rs`, `property_checker.rs`: usage checks
//! - `flow_narrowing.rs`: condition narrowing
//! - `declarations.rs`, `class_checker.rs`: function and class declarations
//! - `param_inference.rs`: untyped parameter inference

use crate::ast::{Node, NodeIndex, SyntaxTree};
use crate::context::ScopeContext;
use crate::error::CheckError;
use crate::param_inference::ParamInference;
use crate::registry::{RegistryResolver, SignatureRegistry};
use crate::statements::StatementChecker;
use docflow_common::{AnalysisConfig, DiagnosticEngine, Issue, IssueKind};
use docflow_solver::{NarrowingContext, SubtypeChecker, TypeExpr};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{Level, debug, span};

/// Per-function bookkeeping while its body is checked.
#[derive(Debug, Default)]
pub(crate) struct FunctionFrame {
    /// `Class::method` or the function name, for messages.
    pub display_name: String,
    /// Types of every valued `return`.
    pub return_types: Vec<TypeExpr>,
    pub has_bare_return: bool,
    pub has_yield: bool,
    /// Parameters without any declared type, in declaration order.
    pub untyped: IndexMap<String, ParamInference>,
}

impl FunctionFrame {
    pub(crate) fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }
}

/// The class whose members are being checked.
#[derive(Clone, Debug)]
pub(crate) struct ClassFrame {
    pub name: String,
    pub parent: Option<String>,
}

/// Result of checking one unit.
#[derive(Clone, Debug)]
pub struct UnitReport {
    pub file: String,
    /// In source order.
    pub issues: Vec<Issue>,
    /// Lines of branches that narrowing proved unreachable.
    pub unreachable_lines: Vec<u32>,
    /// Top-level scope after the last statement.
    pub scope: ScopeContext,
}

impl UnitReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    /// Issues of `kind`, in source order.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }
}

pub struct CheckerState<'a> {
    pub(crate) tree: &'a dyn SyntaxTree,
    pub(crate) registry: &'a dyn SignatureRegistry,
    pub(crate) resolver: RegistryResolver<'a>,
    pub(crate) diagnostics: DiagnosticEngine<'a>,
    pub(crate) ctx: ScopeContext,
    pub(crate) frame: Option<FunctionFrame>,
    pub(crate) class_stack: Vec<ClassFrame>,
    /// Constants created by `define()` so far.
    pub(crate) constants: FxHashMap<String, TypeExpr>,
    pub(crate) unreachable_lines: Vec<u32>,
    pub(crate) expr_depth: u32,
    pub(crate) stmt_depth: u32,
}

impl<'a> CheckerState<'a> {
    pub fn new(
        tree: &'a dyn SyntaxTree,
        file: &str,
        registry: &'a dyn SignatureRegistry,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            tree,
            registry,
            resolver: RegistryResolver::new(registry),
            diagnostics: DiagnosticEngine::new(file, config),
            ctx: ScopeContext::new(),
            frame: None,
            class_stack: Vec::new(),
            constants: FxHashMap::default(),
            unreachable_lines: Vec::new(),
            expr_depth: 0,
            stmt_depth: 0,
        }
    }

    /// Check the whole unit from its root.
    pub fn check_source_file(mut self) -> Result<UnitReport, CheckError> {
        let root = self.tree.root().ok_or(CheckError::MissingRoot)?;
        let _span = span!(Level::DEBUG, "check_unit", file = %self.diagnostics.file()).entered();

        StatementChecker::check(root, &mut self)?;

        let mut unreachable_lines = self.unreachable_lines;
        unreachable_lines.sort_unstable();
        unreachable_lines.dedup();
        let file = self.diagnostics.file().to_string();
        let issues = self.diagnostics.finish();
        debug!(issues = issues.len(), "unit checked");
        Ok(UnitReport {
            file,
            issues,
            unreachable_lines,
            scope: self.ctx,
        })
    }

    // =========================================================================
    // Tree access
    // =========================================================================

    pub(crate) fn node(&self, index: NodeIndex) -> Result<&'a Node, CheckError> {
        let tree: &'a dyn SyntaxTree = self.tree;
        tree.get(index).ok_or(CheckError::MissingNode(index))
    }

    pub(crate) fn file(&self) -> &str {
        self.diagnostics.file()
    }

    // =========================================================================
    // Type relations
    // =========================================================================

    pub(crate) fn is_subtype(&self, source: &TypeExpr, target: &TypeExpr) -> bool {
        SubtypeChecker::new(&self.resolver).is_subtype_of(source, target)
    }

    pub(crate) fn narrowing(&self) -> NarrowingContext<'_, RegistryResolver<'a>> {
        NarrowingContext::new(&self.resolver)
    }

    // =========================================================================
    // Class context
    // =========================================================================

    pub(crate) fn current_class(&self) -> Option<&ClassFrame> {
        self.class_stack.last()
    }

    /// Resolve `self`, `static` and `parent` against the current class.
    pub(crate) fn resolve_class_name(&self, name: &str) -> Option<String> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        if name.eq_ignore_ascii_case("self") || name.eq_ignore_ascii_case("static") {
            return self.current_class().map(|class| class.name.clone());
        }
        if name.eq_ignore_ascii_case("parent") {
            return self.current_class().and_then(|class| class.parent.clone());
        }
        Some(name.to_string())
    }

    pub(crate) fn record(&mut self, kind: IssueKind, message: impl Into<String>, line: u32) {
        self.diagnostics.record(kind, message, line);
    }
}

/// Check one unit against a populated registry.
pub fn check_unit(
    tree: &dyn SyntaxTree,
    file: &str,
    registry: &dyn SignatureRegistry,
    config: &AnalysisConfig,
) -> Result<UnitReport, CheckError> {
    CheckerState::new(tree, file, registry, config).check_source_file()
}
