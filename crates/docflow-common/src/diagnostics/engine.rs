//! Per-unit diagnostic collection.
//!
//! One `DiagnosticEngine` exists per analysis unit. It is append-only:
//! recorded issues are never rewritten, and engines of different units are
//! never merged here. Aggregation across units is the driver's job.

use super::{Issue, IssueKind, Severity};
use crate::config::AnalysisConfig;
use rustc_hash::FxHashSet;
use tracing::trace;

#[derive(Debug)]
pub struct DiagnosticEngine<'a> {
    file: String,
    config: &'a AnalysisConfig,
    issues: Vec<Issue>,
    /// One entry per enclosing documented declaration.
    suppression_stack: Vec<FxHashSet<IssueKind>>,
    /// Nesting depth of speculative passes whose findings are discarded.
    mute_depth: u32,
}

impl<'a> DiagnosticEngine<'a> {
    pub fn new(file: impl Into<String>, config: &'a AnalysisConfig) -> Self {
        Self {
            file: file.into(),
            config,
            issues: Vec::new(),
            suppression_stack: Vec::new(),
            mute_depth: 0,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Whether `kind` is silenced by an enclosing `@psalm-suppress`.
    pub fn is_suppressed(&self, kind: IssueKind) -> bool {
        self.suppression_stack
            .iter()
            .any(|scope| scope.contains(&kind))
    }

    /// Record an issue at `line`, unless suppressed or muted.
    pub fn record(&mut self, kind: IssueKind, message: impl Into<String>, line: u32) {
        if self.mute_depth > 0 {
            return;
        }
        if self.is_suppressed(kind) {
            trace!(%kind, line, "issue suppressed by docblock");
            return;
        }
        let severity = self.config.severity_of(kind);
        if severity == Severity::Suppressed {
            trace!(%kind, line, "issue suppressed by configuration");
            return;
        }
        let issue = Issue {
            kind,
            message: message.into(),
            file: self.file.clone(),
            line,
            severity,
        };
        trace!(%issue, "recorded");
        self.issues.push(issue);
    }

    pub fn push_suppressions(&mut self, kinds: FxHashSet<IssueKind>) {
        self.suppression_stack.push(kinds);
    }

    pub fn pop_suppressions(&mut self) {
        self.suppression_stack.pop();
    }

    pub fn mute(&mut self) {
        self.mute_depth += 1;
    }

    pub fn unmute(&mut self) {
        self.mute_depth = self.mute_depth.saturating_sub(1);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    /// Consume the engine, returning issues in source order.
    ///
    /// Issues found on the same line keep their recording order.
    pub fn finish(mut self) -> Vec<Issue> {
        self.issues.sort_by_key(|issue| issue.line);
        self.issues
    }
}
