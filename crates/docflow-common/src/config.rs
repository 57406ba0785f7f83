//! Analysis configuration.
//!
//! A configuration is built once per analysis run and handed to every
//! `DiagnosticEngine` explicitly. Nothing here is read from process-wide
//! state, so concurrent runs with different configurations stay isolated.
//!
//! JSON form:
//! ```json
//! {
//!   "default_severity": "error",
//!   "issue_levels": { "MixedArgument": "suppressed", "UntypedParam": "warning" },
//!   "suppress": ["DeprecatedMethod"]
//! }
//! ```

use crate::diagnostics::{IssueKind, Severity};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid analysis configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-run severity map and default suppressions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Severity used for kinds not listed in `issue_levels`.
    pub default_severity: Severity,
    /// Per-kind severity overrides.
    pub issue_levels: FxHashMap<IssueKind, Severity>,
    /// Kinds suppressed for the whole run, regardless of `issue_levels`.
    pub suppress: FxHashSet<IssueKind>,
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str(source)?;
        Ok(config)
    }

    /// Builder-style override of one kind's severity.
    #[must_use]
    pub fn with_level(mut self, kind: IssueKind, severity: Severity) -> Self {
        self.issue_levels.insert(kind, severity);
        self
    }

    /// Suppress each of `kinds` for the whole run.
    #[must_use]
    pub fn suppressing(mut self, kinds: impl IntoIterator<Item = IssueKind>) -> Self {
        self.suppress.extend(kinds);
        self
    }

    pub fn severity_of(&self, kind: IssueKind) -> Severity {
        if self.suppress.contains(&kind) {
            return Severity::Suppressed;
        }
        self.issue_levels
            .get(&kind)
            .copied()
            .unwrap_or(self.default_severity)
    }
}
