//! Multi-unit driver.
//!
//! Signature collection runs over every unit first, sequentially, and
//! produces the registry. Checking then runs one `CheckerState` per unit in
//! parallel; each has its own scope and `DiagnosticEngine`, and the registry
//! is only read. Reports come back in input order.

use crate::ast::SyntaxTree;
use crate::error::CheckError;
use crate::registry::{InMemoryRegistry, SignatureRegistry};
use crate::signature_collector::SignatureCollector;
use crate::state::{UnitReport, check_unit};
use docflow_common::{AnalysisConfig, Issue};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rustc_hash::FxHashSet;
use tracing::{debug, info_span, warn};

/// One parsed file handed to the driver.
#[derive(Clone, Copy)]
pub struct AnalysisUnit<'t> {
    pub file: &'t str,
    pub tree: &'t (dyn SyntaxTree + Sync),
}

impl<'t> AnalysisUnit<'t> {
    pub fn new(file: &'t str, tree: &'t (dyn SyntaxTree + Sync)) -> Self {
        Self { file, tree }
    }
}

/// A unit whose tree could not be processed.
#[derive(Clone, Debug)]
pub struct UnitFailure {
    pub file: String,
    pub error: CheckError,
}

#[derive(Clone, Debug, Default)]
pub struct AnalysisSummary {
    /// One report per successfully checked unit, in input order.
    pub reports: Vec<UnitReport>,
    pub failures: Vec<UnitFailure>,
}

impl AnalysisSummary {
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.reports.iter().flat_map(|report| report.issues.iter())
    }

    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty() || self.reports.iter().any(UnitReport::has_errors)
    }
}

/// Register the declarations of every unit. Units that fail keep whatever
/// they registered before the failure.
pub fn collect_signatures(units: &[AnalysisUnit<'_>], registry: &mut InMemoryRegistry) -> Vec<UnitFailure> {
    let _span = info_span!("collect_signatures", units = units.len()).entered();
    let mut failures = Vec::new();
    for unit in units {
        if let Err(error) = SignatureCollector::new(unit.tree, unit.file, registry).collect() {
            warn!(file = unit.file, %error, "signature collection failed");
            failures.push(UnitFailure {
                file: unit.file.to_string(),
                error,
            });
        }
    }
    debug!(
        functions = registry.function_count(),
        classes = registry.class_count(),
        "signatures collected"
    );
    failures
}

/// Check every unit against a finished registry.
pub fn check_units(
    units: &[AnalysisUnit<'_>],
    registry: &dyn SignatureRegistry,
    config: &AnalysisConfig,
) -> AnalysisSummary {
    let _span = info_span!("check_units", units = units.len()).entered();
    let results: Vec<Result<UnitReport, UnitFailure>> = units
        .par_iter()
        .map(|unit| {
            check_unit(unit.tree, unit.file, registry, config).map_err(|error| UnitFailure {
                file: unit.file.to_string(),
                error,
            })
        })
        .collect();

    let mut summary = AnalysisSummary::default();
    for result in results {
        match result {
            Ok(report) => summary.reports.push(report),
            Err(failure) => {
                warn!(file = %failure.file, error = %failure.error, "unit check failed");
                summary.failures.push(failure);
            }
        }
    }
    summary
}

/// Collect then check. Units that failed collection are not checked.
pub fn analyze(
    units: &[AnalysisUnit<'_>],
    mut registry: InMemoryRegistry,
    config: &AnalysisConfig,
) -> AnalysisSummary {
    let failures = collect_signatures(units, &mut registry);
    let failed: FxHashSet<&str> = failures.iter().map(|failure| failure.file.as_str()).collect();
    let checkable: Vec<AnalysisUnit<'_>> = units
        .iter()
        .filter(|unit| !failed.contains(unit.file))
        .copied()
        .collect();

    let mut summary = check_units(&checkable, &registry, config);
    summary.failures.splice(0..0, failures);
    summary
}
