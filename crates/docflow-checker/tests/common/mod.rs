//! Shared helpers for checker integration tests.
#![allow(dead_code)]

use docflow_checker::{InMemoryRegistry, NodeArena, SignatureCollector, UnitReport, check_unit};
use docflow_common::{AnalysisConfig, IssueKind};

pub const FILE: &str = "src/somefile.php";

/// Route checker traces to the test output when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Collect signatures from `arena` and check it, with `suppressed` kinds
/// silenced by configuration.
pub fn check_with(arena: &NodeArena, suppressed: &[IssueKind]) -> UnitReport {
    init_tracing();
    let mut registry = InMemoryRegistry::with_builtins();
    SignatureCollector::new(arena, FILE, &mut registry)
        .collect()
        .expect("signature collection should succeed");
    let config = AnalysisConfig::new().suppressing(suppressed.iter().copied());
    check_unit(arena, FILE, &registry, &config).expect("check should succeed")
}

pub fn check(arena: &NodeArena) -> UnitReport {
    check_with(arena, &[])
}

/// Issues rendered as `Kind - file:line - message`.
pub fn rendered(report: &UnitReport) -> Vec<String> {
    report.issues.iter().map(ToString::to_string).collect()
}

pub fn kinds(report: &UnitReport) -> Vec<IssueKind> {
    report.issues.iter().map(|issue| issue.kind).collect()
}

#[track_caller]
pub fn assert_clean(report: &UnitReport) {
    assert!(
        report.issues.is_empty(),
        "expected no issues, got {:#?}",
        rendered(report)
    );
}

/// Assert that some issue of `kind` mentions `fragment`, and return it rendered.
#[track_caller]
pub fn assert_issue(report: &UnitReport, kind: IssueKind, fragment: &str) -> String {
    let found = report
        .issues_of(kind)
        .find(|issue| issue.message.contains(fragment))
        .map(ToString::to_string);
    match found {
        Some(issue) => issue,
        None => panic!(
            "expected {kind} containing {fragment:?}, got {:#?}",
            rendered(report)
        ),
    }
}
