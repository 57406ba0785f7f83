//! Multi-unit analysis: shared registry, ordering and failures.

mod common;

use docflow_checker::{
    AnalysisUnit, CheckError, ClassDecl, FunctionDecl, InMemoryRegistry, NodeArena, NodeIndex,
    ParamDecl, analyze, check_units, collect_signatures,
};
use docflow_common::{AnalysisConfig, IssueKind, Severity};
use docflow_solver::TypeExpr;

/// `class Greeter { public function greet(): string { return "hi"; } }`
fn greeter_unit() -> NodeArena {
    let mut arena = NodeArena::new();
    let hi = arena.add_string("hi", 4);
    let ret = arena.add_return(Some(hi), 4);
    let greet = arena.add_function(FunctionDecl::new("greet").returns("string").body(vec![ret]), 3);
    let class = arena.add_class(ClassDecl::new("Greeter").members(vec![greet]), 2);
    arena.set_root(vec![class]);
    arena
}

/// `$g = new Greeter(); $s = $g->greet(); nope();`
fn consumer_unit() -> NodeArena {
    let mut arena = NodeArena::new();
    let new = arena.add_new("Greeter", vec![], 2);
    let create = arena.add_assign_stmt("$g", new, 2);
    let g = arena.add_variable("$g", 3);
    let greet = arena.add_method_call(g, "greet", vec![], 3);
    let read = arena.add_assign_stmt("$s", greet, 3);
    let call = arena.add_call("nope", vec![], 4);
    let call = arena.add_expr_stmt(call, 4);
    arena.set_root(vec![create, read, call]);
    arena
}

/// `function takes<n>(int $i): void {}` followed by `takes<n>("x");`
fn mismatch_unit(n: usize) -> NodeArena {
    let mut arena = NodeArena::new();
    let name = format!("takes{n}");
    let func = arena.add_function(
        FunctionDecl::new(name.as_str())
            .param(ParamDecl::new("$i").typed("int"))
            .returns("void"),
        2,
    );
    let x = arena.add_string("x", 3);
    let call = arena.add_call(&name, vec![x], 3);
    let call = arena.add_expr_stmt(call, 3);
    arena.set_root(vec![func, call]);
    arena
}

#[test]
fn test_declarations_are_shared_across_units() {
    common::init_tracing();
    let greeter = greeter_unit();
    let consumer = consumer_unit();
    let units = [
        AnalysisUnit::new("src/b.php", &consumer),
        AnalysisUnit::new("src/a.php", &greeter),
    ];

    let summary = analyze(&units, InMemoryRegistry::with_builtins(), &AnalysisConfig::new());
    assert!(summary.failures.is_empty());
    let files: Vec<&str> = summary.reports.iter().map(|report| report.file.as_str()).collect();
    assert_eq!(files, vec!["src/b.php", "src/a.php"]);

    let consumer_report = &summary.reports[0];
    assert_eq!(
        common::rendered(consumer_report),
        vec!["UndefinedFunction - src/b.php:4 - Function nope does not exist"]
    );
    assert_eq!(consumer_report.scope.get("$s"), Some(&TypeExpr::STRING));
    assert!(summary.reports[1].issues.is_empty());
    assert!(summary.has_errors());
}

#[test]
fn test_unit_without_root_fails_alone() {
    common::init_tracing();
    let broken = NodeArena::new();
    let greeter = greeter_unit();
    let consumer = consumer_unit();
    let units = [
        AnalysisUnit::new("src/broken.php", &broken),
        AnalysisUnit::new("src/a.php", &greeter),
        AnalysisUnit::new("src/b.php", &consumer),
    ];

    let summary = analyze(&units, InMemoryRegistry::with_builtins(), &AnalysisConfig::new());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].file, "src/broken.php");
    assert_eq!(summary.failures[0].error, CheckError::MissingRoot);
    assert_eq!(summary.reports.len(), 2);
    assert_eq!(summary.issues().count(), 1);
}

#[test]
fn test_check_failure_is_reported_per_unit() {
    common::init_tracing();
    let mut dangling = NodeArena::new();
    dangling.set_root(vec![NodeIndex(99)]);
    let greeter = greeter_unit();
    let units = [
        AnalysisUnit::new("src/a.php", &greeter),
        AnalysisUnit::new("src/dangling.php", &dangling),
    ];

    let mut registry = InMemoryRegistry::with_builtins();
    let failures = collect_signatures(&units[..1], &mut registry);
    assert!(failures.is_empty());

    let summary = check_units(&units, &registry, &AnalysisConfig::new());
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].file, "src/dangling.php");
    assert_eq!(summary.failures[0].error, CheckError::MissingNode(NodeIndex(99)));
}

#[test]
fn test_parallel_check_preserves_input_order() {
    common::init_tracing();
    let arenas: Vec<NodeArena> = (0..24).map(mismatch_unit).collect();
    let files: Vec<String> = (0..24).map(|n| format!("src/unit{n}.php")).collect();
    let units: Vec<AnalysisUnit<'_>> = files
        .iter()
        .zip(&arenas)
        .map(|(file, arena)| AnalysisUnit::new(file, arena))
        .collect();

    let summary = analyze(&units, InMemoryRegistry::with_builtins(), &AnalysisConfig::new());
    assert!(summary.failures.is_empty());
    let reported: Vec<&str> = summary.reports.iter().map(|report| report.file.as_str()).collect();
    assert_eq!(reported, files.iter().map(String::as_str).collect::<Vec<_>>());

    for (n, report) in summary.reports.iter().enumerate() {
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::InvalidArgument);
        assert!(
            report.issues[0].message.contains(&format!("takes{n}")),
            "{}",
            report.issues[0]
        );
    }
}

#[test]
fn test_configured_severity_applies_to_every_unit() {
    common::init_tracing();
    let config = AnalysisConfig::from_json(
        r#"{ "issue_levels": { "UndefinedFunction": "warning" }, "suppress": ["InvalidArgument"] }"#,
    )
    .expect("valid config");
    let consumer = consumer_unit();
    let greeter = greeter_unit();
    let mismatch = mismatch_unit(0);
    let units = [
        AnalysisUnit::new("src/a.php", &greeter),
        AnalysisUnit::new("src/b.php", &consumer),
        AnalysisUnit::new("src/c.php", &mismatch),
    ];

    let summary = analyze(&units, InMemoryRegistry::with_builtins(), &config);
    let issues: Vec<_> = summary.issues().collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Warning);
    assert!(!summary.has_errors());
}

#[test]
fn test_issues_serialize_for_reporting() {
    let consumer = consumer_unit();
    let greeter = greeter_unit();
    let units = [
        AnalysisUnit::new("src/a.php", &greeter),
        AnalysisUnit::new("src/b.php", &consumer),
    ];

    let summary = analyze(&units, InMemoryRegistry::with_builtins(), &AnalysisConfig::new());
    let issues: Vec<_> = summary.issues().collect();
    let json = serde_json::to_value(&issues).expect("issues serialize");
    assert_eq!(
        json,
        serde_json::json!([{
            "kind": "UndefinedFunction",
            "message": "Function nope does not exist",
            "file": "src/b.php",
            "line": 4,
            "severity": "error"
        }])
    );
}
