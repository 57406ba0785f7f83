use crate::context::ScopeContext;
use docflow_solver::{TypeExpr, union};

fn scope(vars: &[(&str, TypeExpr)]) -> ScopeContext {
    let mut ctx = ScopeContext::new();
    for (name, ty) in vars {
        ctx.assign(name, ty.clone());
    }
    ctx
}

#[test]
fn test_fork_is_independent() {
    let pre = scope(&[("$a", TypeExpr::INT)]);
    let mut branch = pre.fork();
    branch.assign("$a", TypeExpr::STRING);

    assert_eq!(pre.get("$a"), Some(&TypeExpr::INT));
    assert_eq!(branch.get("$a"), Some(&TypeExpr::STRING));
}

#[test]
fn test_join_unions_types_across_branches() {
    let pre = scope(&[("$a", TypeExpr::INT)]);
    let mut left = pre.fork();
    left.assign("$a", TypeExpr::STRING);
    let right = pre.fork();

    let joined = ScopeContext::join(&pre, vec![left, right]);
    assert_eq!(joined.get("$a"), Some(&union(&TypeExpr::STRING, &TypeExpr::INT)));
    assert!(joined.possibly_undefined.is_empty());
    assert!(!joined.exited);
}

#[test]
fn test_join_marks_one_sided_assignments_possibly_undefined() {
    let pre = ScopeContext::new();
    let mut left = pre.fork();
    left.assign("$b", TypeExpr::INT);
    let right = pre.fork();

    let joined = ScopeContext::join(&pre, vec![left, right]);
    assert_eq!(joined.get("$b"), Some(&TypeExpr::INT));
    assert!(joined.possibly_undefined.contains("$b"));
}

#[test]
fn test_join_skips_exited_branches() {
    let pre = scope(&[("$a", union(&TypeExpr::INT, &TypeExpr::FALSE))]);
    let mut returned = pre.fork();
    returned.assign("$a", TypeExpr::FALSE);
    returned.exited = true;
    let mut continued = pre.fork();
    continued.bind("$a", TypeExpr::INT);

    let joined = ScopeContext::join(&pre, vec![returned, continued]);
    assert_eq!(joined.get("$a"), Some(&TypeExpr::INT));
    assert!(!joined.exited);
}

#[test]
fn test_join_of_all_exited_branches_is_exited() {
    let pre = scope(&[("$a", TypeExpr::INT)]);
    let mut left = pre.fork();
    left.exited = true;
    let mut right = pre.fork();
    right.assign("$c", TypeExpr::STRING);
    right.exited = true;

    let joined = ScopeContext::join(&pre, vec![left, right]);
    assert!(joined.exited);
    assert!(!joined.has("$c"));
}

#[test]
fn test_reference_assignment_propagates() {
    let mut ctx = scope(&[("$var", TypeExpr::INT)]);
    ctx.assign("$a", TypeExpr::INT);
    ctx.link_references("$a", "$var");

    ctx.assign("$var", TypeExpr::STRING);
    assert_eq!(ctx.get("$a"), Some(&TypeExpr::STRING));

    ctx.assign("$a", TypeExpr::BOOL);
    assert_eq!(ctx.get("$var"), Some(&TypeExpr::BOOL));
    assert_eq!(ctx.references_of("$a").collect::<Vec<_>>(), vec!["$var"]);
}

#[test]
fn test_bind_does_not_touch_references() {
    let mut ctx = scope(&[("$var", TypeExpr::INT), ("$a", TypeExpr::INT)]);
    ctx.link_references("$a", "$var");

    ctx.bind("$a", TypeExpr::NEVER);
    assert_eq!(ctx.get("$var"), Some(&TypeExpr::INT));
}

#[test]
fn test_relinking_leaves_the_old_group() {
    let mut ctx = scope(&[("$x", TypeExpr::INT), ("$y", TypeExpr::INT), ("$a", TypeExpr::INT)]);
    ctx.link_references("$a", "$x");
    ctx.link_references("$a", "$y");

    ctx.assign("$x", TypeExpr::STRING);
    assert_eq!(ctx.get("$a"), Some(&TypeExpr::INT));
    assert_eq!(ctx.get("$y"), Some(&TypeExpr::INT));
}

#[test]
fn test_join_loop_widens_with_pre() {
    let pre = scope(&[("$i", TypeExpr::INT)]);
    let mut after = pre.fork();
    after.assign("$i", TypeExpr::STRING);
    after.assign("$new", TypeExpr::BOOL);

    let widened = ScopeContext::join_loop(&pre, after);
    assert_eq!(widened.get("$i"), Some(&union(&TypeExpr::INT, &TypeExpr::STRING)));
    assert!(widened.possibly_undefined.contains("$new"));
}

#[test]
fn test_newly_never() {
    let pre = scope(&[("$a", TypeExpr::INT), ("$b", TypeExpr::STRING)]);
    let mut branch = pre.fork();
    branch.bind("$a", TypeExpr::NEVER);

    let never: Vec<&str> = branch.newly_never(&pre).collect();
    assert_eq!(never, vec!["$a"]);
}
