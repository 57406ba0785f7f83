//! Per-unit variable scope.
//!
//! `ScopeContext` is a value: branches get their own copy via `fork`, and
//! reconverging branches are combined by `join` into a fresh value. No two
//! branches ever share a mutable scope.

use docflow_solver::{TypeExpr, union_all};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScopeContext {
    /// Variable name (with `$`) to its current type, in first-assignment order.
    pub vars_in_scope: IndexMap<String, TypeExpr>,
    /// Variables assigned on some paths only.
    pub possibly_undefined: FxHashSet<String>,
    /// Reference links created by `$a =& $b`, stored both ways.
    references: FxHashMap<String, FxHashSet<String>>,
    /// The path through this scope has returned.
    pub exited: bool,
}

impl ScopeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&TypeExpr> {
        self.vars_in_scope.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.vars_in_scope.contains_key(name)
    }

    /// Assign `ty` to `name` and to every variable referencing it.
    pub fn assign(&mut self, name: &str, ty: TypeExpr) {
        let linked: Vec<String> = self
            .references
            .get(name)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default();
        for other in linked {
            self.bind(&other, ty.clone());
        }
        self.bind(name, ty);
    }

    /// Replace `name`'s type without touching its references.
    /// Used for narrowing, which only affects the tested name.
    pub fn bind(&mut self, name: &str, ty: TypeExpr) {
        self.possibly_undefined.remove(name);
        self.vars_in_scope.insert(name.to_string(), ty);
    }

    /// Link `a` and `b` as references to the same value.
    pub fn link_references(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        // `a` leaves whatever group it was in.
        if let Some(old) = self.references.remove(a) {
            for other in old {
                if let Some(group) = self.references.get_mut(&other) {
                    group.remove(a);
                }
            }
        }
        let mut group: FxHashSet<String> = self.references.get(b).cloned().unwrap_or_default();
        group.insert(b.to_string());
        for member in &group {
            self.references
                .entry(member.clone())
                .or_default()
                .insert(a.to_string());
        }
        self.references.insert(a.to_string(), group);
    }

    pub fn references_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.references
            .get(name)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    /// A copy for one branch.
    pub fn fork(&self) -> ScopeContext {
        self.clone()
    }

    /// Combine branch results at a reconvergence point.
    ///
    /// Branches that exited do not contribute. A variable present in every
    /// live branch gets the union of its types; one present in only some
    /// is unioned across those and marked possibly-undefined. When every
    /// branch exited, the result is `pre` marked exited.
    pub fn join(pre: &ScopeContext, branches: Vec<ScopeContext>) -> ScopeContext {
        let live: Vec<ScopeContext> = branches.into_iter().filter(|b| !b.exited).collect();
        if live.is_empty() {
            trace!("all branches exited");
            let mut result = pre.clone();
            result.exited = true;
            return result;
        }

        let mut names: Vec<&String> = Vec::new();
        for branch in &live {
            for name in branch.vars_in_scope.keys() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut result = ScopeContext::default();

        for name in names {
            let present: Vec<TypeExpr> = live
                .iter()
                .filter_map(|branch| branch.get(name).cloned())
                .collect();
            if present.len() < live.len() {
                debug!(%name, "assigned on some branches only");
                result.possibly_undefined.insert(name.clone());
            }
            result.vars_in_scope.insert(name.clone(), union_all(present));
        }

        for branch in &live {
            result
                .possibly_undefined
                .extend(branch.possibly_undefined.iter().cloned());
            for (name, group) in &branch.references {
                result
                    .references
                    .entry(name.clone())
                    .or_default()
                    .extend(group.iter().cloned());
            }
        }

        result
    }

    /// Join a loop's pre-state with the state after one body pass.
    pub fn join_loop(pre: &ScopeContext, after_body: ScopeContext) -> ScopeContext {
        let mut joined = ScopeContext::join(pre, vec![pre.clone(), after_body]);
        joined.exited = pre.exited;
        joined
    }

    /// Names whose type became `never` compared to `pre`.
    pub fn newly_never<'a>(&'a self, pre: &'a ScopeContext) -> impl Iterator<Item = &'a str> {
        self.vars_in_scope.iter().filter_map(move |(name, ty)| {
            let was_never = pre.get(name).is_some_and(TypeExpr::is_never);
            (ty.is_never() && !was_never).then_some(name.as_str())
        })
    }
}
