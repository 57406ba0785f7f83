//! Subtype relation.
//!
//! `SubtypeChecker` answers "can a value of type `source` be used where
//! `target` is declared". It is deliberately lenient where the analyzer has
//! no information: `mixed` on either side always matches, and missing
//! generic arguments behave as `mixed`.
//!
//! Class ancestry comes from a `TypeResolver`, so the solver never needs to
//! know how classes are declared.

use crate::types::{ScalarKind, TypeExpr};
use docflow_common::limits::MAX_CLASS_ANCESTRY_DEPTH;
use tracing::trace;

/// Class hierarchy queries needed by subtyping and narrowing.
pub trait TypeResolver {
    /// Whether `child` extends or implements `ancestor`, directly or
    /// transitively. Names compare case-insensitively.
    fn is_class_descendant(&self, child: &str, ancestor: &str) -> bool;
}

/// A resolver that knows no classes. Only identical names relate.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopResolver;

impl TypeResolver for NoopResolver {
    fn is_class_descendant(&self, _child: &str, _ancestor: &str) -> bool {
        false
    }
}

/// Subtype check against the empty class hierarchy.
pub fn is_subtype(source: &TypeExpr, target: &TypeExpr) -> bool {
    SubtypeChecker::new(&NoopResolver).is_subtype_of(source, target)
}

pub struct SubtypeChecker<'a, R: TypeResolver + ?Sized> {
    resolver: &'a R,
    depth: u32,
}

impl<'a, R: TypeResolver + ?Sized> SubtypeChecker<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver, depth: 0 }
    }

    pub fn is_subtype_of(&mut self, source: &TypeExpr, target: &TypeExpr) -> bool {
        if source == target {
            return true;
        }
        if source.is_mixed() || target.is_mixed() || source.is_never() {
            return true;
        }
        if self.depth > MAX_CLASS_ANCESTRY_DEPTH {
            trace!(%source, %target, "subtype depth exceeded, assuming compatible");
            return true;
        }

        self.depth += 1;
        let result = self.check(source, target);
        self.depth -= 1;
        result
    }

    fn check(&mut self, source: &TypeExpr, target: &TypeExpr) -> bool {
        // Union source: every alternative must fit.
        if let TypeExpr::Union(members) = source {
            return members.iter().all(|member| self.is_subtype_of(member, target));
        }
        // Union target: the single source alternative must fit some member.
        if let TypeExpr::Union(members) = target {
            return members.iter().any(|member| self.is_subtype_of(source, member));
        }

        match (source, target) {
            (TypeExpr::Scalar(s), TypeExpr::Scalar(t)) => scalar_subtype(*s, *t),
            (TypeExpr::Class { .. }, TypeExpr::Scalar(ScalarKind::Object)) => !source.is_array(),
            (TypeExpr::Class { name, .. }, TypeExpr::Scalar(ScalarKind::Callable)) => {
                name.eq_ignore_ascii_case("Closure")
                    || self.resolver.is_class_descendant(name, "Closure")
            }
            (
                TypeExpr::Class {
                    name: s_name,
                    args: s_args,
                },
                TypeExpr::Class {
                    name: t_name,
                    args: t_args,
                },
            ) => self.check_class(s_name, s_args, t_name, t_args),
            _ => false,
        }
    }

    fn check_class(
        &mut self,
        s_name: &str,
        s_args: &[TypeExpr],
        t_name: &str,
        t_args: &[TypeExpr],
    ) -> bool {
        if !s_name.eq_ignore_ascii_case(t_name) {
            return self.resolver.is_class_descendant(s_name, t_name);
        }
        if s_args.is_empty() || t_args.is_empty() {
            return true;
        }

        if s_name.eq_ignore_ascii_case(crate::types::ARRAY_CLASS) {
            // Value types always; key types only when both sides declare them.
            let (Some(s_value), Some(t_value)) = (s_args.last(), t_args.last()) else {
                return true;
            };
            if !self.is_subtype_of(s_value, t_value) {
                return false;
            }
            if let ([s_key, _], [t_key, _]) = (s_args, t_args) {
                return self.is_subtype_of(s_key, t_key);
            }
            return true;
        }

        s_args
            .iter()
            .zip(t_args)
            .all(|(s_arg, t_arg)| self.is_subtype_of(s_arg, t_arg))
    }
}

fn scalar_subtype(source: ScalarKind, target: ScalarKind) -> bool {
    source == target
        || matches!(
            (source, target),
            (ScalarKind::False, ScalarKind::Bool) | (ScalarKind::Int, ScalarKind::Float)
        )
}
