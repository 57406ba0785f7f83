//! Type narrowing by runtime type tests.
//!
//! Given a variable's type and a test such as `is_string($x)` or
//! `$x instanceof A`, `NarrowingContext::narrow` splits the type into the
//! part that passes the test and the part that fails it. Each union member
//! is classified on its own; a member that can go either way lands on both
//! sides. A side that ends up empty is `never`, which tells the driver the
//! branch is unreachable.

use crate::subtype::TypeResolver;
use crate::types::{ScalarKind, TypeExpr};
use crate::utils::union_all;
use smallvec::SmallVec;
use tracing::{Level, span, trace};

/// A runtime type test that the analyzer understands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTest {
    IsString,
    IsInt,
    IsFloat,
    IsBool,
    IsArray,
    IsObject,
    IsCallable,
    IsNull,
    /// `is_scalar`: int, float, string or bool.
    IsScalar,
    InstanceOf(String),
    /// Plain truthiness (`if ($x)`, `!empty($x)`).
    Truthy,
    /// `$x === false`
    IdenticalFalse,
    /// `$x === null`
    IdenticalNull,
}

impl TypeTest {
    /// The test performed by a type-checking builtin such as `is_string`.
    pub fn from_function_name(name: &str) -> Option<TypeTest> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        let test = match name.to_ascii_lowercase().as_str() {
            "is_string" => TypeTest::IsString,
            "is_int" | "is_integer" | "is_long" => TypeTest::IsInt,
            "is_float" | "is_double" => TypeTest::IsFloat,
            "is_bool" => TypeTest::IsBool,
            "is_array" => TypeTest::IsArray,
            "is_object" => TypeTest::IsObject,
            "is_callable" => TypeTest::IsCallable,
            "is_null" => TypeTest::IsNull,
            "is_scalar" => TypeTest::IsScalar,
            _ => return None,
        };
        Some(test)
    }

    /// What a value is known to be after passing the test, when it was `mixed` before.
    fn asserted_type(&self) -> TypeExpr {
        match self {
            TypeTest::IsString => TypeExpr::STRING,
            TypeTest::IsInt => TypeExpr::INT,
            TypeTest::IsFloat => TypeExpr::FLOAT,
            TypeTest::IsBool => TypeExpr::BOOL,
            TypeTest::IsArray => TypeExpr::array(),
            TypeTest::IsObject => TypeExpr::OBJECT,
            TypeTest::IsCallable => TypeExpr::CALLABLE,
            TypeTest::IsNull | TypeTest::IdenticalNull => TypeExpr::NULL,
            TypeTest::IsScalar => union_all([
                TypeExpr::BOOL,
                TypeExpr::FLOAT,
                TypeExpr::INT,
                TypeExpr::STRING,
            ]),
            TypeTest::InstanceOf(class) => TypeExpr::class(class.clone()),
            TypeTest::Truthy => TypeExpr::MIXED,
            TypeTest::IdenticalFalse => TypeExpr::FALSE,
        }
    }

    /// The type a passing test proves, for parameter inference.
    /// `None` for tests that prove nothing useful (truthiness).
    pub fn assertion(&self) -> Option<TypeExpr> {
        match self {
            TypeTest::Truthy => None,
            other => Some(other.asserted_type()),
        }
    }
}

/// Result of narrowing one type by one test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Narrowed {
    pub when_true: TypeExpr,
    pub when_false: TypeExpr,
}

impl Narrowed {
    /// Swap the branches, for a negated test.
    pub fn negate(self) -> Narrowed {
        Narrowed {
            when_true: self.when_false,
            when_false: self.when_true,
        }
    }
}

/// Which side(s) of a test a single union member can land on.
enum Split {
    TrueOnly,
    FalseOnly,
    Both,
    /// Lands on the true side as `.0` and stays unchanged on the false side.
    Refined(TypeExpr),
    /// Lands on the true side as `.0` and on the false side as `.1`.
    Partitioned(TypeExpr, TypeExpr),
}

pub struct NarrowingContext<'a, R: TypeResolver + ?Sized> {
    resolver: &'a R,
}

impl<'a, R: TypeResolver + ?Sized> NarrowingContext<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Split `source` by `test` into its passing and failing parts.
    pub fn narrow(&self, source: &TypeExpr, test: &TypeTest) -> Narrowed {
        let _span = span!(Level::TRACE, "narrow", %source, ?test).entered();

        if source.is_never() {
            return Narrowed {
                when_true: TypeExpr::NEVER,
                when_false: TypeExpr::NEVER,
            };
        }

        let mut when_true: SmallVec<[TypeExpr; 4]> = SmallVec::new();
        let mut when_false: SmallVec<[TypeExpr; 4]> = SmallVec::new();

        for member in source.members() {
            match self.split(member, test) {
                Split::TrueOnly => when_true.push(member.clone()),
                Split::FalseOnly => when_false.push(member.clone()),
                Split::Both => {
                    when_true.push(member.clone());
                    when_false.push(member.clone());
                }
                Split::Refined(refined) => {
                    when_true.push(refined);
                    when_false.push(member.clone());
                }
                Split::Partitioned(passing, failing) => {
                    when_true.push(passing);
                    when_false.push(failing);
                }
            }
        }

        let narrowed = Narrowed {
            when_true: union_all(when_true),
            when_false: union_all(when_false),
        };
        trace!(when_true = %narrowed.when_true, when_false = %narrowed.when_false, "narrowed");
        narrowed
    }

    fn split(&self, member: &TypeExpr, test: &TypeTest) -> Split {
        if member.is_mixed() {
            return match test {
                TypeTest::Truthy => Split::Both,
                other => Split::Refined(other.asserted_type()),
            };
        }

        match test {
            TypeTest::IsString => when(matches!(member, TypeExpr::Scalar(ScalarKind::String))),
            TypeTest::IsInt => when(matches!(member, TypeExpr::Scalar(ScalarKind::Int))),
            TypeTest::IsFloat => when(matches!(member, TypeExpr::Scalar(ScalarKind::Float))),
            TypeTest::IsBool => when(matches!(
                member,
                TypeExpr::Scalar(ScalarKind::Bool | ScalarKind::False)
            )),
            TypeTest::IsNull | TypeTest::IdenticalNull => when(member.is_null()),
            TypeTest::IsArray => when(member.is_array()),
            TypeTest::IsScalar => when(matches!(
                member,
                TypeExpr::Scalar(
                    ScalarKind::Int
                        | ScalarKind::Float
                        | ScalarKind::String
                        | ScalarKind::Bool
                        | ScalarKind::False
                )
            )),
            TypeTest::IsObject => match member {
                TypeExpr::Scalar(ScalarKind::Object) => Split::TrueOnly,
                TypeExpr::Scalar(ScalarKind::Callable) => Split::Both,
                _ => when(member.is_object_class()),
            },
            TypeTest::IsCallable => match member {
                TypeExpr::Scalar(ScalarKind::Callable) => Split::TrueOnly,
                TypeExpr::Scalar(ScalarKind::String | ScalarKind::Object) => Split::Both,
                TypeExpr::Class { .. } if member.is_array() => Split::Both,
                TypeExpr::Class { name, .. } => when(
                    name.eq_ignore_ascii_case("Closure")
                        || self.resolver.is_class_descendant(name, "Closure"),
                ),
                _ => Split::FalseOnly,
            },
            TypeTest::InstanceOf(class) => self.split_instanceof(member, class),
            TypeTest::Truthy => match member {
                TypeExpr::Scalar(ScalarKind::Null | ScalarKind::False | ScalarKind::Void) => {
                    Split::FalseOnly
                }
                TypeExpr::Scalar(ScalarKind::Bool) => {
                    Split::Partitioned(TypeExpr::BOOL, TypeExpr::FALSE)
                }
                TypeExpr::Scalar(ScalarKind::Object | ScalarKind::Callable) => Split::TrueOnly,
                TypeExpr::Class { .. } if member.is_object_class() => Split::TrueOnly,
                _ => Split::Both,
            },
            TypeTest::IdenticalFalse => match member {
                TypeExpr::Scalar(ScalarKind::False) => Split::TrueOnly,
                TypeExpr::Scalar(ScalarKind::Bool) => Split::Refined(TypeExpr::FALSE),
                _ => Split::FalseOnly,
            },
        }
    }

    fn split_instanceof(&self, member: &TypeExpr, class: &str) -> Split {
        match member {
            TypeExpr::Scalar(ScalarKind::Object) => Split::Refined(TypeExpr::class(class)),
            TypeExpr::Class { name, .. } if !member.is_array() => {
                if name.eq_ignore_ascii_case(class)
                    || self.resolver.is_class_descendant(name, class)
                {
                    Split::TrueOnly
                } else if self.resolver.is_class_descendant(class, name) {
                    Split::Refined(TypeExpr::class(class))
                } else {
                    Split::FalseOnly
                }
            }
            _ => Split::FalseOnly,
        }
    }
}

fn when(passes: bool) -> Split {
    if passes {
        Split::TrueOnly
    } else {
        Split::FalseOnly
    }
}
