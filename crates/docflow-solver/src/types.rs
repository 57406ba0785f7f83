//! Type representation.
//!
//! A `TypeExpr` is a plain immutable value. Whether a name is a scalar or a
//! class is decided once, when the type is parsed; nothing downstream
//! re-inspects names to find out.
//!
//! Unions are only built through [`crate::utils::union_all`], which keeps
//! them canonical:
//! - never nested, at least two members, no duplicates
//! - never containing `mixed` (the whole union becomes `mixed`)
//! - never containing `never` (dropped)
//! - sorted by rendered form, with `null` last

use std::fmt;

/// Built-in scalar and pseudo types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Int,
    String,
    Bool,
    /// The literal `false`, a subtype of `bool`.
    False,
    Float,
    Null,
    Mixed,
    Void,
    Callable,
    Object,
    /// Bottom type. The type of a branch that narrowing proved unreachable.
    Never,
}

impl ScalarKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::False => "false",
            ScalarKind::Float => "float",
            ScalarKind::Null => "null",
            ScalarKind::Mixed => "mixed",
            ScalarKind::Void => "void",
            ScalarKind::Callable => "callable",
            ScalarKind::Object => "object",
            ScalarKind::Never => "never",
        }
    }

    /// Resolve a (case-insensitive) scalar keyword, including the
    /// `integer`/`boolean`/`double`/`true` aliases.
    pub fn from_keyword(word: &str) -> Option<ScalarKind> {
        let kind = match word.to_ascii_lowercase().as_str() {
            "int" | "integer" => ScalarKind::Int,
            "string" => ScalarKind::String,
            "bool" | "boolean" | "true" => ScalarKind::Bool,
            "false" => ScalarKind::False,
            "float" | "double" => ScalarKind::Float,
            "null" => ScalarKind::Null,
            "mixed" => ScalarKind::Mixed,
            "void" => ScalarKind::Void,
            "callable" => ScalarKind::Callable,
            "object" => ScalarKind::Object,
            "never" => ScalarKind::Never,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// An immutable type value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Scalar(ScalarKind),
    /// A named class, optionally with generic arguments.
    /// Arrays are `Class { name: "array", args }` with zero, one (value) or
    /// two (key, value) arguments.
    Class { name: String, args: Vec<TypeExpr> },
    /// Canonical union; construct with [`crate::union_all`].
    Union(Vec<TypeExpr>),
}

pub const ARRAY_CLASS: &str = "array";

impl TypeExpr {
    pub const INT: TypeExpr = TypeExpr::Scalar(ScalarKind::Int);
    pub const STRING: TypeExpr = TypeExpr::Scalar(ScalarKind::String);
    pub const BOOL: TypeExpr = TypeExpr::Scalar(ScalarKind::Bool);
    pub const FALSE: TypeExpr = TypeExpr::Scalar(ScalarKind::False);
    pub const FLOAT: TypeExpr = TypeExpr::Scalar(ScalarKind::Float);
    pub const NULL: TypeExpr = TypeExpr::Scalar(ScalarKind::Null);
    pub const MIXED: TypeExpr = TypeExpr::Scalar(ScalarKind::Mixed);
    pub const VOID: TypeExpr = TypeExpr::Scalar(ScalarKind::Void);
    pub const CALLABLE: TypeExpr = TypeExpr::Scalar(ScalarKind::Callable);
    pub const OBJECT: TypeExpr = TypeExpr::Scalar(ScalarKind::Object);
    pub const NEVER: TypeExpr = TypeExpr::Scalar(ScalarKind::Never);

    /// A class type without generic arguments.
    pub fn class(name: impl Into<String>) -> TypeExpr {
        TypeExpr::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::Class {
            name: name.into(),
            args,
        }
    }

    /// `array` with no known key or value type.
    pub fn array() -> TypeExpr {
        TypeExpr::class(ARRAY_CLASS)
    }

    /// `array<V>`
    pub fn array_of(value: TypeExpr) -> TypeExpr {
        TypeExpr::generic(ARRAY_CLASS, vec![value])
    }

    /// `array<K, V>`
    pub fn keyed_array(key: TypeExpr, value: TypeExpr) -> TypeExpr {
        TypeExpr::generic(ARRAY_CLASS, vec![key, value])
    }

    /// `T|null`
    pub fn nullable(inner: TypeExpr) -> TypeExpr {
        crate::utils::union(&inner, &TypeExpr::NULL)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_mixed(&self) -> bool {
        matches!(self, TypeExpr::Scalar(ScalarKind::Mixed))
    }

    pub fn is_never(&self) -> bool {
        matches!(self, TypeExpr::Scalar(ScalarKind::Never))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypeExpr::Scalar(ScalarKind::Null))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeExpr::Scalar(ScalarKind::Void))
    }

    /// `null` itself, or a union with a `null` member.
    pub fn is_nullable(&self) -> bool {
        self.members().iter().any(TypeExpr::is_null)
    }

    /// A class type named `array`, with any arguments.
    pub fn is_array(&self) -> bool {
        matches!(self, TypeExpr::Class { name, .. } if name.eq_ignore_ascii_case(ARRAY_CLASS))
    }

    /// A class type other than `array`.
    pub fn is_object_class(&self) -> bool {
        matches!(self, TypeExpr::Class { .. }) && !self.is_array()
    }

    /// The class name of a non-array class type.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Class { name, .. } if !self.is_array() => Some(name),
            _ => None,
        }
    }

    /// Union members, or the type itself as a single-member slice.
    pub fn members(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    /// Remove `null` from the type. `null` alone becomes `never`.
    pub fn without_null(&self) -> TypeExpr {
        if !self.is_nullable() {
            return self.clone();
        }
        crate::utils::union_or_single(
            self.members()
                .iter()
                .filter(|member| !member.is_null())
                .cloned()
                .collect(),
        )
    }

    /// Whether any member is the class `name` (case-insensitive).
    pub fn contains_class(&self, name: &str) -> bool {
        self.members().iter().any(|member| {
            matches!(member, TypeExpr::Class { name: own, .. } if own.eq_ignore_ascii_case(name))
        })
    }

    /// Value type of an array, or the union of value types of the array
    /// members of a union. `None` when no member is an array.
    pub fn array_value_type(&self) -> Option<TypeExpr> {
        self.array_part(|args| args.last().cloned())
    }

    /// Key type of an array. Arrays declared without a key type have `mixed` keys.
    pub fn array_key_type(&self) -> Option<TypeExpr> {
        self.array_part(|args| match args {
            [key, _] => Some(key.clone()),
            _ => None,
        })
    }

    fn array_part(&self, pick: impl Fn(&[TypeExpr]) -> Option<TypeExpr>) -> Option<TypeExpr> {
        let parts: Vec<TypeExpr> = self
            .members()
            .iter()
            .filter_map(|member| match member {
                TypeExpr::Class { args, .. } if member.is_array() => {
                    Some(pick(args).unwrap_or(TypeExpr::MIXED))
                }
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(crate::utils::union_all(parts))
    }
}

impl From<ScalarKind> for TypeExpr {
    fn from(kind: ScalarKind) -> Self {
        TypeExpr::Scalar(kind)
    }
}
