//! Declared signatures of functions, classes, methods and properties.
//!
//! The registry is populated before any unit is checked (see
//! `SignatureCollector`) and is read-only afterwards, so one instance can be
//! shared by all checking threads. Names are stored fully qualified and
//! looked up case-insensitively, with any leading `\` ignored.

use docflow_common::limits::MAX_CLASS_ANCESTRY_DEPTH;
use docflow_solver::{TypeExpr, TypeResolver};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

// =============================================================================
// Signatures
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ParamSignature {
    /// With the `$`.
    pub name: String,
    pub native_type: Option<TypeExpr>,
    pub doc_type: Option<TypeExpr>,
    pub has_default: bool,
    pub variadic: bool,
}

impl ParamSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: None,
            doc_type: None,
            has_default: false,
            variadic: false,
        }
    }

    #[must_use]
    pub fn typed(mut self, ty: TypeExpr) -> Self {
        self.native_type = Some(ty);
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.has_default = true;
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Docblock type when present, else the native hint.
    pub fn declared_type(&self) -> Option<&TypeExpr> {
        self.doc_type.as_ref().or(self.native_type.as_ref())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<ParamSignature>,
    pub native_return: Option<TypeExpr>,
    pub doc_return: Option<TypeExpr>,
    pub deprecated: bool,
    pub ignore_nullable_return: bool,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            native_return: None,
            doc_return: None,
            deprecated: false,
            ignore_nullable_return: false,
        }
    }

    #[must_use]
    pub fn param(mut self, param: ParamSignature) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn returns(mut self, ty: TypeExpr) -> Self {
        self.native_return = Some(ty);
        self
    }

    /// Docblock return type when present, else the native one.
    pub fn declared_return(&self) -> Option<&TypeExpr> {
        self.doc_return.as_ref().or(self.native_return.as_ref())
    }

    /// The type a caller sees. `@psalm-ignore-nullable-return` hides `null`.
    pub fn call_return_type(&self) -> TypeExpr {
        let Some(declared) = self.declared_return() else {
            return TypeExpr::MIXED;
        };
        if declared.is_void() {
            return TypeExpr::NULL;
        }
        if self.ignore_nullable_return {
            return declared.without_null();
        }
        declared.clone()
    }

    pub fn required_param_count(&self) -> usize {
        self.params
            .iter()
            .filter(|param| !param.has_default && !param.variadic)
            .count()
    }

    /// `None` when the last parameter is variadic.
    pub fn max_param_count(&self) -> Option<usize> {
        if self.params.iter().any(|param| param.variadic) {
            return None;
        }
        Some(self.params.len())
    }

    /// The parameter an argument at `position` binds to.
    pub fn param_for_argument(&self, position: usize) -> Option<&ParamSignature> {
        self.params
            .get(position)
            .or_else(|| self.params.last().filter(|param| param.variadic))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertySignature {
    /// Without the `$`.
    pub name: String,
    pub declared: Option<TypeExpr>,
    pub deprecated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassSignature {
    pub name: String,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub deprecated: bool,
    /// Keyed by lower-cased method name.
    pub methods: IndexMap<String, FunctionSignature>,
    pub properties: IndexMap<String, PropertySignature>,
    /// Properties declared with `@property` on the class docblock.
    pub magic_properties: IndexMap<String, TypeExpr>,
}

impl ClassSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            interfaces: Vec::new(),
            deprecated: false,
            methods: IndexMap::new(),
            properties: IndexMap::new(),
            magic_properties: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn method(mut self, method: FunctionSignature) -> Self {
        self.add_method(method);
        self
    }

    pub fn add_method(&mut self, method: FunctionSignature) {
        self.methods.insert(method.name.to_ascii_lowercase(), method);
    }

    pub fn add_property(&mut self, property: PropertySignature) {
        self.properties.insert(property.name.clone(), property);
    }

    pub fn own_method(&self, name: &str) -> Option<&FunctionSignature> {
        self.methods.get(&name.to_ascii_lowercase())
    }
}

/// Result of a property lookup through the class hierarchy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyLookup<'a> {
    Declared {
        class: &'a ClassSignature,
        property: &'a PropertySignature,
    },
    Magic {
        class: &'a ClassSignature,
        ty: &'a TypeExpr,
    },
}

// =============================================================================
// Registry trait
// =============================================================================

/// Read-only access to declared signatures, shared across checking threads.
pub trait SignatureRegistry: Sync {
    fn resolve_function(&self, name: &str) -> Option<&FunctionSignature>;
    fn resolve_class(&self, name: &str) -> Option<&ClassSignature>;

    /// Find `method` on `class` or its ancestors (parents first, then interfaces).
    fn resolve_method(&self, class: &str, method: &str) -> Option<(&ClassSignature, &FunctionSignature)> {
        self.ancestry(class)
            .into_iter()
            .find_map(|sig| sig.own_method(method).map(|found| (sig, found)))
    }

    /// Find a declared or `@property` property on `class` or its parents.
    fn resolve_property(&self, class: &str, property: &str) -> Option<PropertyLookup<'_>> {
        for sig in self.ancestry(class) {
            if let Some(declared) = sig.properties.get(property) {
                return Some(PropertyLookup::Declared {
                    class: sig,
                    property: declared,
                });
            }
            if let Some(ty) = sig.magic_properties.get(property) {
                return Some(PropertyLookup::Magic { class: sig, ty });
            }
        }
        None
    }

    /// `class` followed by its parents, then every implemented interface.
    /// Unknown classes and cycles end the walk.
    fn ancestry(&self, class: &str) -> Vec<&ClassSignature> {
        let mut chain: Vec<&ClassSignature> = Vec::new();
        let mut pending: Vec<String> = vec![class.to_string()];
        while let Some(name) = pending.pop() {
            if chain.len() as u32 >= MAX_CLASS_ANCESTRY_DEPTH {
                break;
            }
            let Some(sig) = self.resolve_class(&name) else {
                continue;
            };
            if chain.iter().any(|seen| seen.name.eq_ignore_ascii_case(&sig.name)) {
                continue;
            }
            chain.push(sig);
            pending.extend(sig.interfaces.iter().rev().cloned());
            pending.extend(sig.parent.iter().cloned());
        }
        chain
    }

    fn is_class_descendant(&self, child: &str, ancestor: &str) -> bool {
        self.ancestry(child)
            .iter()
            .skip(1)
            .any(|sig| normalize(&sig.name) == normalize(ancestor))
    }
}

/// Lookup key: leading `\` removed, lower-cased.
pub fn normalize(name: &str) -> String {
    name.strip_prefix('\\').unwrap_or(name).to_ascii_lowercase()
}

/// Adapts a `SignatureRegistry` to the solver's `TypeResolver`.
#[derive(Clone, Copy)]
pub struct RegistryResolver<'a> {
    registry: &'a dyn SignatureRegistry,
}

impl<'a> RegistryResolver<'a> {
    pub fn new(registry: &'a dyn SignatureRegistry) -> Self {
        Self { registry }
    }
}

impl TypeResolver for RegistryResolver<'_> {
    fn is_class_descendant(&self, child: &str, ancestor: &str) -> bool {
        self.registry.is_class_descendant(child, ancestor)
    }
}

// =============================================================================
// InMemoryRegistry
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct InMemoryRegistry {
    functions: FxHashMap<String, FunctionSignature>,
    classes: FxHashMap<String, ClassSignature>,
}

impl InMemoryRegistry {
    /// An empty registry, without builtins.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-seeded with the builtin functions and classes.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_builtins(&mut registry);
        registry
    }

    pub fn add_function(&mut self, signature: FunctionSignature) {
        self.functions.insert(normalize(&signature.name), signature);
    }

    pub fn add_class(&mut self, signature: ClassSignature) {
        self.classes.insert(normalize(&signature.name), signature);
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl SignatureRegistry for InMemoryRegistry {
    fn resolve_function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(&normalize(name))
    }

    fn resolve_class(&self, name: &str) -> Option<&ClassSignature> {
        self.classes.get(&normalize(name))
    }
}
