//! Declaration pass: fills an `InMemoryRegistry` from a unit's tree.
//!
//! Runs sequentially over every unit before any checking starts. Docblock
//! problems are not reported here; the checker re-parses each docblock and
//! reports them at the documented node.

use crate::ast::{ClassDecl, FunctionDecl, NodeIndex, NodeKind, PropertyDecl, SyntaxTree};
use crate::docblock::{Docblock, DocblockSite, parse_docblock};
use crate::error::CheckError;
use crate::registry::{
    ClassSignature, FunctionSignature, InMemoryRegistry, ParamSignature, PropertySignature,
};
use docflow_solver::{TypeExpr, parse_type_expr};
use tracing::{debug, trace};

/// Registry name of the anonymous class declared at `index` in `file`.
pub fn anonymous_class_name(file: &str, index: NodeIndex) -> String {
    format!("class@anonymous#{file}:{}", index.0)
}

/// Replace `self`/`static`/`parent` class references with real names.
pub(crate) fn qualify_relative(ty: TypeExpr, class: Option<&str>, parent: Option<&str>) -> TypeExpr {
    match ty {
        TypeExpr::Class { name, args } => {
            let is_self = name.eq_ignore_ascii_case("self") || name.eq_ignore_ascii_case("static");
            let replacement = if is_self {
                class
            } else if name.eq_ignore_ascii_case("parent") {
                parent
            } else {
                None
            };
            let args = args
                .into_iter()
                .map(|arg| qualify_relative(arg, class, parent))
                .collect();
            TypeExpr::Class {
                name: replacement.map_or(name, str::to_string),
                args,
            }
        }
        TypeExpr::Union(members) => docflow_solver::union_all(
            members
                .into_iter()
                .map(|member| qualify_relative(member, class, parent)),
        ),
        scalar => scalar,
    }
}

/// Parse a native hint of the node at `index`.
pub(crate) fn parse_type_hint(
    hint: &str,
    index: NodeIndex,
    class: Option<&str>,
    parent: Option<&str>,
) -> Result<TypeExpr, CheckError> {
    parse_type_expr(hint)
        .map(|ty| qualify_relative(ty, class, parent))
        .map_err(|source| CheckError::InvalidTypeHint { index, source })
}

/// The class a member is declared in.
#[derive(Clone, Copy)]
struct Owner<'d> {
    name: &'d str,
    parent: Option<&'d str>,
}

pub struct SignatureCollector<'a> {
    tree: &'a dyn SyntaxTree,
    file: &'a str,
    registry: &'a mut InMemoryRegistry,
}

impl<'a> SignatureCollector<'a> {
    pub fn new(tree: &'a dyn SyntaxTree, file: &'a str, registry: &'a mut InMemoryRegistry) -> Self {
        Self {
            tree,
            file,
            registry,
        }
    }

    /// Register every function and class declared anywhere in the tree.
    #[tracing::instrument(level = "debug", skip(self), fields(file = %self.file))]
    pub fn collect(mut self) -> Result<(), CheckError> {
        let tree = self.tree;
        let root = tree.root().ok_or(CheckError::MissingRoot)?;

        // (node, is a class member)
        let mut pending: Vec<(NodeIndex, bool)> = vec![(root, false)];
        while let Some((index, is_member)) = pending.pop() {
            let node = tree.get(index).ok_or(CheckError::MissingNode(index))?;
            let docblock = node.docblock();
            match &node.kind {
                NodeKind::Class(decl) => {
                    let doc = docblock
                        .map(|doc| parse_docblock(&doc.text, DocblockSite::Class, doc.line).docblock);
                    self.collect_class(index, decl, doc.as_ref())?;
                }
                NodeKind::Function(decl) if !is_member => {
                    let doc = docblock
                        .map(|doc| parse_docblock(&doc.text, DocblockSite::Function, doc.line).docblock);
                    let signature = function_signature(index, decl, doc.as_ref(), None)?;
                    trace!(name = %signature.name, "function");
                    self.registry.add_function(signature);
                }
                _ => {}
            }
            let is_class = matches!(node.kind, NodeKind::Class(_));
            for child in node.kind.children().into_iter().rev() {
                pending.push((child, is_class));
            }
        }
        Ok(())
    }

    fn collect_class(
        &mut self,
        index: NodeIndex,
        decl: &ClassDecl,
        doc: Option<&Docblock>,
    ) -> Result<(), CheckError> {
        let tree = self.tree;
        let name = decl
            .name
            .clone()
            .unwrap_or_else(|| anonymous_class_name(self.file, index));
        let owner = Owner {
            name: &name,
            parent: decl.parent.as_deref(),
        };

        let mut class = ClassSignature::new(name.clone());
        class.parent = decl.parent.clone();
        class.interfaces = decl.interfaces.clone();
        if let Some(doc) = doc {
            class.deprecated = doc.is_deprecated();
            for (property, ty) in doc.properties() {
                let ty = qualify_relative(ty.clone(), Some(owner.name), owner.parent);
                class.magic_properties.insert(property.to_string(), ty);
            }
        }

        for &member in &decl.members {
            let node = tree.get(member).ok_or(CheckError::MissingNode(member))?;
            match &node.kind {
                NodeKind::Function(method) => {
                    let doc = node.docblock().map(|doc| {
                        parse_docblock(&doc.text, DocblockSite::Function, doc.line).docblock
                    });
                    let signature = function_signature(member, method, doc.as_ref(), Some(owner))?;
                    class.add_method(signature);
                }
                NodeKind::Property(property) => {
                    let doc = node.docblock().map(|doc| {
                        parse_docblock(&doc.text, DocblockSite::Property, doc.line).docblock
                    });
                    class.add_property(property_signature(member, property, doc.as_ref(), owner)?);
                }
                _ => {
                    return Err(CheckError::UnexpectedNode {
                        index: member,
                        expected: "class member",
                    });
                }
            }
        }

        debug!(
            class = %class.name,
            methods = class.methods.len(),
            properties = class.properties.len(),
            "class"
        );
        self.registry.add_class(class);
        Ok(())
    }
}

fn function_signature(
    index: NodeIndex,
    decl: &FunctionDecl,
    doc: Option<&Docblock>,
    owner: Option<Owner<'_>>,
) -> Result<FunctionSignature, CheckError> {
    let class = owner.map(|owner| owner.name);
    let parent = owner.and_then(|owner| owner.parent);

    let mut signature = FunctionSignature::new(decl.name.clone());
    if let Some(hint) = &decl.return_type {
        signature.native_return = Some(parse_type_hint(hint, index, class, parent)?);
    }

    for param in &decl.params {
        let mut sig = ParamSignature::new(param.name.clone());
        if let Some(hint) = &param.type_hint {
            sig.native_type = Some(parse_type_hint(hint, index, class, parent)?);
        }
        sig.doc_type = doc
            .and_then(|doc| doc.param_type(&param.name))
            .map(|ty| qualify_relative(ty.clone(), class, parent));
        sig.has_default = param.default.is_some();
        sig.variadic = param.variadic;
        signature.params.push(sig);
    }

    if let Some(doc) = doc {
        signature.doc_return = doc
            .return_type()
            .map(|ty| qualify_relative(ty.clone(), class, parent));
        signature.deprecated = doc.is_deprecated();
        signature.ignore_nullable_return = doc.ignores_nullable_return();
    }
    Ok(signature)
}

fn property_signature(
    index: NodeIndex,
    decl: &PropertyDecl,
    doc: Option<&Docblock>,
    owner: Owner<'_>,
) -> Result<PropertySignature, CheckError> {
    let native = decl
        .type_hint
        .as_deref()
        .map(|hint| parse_type_hint(hint, index, Some(owner.name), owner.parent))
        .transpose()?;
    let documented = doc
        .and_then(Docblock::var_type)
        .map(|ty| qualify_relative(ty.clone(), Some(owner.name), owner.parent));
    Ok(PropertySignature {
        name: decl.name.clone(),
        declared: documented.or(native),
        deprecated: doc.is_some_and(Docblock::is_deprecated),
    })
}
