//! Syntax-tree interface consumed by the checker.
//!
//! Tokenizing and parsing source text happen upstream. The checker only
//! needs, per node, its kind, its line and the raw doc comment attached to
//! it. `SyntaxTree` is that contract; `NodeArena` is a flat arena
//! implementation with builders for producers and tests.
//!
//! Names follow source spelling: variables keep their `$` (`"$a"`),
//! properties do not (`->foo` is `"foo"`). Native type hints are the raw
//! hint text (`"?int"`, `"array"`, `"self"`).

use docflow_common::comments::is_docblock_comment;
use smallvec::SmallVec;

/// Index of a node within its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

/// Raw doc comment text and the line its `/**` starts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocComment {
    pub text: String,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub line: u32,
    pub doc_comment: Option<DocComment>,
}

impl Node {
    /// The attached comment, when it is a `/** … */` docblock. Plain block
    /// comments carry no annotations.
    pub fn docblock(&self) -> Option<&DocComment> {
        self.doc_comment
            .as_ref()
            .filter(|doc| is_docblock_comment(&doc.text))
    }
}

/// Read access to a parsed unit.
pub trait SyntaxTree {
    fn root(&self) -> Option<NodeIndex>;
    fn get(&self, index: NodeIndex) -> Option<&Node>;
}

// =============================================================================
// Node kinds
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // Statements
    SourceFile {
        statements: Vec<NodeIndex>,
    },
    /// A function, or a method when it is a member of a class.
    Function(FunctionDecl),
    /// A class or interface.
    Class(ClassDecl),
    Property(PropertyDecl),
    ExpressionStatement {
        expr: NodeIndex,
    },
    Echo {
        exprs: Vec<NodeIndex>,
    },
    Return {
        expr: Option<NodeIndex>,
    },
    /// `elseif` chains are nested `If` nodes in `else_branch`.
    If {
        condition: NodeIndex,
        then_branch: Vec<NodeIndex>,
        else_branch: Vec<NodeIndex>,
    },
    While {
        condition: NodeIndex,
        body: Vec<NodeIndex>,
    },
    Foreach {
        subject: NodeIndex,
        key_var: Option<String>,
        value_var: String,
        body: Vec<NodeIndex>,
    },
    /// A statement that only carries a doc comment.
    Nop,

    // Expressions
    Variable {
        name: String,
    },
    Literal(Literal),
    ArrayLiteral {
        items: Vec<ArrayItem>,
    },
    /// `target` is a variable, property fetch or array dim fetch.
    Assign {
        target: NodeIndex,
        value: NodeIndex,
    },
    AssignRef {
        target: NodeIndex,
        source: NodeIndex,
    },
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Unary {
        op: UnaryOp,
        operand: NodeIndex,
    },
    Cast {
        to: CastKind,
        expr: NodeIndex,
    },
    Call {
        name: String,
        args: Vec<NodeIndex>,
    },
    StaticCall {
        class: String,
        method: String,
        args: Vec<NodeIndex>,
    },
    MethodCall {
        object: NodeIndex,
        method: String,
        args: Vec<NodeIndex>,
    },
    New {
        class: ClassRef,
        args: Vec<NodeIndex>,
    },
    PropertyFetch {
        object: NodeIndex,
        property: String,
    },
    ArrayDimFetch {
        array: NodeIndex,
        dim: Option<NodeIndex>,
    },
    ConstFetch {
        name: String,
    },
    /// `then_expr` is `None` for the short form `a ?: b`.
    Ternary {
        condition: NodeIndex,
        then_expr: Option<NodeIndex>,
        else_expr: NodeIndex,
    },
    InstanceOf {
        expr: NodeIndex,
        class: String,
    },
    Empty {
        expr: NodeIndex,
    },
    Isset {
        exprs: Vec<NodeIndex>,
    },
    Yield {
        value: Option<NodeIndex>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayItem {
    pub key: Option<NodeIndex>,
    pub value: NodeIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Identical,
    NotIdentical,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Spaceship,
    And,
    Or,
    Coalesce,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastKind {
    Int,
    Float,
    String,
    Bool,
    Array,
    Object,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassRef {
    Named(String),
    /// `new class { … }`; the index points at the class declaration node.
    Anonymous(NodeIndex),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub return_type: Option<String>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<NodeIndex>>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            body: Some(Vec::new()),
        }
    }

    #[must_use]
    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn returns(mut self, hint: impl Into<String>) -> Self {
        self.return_type = Some(hint.into());
        self
    }

    #[must_use]
    pub fn body(mut self, statements: Vec<NodeIndex>) -> Self {
        self.body = Some(statements);
        self
    }

    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub type_hint: Option<String>,
    pub default: Option<NodeIndex>,
    pub variadic: bool,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
            variadic: false,
        }
    }

    #[must_use]
    pub fn typed(mut self, hint: impl Into<String>) -> Self {
        self.type_hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: NodeIndex) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ClassDecl {
    /// `None` for anonymous classes.
    pub name: Option<String>,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    /// `Function` (method) and `Property` nodes.
    pub members: Vec<NodeIndex>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
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
    pub fn members(mut self, members: Vec<NodeIndex>) -> Self {
        self.members = members;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    /// Without the `$`.
    pub name: String,
    pub type_hint: Option<String>,
    pub default: Option<NodeIndex>,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
        }
    }

    #[must_use]
    pub fn typed(mut self, hint: impl Into<String>) -> Self {
        self.type_hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: NodeIndex) -> Self {
        self.default = Some(default);
        self
    }
}

impl NodeKind {
    /// Direct child nodes, in source order.
    pub fn children(&self) -> SmallVec<[NodeIndex; 4]> {
        let mut out: SmallVec<[NodeIndex; 4]> = SmallVec::new();
        match self {
            NodeKind::SourceFile { statements } => out.extend(statements.iter().copied()),
            NodeKind::Function(decl) => {
                out.extend(decl.params.iter().filter_map(|param| param.default));
                if let Some(body) = &decl.body {
                    out.extend(body.iter().copied());
                }
            }
            NodeKind::Class(decl) => out.extend(decl.members.iter().copied()),
            NodeKind::Property(decl) => out.extend(decl.default),
            NodeKind::ExpressionStatement { expr } => out.push(*expr),
            NodeKind::Echo { exprs } | NodeKind::Isset { exprs } => {
                out.extend(exprs.iter().copied())
            }
            NodeKind::Return { expr } => out.extend(*expr),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(*condition);
                out.extend(then_branch.iter().copied());
                out.extend(else_branch.iter().copied());
            }
            NodeKind::While { condition, body } => {
                out.push(*condition);
                out.extend(body.iter().copied());
            }
            NodeKind::Foreach { subject, body, .. } => {
                out.push(*subject);
                out.extend(body.iter().copied());
            }
            NodeKind::Nop
            | NodeKind::Variable { .. }
            | NodeKind::Literal(_)
            | NodeKind::ConstFetch { .. } => {}
            NodeKind::ArrayLiteral { items } => {
                for item in items {
                    out.extend(item.key);
                    out.push(item.value);
                }
            }
            NodeKind::Assign { target, value } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::AssignRef { target, source } => {
                out.push(*target);
                out.push(*source);
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Unary { operand, .. } => out.push(*operand),
            NodeKind::Cast { expr, .. }
            | NodeKind::InstanceOf { expr, .. }
            | NodeKind::Empty { expr } => out.push(*expr),
            NodeKind::Call { args, .. } | NodeKind::StaticCall { args, .. } => {
                out.extend(args.iter().copied())
            }
            NodeKind::MethodCall { object, args, .. } => {
                out.push(*object);
                out.extend(args.iter().copied());
            }
            NodeKind::New { class, args } => {
                if let ClassRef::Anonymous(decl) = class {
                    out.push(*decl);
                }
                out.extend(args.iter().copied());
            }
            NodeKind::PropertyFetch { object, .. } => out.push(*object),
            NodeKind::ArrayDimFetch { array, dim } => {
                out.push(*array);
                out.extend(*dim);
            }
            NodeKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                out.push(*condition);
                out.extend(*then_expr);
                out.push(*else_expr);
            }
            NodeKind::Yield { value } => out.extend(*value),
        }
        out
    }
}

// =============================================================================
// NodeArena
// =============================================================================

/// Flat node storage. Indices are positions in insertion order.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    root: Option<NodeIndex>,
}

impl SyntaxTree for NodeArena {
    fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0 as usize)
    }
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, kind: NodeKind, line: u32) -> NodeIndex {
        self.push(Node {
            kind,
            line,
            doc_comment: None,
        })
    }

    /// Add a node with a doc comment ending on the line before `line`.
    pub fn add_documented(&mut self, kind: NodeKind, line: u32, doc: &str) -> NodeIndex {
        let doc_lines = doc.lines().count().max(1) as u32;
        self.push(Node {
            kind,
            line,
            doc_comment: Some(DocComment {
                text: doc.to_string(),
                line: line.saturating_sub(doc_lines).max(1),
            }),
        })
    }

    /// Add a node whose doc comment starts on `doc_line`.
    pub fn add_with_doc_at(
        &mut self,
        kind: NodeKind,
        line: u32,
        doc: &str,
        doc_line: u32,
    ) -> NodeIndex {
        self.push(Node {
            kind,
            line,
            doc_comment: Some(DocComment {
                text: doc.to_string(),
                line: doc_line,
            }),
        })
    }

    /// Add the `SourceFile` node and make it the root.
    pub fn set_root(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        let root = self.add(NodeKind::SourceFile { statements }, 1);
        self.root = Some(root);
        root
    }

    fn push(&mut self, node: Node) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(node);
        index
    }

    // =========================================================================
    // Expression builders
    // =========================================================================

    pub fn add_variable(&mut self, name: &str, line: u32) -> NodeIndex {
        self.add(
            NodeKind::Variable {
                name: name.to_string(),
            },
            line,
        )
    }

    pub fn add_int(&mut self, value: i64, line: u32) -> NodeIndex {
        self.add(NodeKind::Literal(Literal::Int(value)), line)
    }

    pub fn add_float(&mut self, value: f64, line: u32) -> NodeIndex {
        self.add(NodeKind::Literal(Literal::Float(value)), line)
    }

    pub fn add_string(&mut self, value: &str, line: u32) -> NodeIndex {
        self.add(NodeKind::Literal(Literal::String(value.to_string())), line)
    }

    pub fn add_bool(&mut self, value: bool, line: u32) -> NodeIndex {
        self.add(NodeKind::Literal(Literal::Bool(value)), line)
    }

    pub fn add_null(&mut self, line: u32) -> NodeIndex {
        self.add(NodeKind::Literal(Literal::Null), line)
    }

    /// A list-style array literal (`["a", "b"]`).
    pub fn add_list(&mut self, values: Vec<NodeIndex>, line: u32) -> NodeIndex {
        let items = values
            .into_iter()
            .map(|value| ArrayItem { key: None, value })
            .collect();
        self.add(NodeKind::ArrayLiteral { items }, line)
    }

    pub fn add_assign(&mut self, target: NodeIndex, value: NodeIndex, line: u32) -> NodeIndex {
        self.add(NodeKind::Assign { target, value }, line)
    }

    /// `$name = value;` as a statement.
    pub fn add_assign_stmt(&mut self, name: &str, value: NodeIndex, line: u32) -> NodeIndex {
        let target = self.add_variable(name, line);
        let assign = self.add_assign(target, value, line);
        self.add_expr_stmt(assign, line)
    }

    pub fn add_binary(
        &mut self,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
        line: u32,
    ) -> NodeIndex {
        self.add(NodeKind::Binary { op, left, right }, line)
    }

    pub fn add_not(&mut self, operand: NodeIndex, line: u32) -> NodeIndex {
        self.add(
            NodeKind::Unary {
                op: UnaryOp::Not,
                operand,
            },
            line,
        )
    }

    pub fn add_call(&mut self, name: &str, args: Vec<NodeIndex>, line: u32) -> NodeIndex {
        self.add(
            NodeKind::Call {
                name: name.to_string(),
                args,
            },
            line,
        )
    }

    pub fn add_static_call(
        &mut self,
        class: &str,
        method: &str,
        args: Vec<NodeIndex>,
        line: u32,
    ) -> NodeIndex {
        self.add(
            NodeKind::StaticCall {
                class: class.to_string(),
                method: method.to_string(),
                args,
            },
            line,
        )
    }

    pub fn add_method_call(
        &mut self,
        object: NodeIndex,
        method: &str,
        args: Vec<NodeIndex>,
        line: u32,
    ) -> NodeIndex {
        self.add(
            NodeKind::MethodCall {
                object,
                method: method.to_string(),
                args,
            },
            line,
        )
    }

    pub fn add_new(&mut self, class: &str, args: Vec<NodeIndex>, line: u32) -> NodeIndex {
        self.add(
            NodeKind::New {
                class: ClassRef::Named(class.to_string()),
                args,
            },
            line,
        )
    }

    pub fn add_property_fetch(&mut self, object: NodeIndex, property: &str, line: u32) -> NodeIndex {
        self.add(
            NodeKind::PropertyFetch {
                object,
                property: property.to_string(),
            },
            line,
        )
    }

    // =========================================================================
    // Statement builders
    // =========================================================================

    pub fn add_expr_stmt(&mut self, expr: NodeIndex, line: u32) -> NodeIndex {
        self.add(NodeKind::ExpressionStatement { expr }, line)
    }

    pub fn add_return(&mut self, expr: Option<NodeIndex>, line: u32) -> NodeIndex {
        self.add(NodeKind::Return { expr }, line)
    }

    pub fn add_echo(&mut self, exprs: Vec<NodeIndex>, line: u32) -> NodeIndex {
        self.add(NodeKind::Echo { exprs }, line)
    }

    pub fn add_if(
        &mut self,
        condition: NodeIndex,
        then_branch: Vec<NodeIndex>,
        else_branch: Vec<NodeIndex>,
        line: u32,
    ) -> NodeIndex {
        self.add(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            line,
        )
    }

    pub fn add_function(&mut self, decl: FunctionDecl, line: u32) -> NodeIndex {
        self.add(NodeKind::Function(decl), line)
    }

    pub fn add_class(&mut self, decl: ClassDecl, line: u32) -> NodeIndex {
        self.add(NodeKind::Class(decl), line)
    }

    pub fn add_property(&mut self, decl: PropertyDecl, line: u32) -> NodeIndex {
        self.add(NodeKind::Property(decl), line)
    }
}
