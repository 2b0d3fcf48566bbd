//! Syntax Tree - the closed grammar subset the analyzer understands
//!
//! Front-ends (tree-sitter, ESTree JSON) lower their trees into an [`Ast`]:
//! an arena of [`SyntaxNode`]s addressed by [`NodeId`]. A `NodeId` is the
//! node's identity; the symbol graph stores it as a back-reference and the
//! export oracle compares it, nothing else.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Deepest expression nesting front-ends lower and the resolver follows;
/// anything below is treated as unsupported
pub const MAX_NESTING: usize = 256;

/// Handle to a node inside an [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Source lines covered by a node (1-based, 0 when unknown)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

impl Span {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self { start_line, end_line }
    }
}

/// `var`, `let` or `const`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "var" => Some(DeclarationKind::Var),
            "let" => Some(DeclarationKind::Let),
            "const" => Some(DeclarationKind::Const),
            _ => None,
        }
    }

    /// `var` declarations land on the global object as well
    pub fn is_implicitly_global(&self) -> bool {
        matches!(self, DeclarationKind::Var)
    }
}

/// Scalar value carried by a `Literal` node
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    /// Regex, template, bigint... kept as raw source text
    Other(String),
}

impl LiteralValue {
    /// The property key this literal produces when used as `obj[lit]`.
    ///
    /// Falsy scalars (`""`, `0`, `false`, `null`) never produce a key.
    pub fn as_key(&self) -> Option<String> {
        match self {
            LiteralValue::String(s) if !s.is_empty() => Some(s.clone()),
            LiteralValue::Number(n) if *n != 0.0 && !n.is_nan() => Some(format_number(*n)),
            LiteralValue::Boolean(true) => Some("true".to_string()),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub id: NodeId,
    pub init: Option<NodeId>,
}

/// A `key: value` entry of an object expression
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: NodeId,
    pub value: NodeId,
    pub computed: bool,
}

/// A method inside a class body; `value` is the method's function
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDefinition {
    pub key: NodeId,
    pub value: NodeId,
    pub computed: bool,
}

/// Node kinds of the supported grammar subset
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Program { body: Vec<NodeId> },
    ExpressionStatement { expression: NodeId },
    VariableDeclaration { kind: DeclarationKind, declarations: Vec<VariableDeclarator> },
    AssignmentExpression { left: NodeId, right: NodeId },
    Identifier { name: String },
    MemberExpression { object: NodeId, property: NodeId, computed: bool },
    FunctionDeclaration { id: Option<NodeId> },
    FunctionExpression { id: Option<NodeId> },
    ArrowFunctionExpression,
    ClassDeclaration { id: Option<NodeId>, body: NodeId },
    ClassBody { body: Vec<MethodDefinition> },
    ObjectExpression { properties: Vec<Property> },
    Literal { value: LiteralValue },
    ExportDefaultDeclaration { declaration: NodeId },
    ExportNamedDeclaration { declaration: Option<NodeId>, specifiers: Vec<NodeId> },
    ExportSpecifier { local: NodeId },
    /// Anything outside the subset, tagged with the front-end's kind name
    Other { kind: String },
}

impl NodeKind {
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::FunctionExpression { .. } => "FunctionExpression",
            NodeKind::ArrowFunctionExpression => "ArrowFunctionExpression",
            NodeKind::ClassDeclaration { .. } => "ClassDeclaration",
            NodeKind::ClassBody { .. } => "ClassBody",
            NodeKind::ObjectExpression { .. } => "ObjectExpression",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::ExportDefaultDeclaration { .. } => "ExportDefaultDeclaration",
            NodeKind::ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
            NodeKind::ExportSpecifier { .. } => "ExportSpecifier",
            NodeKind::Other { kind } => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
}

/// An immutable syntax tree for one module
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<SyntaxNode>,
    program: NodeId,
}

impl Ast {
    /// The `Program` root
    pub fn program(&self) -> NodeId {
        self.program
    }

    /// Top-level statements of the module body
    pub fn body(&self) -> &[NodeId] {
        match self.kind(self.program) {
            NodeKind::Program { body } => body,
            _ => &[],
        }
    }

    pub fn get(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.get(id).kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Name a non-computed key contributes: identifier name or literal scalar
    pub fn static_key(&self, key: NodeId) -> Option<String> {
        match self.kind(key) {
            NodeKind::Identifier { name } => Some(name.clone()),
            NodeKind::Literal { value } => value.as_key(),
            _ => None,
        }
    }

    /// Declaration-like nodes a lint rule would ask about, in source order.
    ///
    /// Each candidate names the node whose identity the symbol graph records:
    /// the declaration for functions, the method's function value for class
    /// methods, and the initializer for variables.
    pub fn candidates(&self) -> Vec<Candidate> {
        let names = self.inferred_names();
        let mut candidates = Vec::new();

        for id in self.ids() {
            let line = self.span(id).start_line;
            match self.kind(id) {
                NodeKind::FunctionDeclaration { id: name } => {
                    let name = name
                        .and_then(|n| self.identifier_name(n))
                        .unwrap_or("default")
                        .to_string();
                    candidates.push(Candidate { node: id, name, kind: CandidateKind::Function, line });
                }
                NodeKind::ClassDeclaration { id: name, body } => {
                    let class_name = name
                        .and_then(|n| self.identifier_name(n))
                        .or_else(|| names.get(&id).map(String::as_str))
                        .unwrap_or("default")
                        .to_string();
                    if let NodeKind::ClassBody { body: methods } = self.kind(*body) {
                        for method in methods {
                            let method_name = if method.computed {
                                None
                            } else {
                                self.static_key(method.key)
                            };
                            candidates.push(Candidate {
                                node: method.value,
                                name: format!(
                                    "{}.{}",
                                    class_name,
                                    method_name.as_deref().unwrap_or("<computed>")
                                ),
                                kind: CandidateKind::Method,
                                line: self.span(method.value).start_line,
                            });
                        }
                    }
                    candidates.push(Candidate { node: id, name: class_name, kind: CandidateKind::Class, line });
                }
                NodeKind::FunctionExpression { .. } | NodeKind::ArrowFunctionExpression => {
                    if self.is_method_value(id) {
                        continue;
                    }
                    let name = names
                        .get(&id)
                        .cloned()
                        .unwrap_or_else(|| "<anonymous>".to_string());
                    candidates.push(Candidate { node: id, name, kind: CandidateKind::Function, line });
                }
                NodeKind::ObjectExpression { .. } => {
                    if let Some(name) = names.get(&id) {
                        candidates.push(Candidate {
                            node: id,
                            name: name.clone(),
                            kind: CandidateKind::Object,
                            line,
                        });
                    }
                }
                _ => {}
            }
        }

        candidates.sort_by_key(|c| (c.line, c.node));
        candidates
    }

    fn is_method_value(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|node| match &node.kind {
            NodeKind::ClassBody { body } => body.iter().any(|m| m.value == id),
            _ => false,
        })
    }

    /// Names for anonymous values taken from the binding that receives them
    fn inferred_names(&self) -> HashMap<NodeId, String> {
        let mut names = HashMap::new();
        for id in self.ids() {
            match self.kind(id) {
                NodeKind::VariableDeclaration { declarations, .. } => {
                    for declarator in declarations {
                        if let (Some(init), Some(name)) =
                            (declarator.init, self.identifier_name(declarator.id))
                        {
                            names.insert(init, name.to_string());
                        }
                    }
                }
                NodeKind::AssignmentExpression { left, right } => {
                    if let Some(path) = self.member_path(*left) {
                        names.insert(*right, path);
                    }
                }
                NodeKind::ObjectExpression { properties } => {
                    for property in properties.iter().filter(|p| !p.computed) {
                        if let Some(key) = self.static_key(property.key) {
                            names.entry(property.value).or_insert(key);
                        }
                    }
                }
                _ => {}
            }
        }
        names
    }

    /// Dotted source path of an identifier or member chain, e.g. `module.exports.foo`
    pub fn member_path(&self, id: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            match self.kind(current) {
                NodeKind::Identifier { name } => {
                    segments.push(name.clone());
                    break;
                }
                NodeKind::MemberExpression { object, property, computed } => {
                    if *computed {
                        let key = self.static_key(*property).unwrap_or_else(|| "?".to_string());
                        segments.push(format!("[{}]", key));
                    } else {
                        segments.push(format!(".{}", self.identifier_name(*property)?));
                    }
                    current = *object;
                }
                _ => return None,
            }
        }
        segments.reverse();
        Some(segments.concat())
    }
}

/// What a [`Candidate`] declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Function,
    Class,
    Method,
    Object,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::Function => "function",
            CandidateKind::Class => "class",
            CandidateKind::Method => "method",
            CandidateKind::Object => "object",
        }
    }
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node worth asking `is_exported` about
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub node: NodeId,
    pub name: String,
    pub kind: CandidateKind,
    pub line: u32,
}

/// Incremental constructor for an [`Ast`].
///
/// Children are pushed before their parents; [`AstBuilder::program`] closes
/// the tree.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<SyntaxNode>,
    line: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line recorded for nodes pushed after this call
    pub fn at_line(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self
    }

    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let span = Span::new(self.line, self.line);
        self.push_spanned(kind, span)
    }

    pub fn push_spanned(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SyntaxNode { kind, span });
        id
    }

    pub fn identifier(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Identifier { name: name.to_string() })
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.push(NodeKind::Literal { value: LiteralValue::String(value.to_string()) })
    }

    pub fn number(&mut self, value: f64) -> NodeId {
        self.push(NodeKind::Literal { value: LiteralValue::Number(value) })
    }

    /// `object.property`
    pub fn member(&mut self, object: NodeId, property: &str) -> NodeId {
        let property = self.identifier(property);
        self.push(NodeKind::MemberExpression { object, property, computed: false })
    }

    /// `object[property]`
    pub fn computed_member(&mut self, object: NodeId, property: NodeId) -> NodeId {
        self.push(NodeKind::MemberExpression { object, property, computed: true })
    }

    /// Member chain from a dotted path, e.g. `"module.exports.foo"`
    pub fn path(&mut self, dotted: &str) -> NodeId {
        let mut parts = dotted.split('.');
        let mut node = self.identifier(parts.next().unwrap_or_default());
        for part in parts {
            node = self.member(node, part);
        }
        node
    }

    pub fn assign(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(NodeKind::AssignmentExpression { left, right })
    }

    pub fn expression_statement(&mut self, expression: NodeId) -> NodeId {
        self.push(NodeKind::ExpressionStatement { expression })
    }

    /// `left = right;` as a statement
    pub fn assign_statement(&mut self, left: NodeId, right: NodeId) -> NodeId {
        let assignment = self.assign(left, right);
        self.expression_statement(assignment)
    }

    pub fn function_declaration(&mut self, name: Option<&str>) -> NodeId {
        let id = name.map(|n| self.identifier(n));
        self.push(NodeKind::FunctionDeclaration { id })
    }

    pub fn function_expression(&mut self) -> NodeId {
        self.push(NodeKind::FunctionExpression { id: None })
    }

    pub fn arrow_function(&mut self) -> NodeId {
        self.push(NodeKind::ArrowFunctionExpression)
    }

    /// A class body holding one method per name; returns the body id
    pub fn class_body(&mut self, methods: &[&str]) -> NodeId {
        let body = methods
            .iter()
            .map(|name| {
                let key = self.identifier(name);
                let value = self.function_expression();
                MethodDefinition { key, value, computed: false }
            })
            .collect();
        self.push(NodeKind::ClassBody { body })
    }

    pub fn class_declaration(&mut self, name: Option<&str>, body: NodeId) -> NodeId {
        let id = name.map(|n| self.identifier(n));
        self.push(NodeKind::ClassDeclaration { id, body })
    }

    pub fn object(&mut self, properties: Vec<Property>) -> NodeId {
        self.push(NodeKind::ObjectExpression { properties })
    }

    /// Non-computed `{ key: value }` entry
    pub fn property(&mut self, key: &str, value: NodeId) -> Property {
        let key = self.identifier(key);
        Property { key, value, computed: false }
    }

    pub fn variable(&mut self, kind: DeclarationKind, name: &str, init: Option<NodeId>) -> NodeId {
        let id = self.identifier(name);
        self.push(NodeKind::VariableDeclaration {
            kind,
            declarations: vec![VariableDeclarator { id, init }],
        })
    }

    pub fn export_default(&mut self, declaration: NodeId) -> NodeId {
        self.push(NodeKind::ExportDefaultDeclaration { declaration })
    }

    pub fn export_named(&mut self, declaration: Option<NodeId>, locals: &[&str]) -> NodeId {
        let specifiers = locals
            .iter()
            .map(|local| {
                let local = self.identifier(local);
                self.push(NodeKind::ExportSpecifier { local })
            })
            .collect();
        self.push(NodeKind::ExportNamedDeclaration { declaration, specifiers })
    }

    pub fn other(&mut self, kind: &str) -> NodeId {
        self.push(NodeKind::Other { kind: kind.to_string() })
    }

    /// Close the tree with a `Program` over `body`
    pub fn program(mut self, body: Vec<NodeId>) -> Ast {
        let program = self.push(NodeKind::Program { body });
        Ast { nodes: self.nodes, program }
    }
}
