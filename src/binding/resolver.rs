//! Symbol Resolver - interprets expressions against the symbol graph
//!
//! `resolve` is the read side: it maps an expression to the symbol it
//! denotes, creating fresh symbols for values (functions, objects, literals).
//! `bind` is the write side: it stores a resolved value under a name or
//! property. Both return `None` instead of failing; a `None` from `bind`
//! leaves the graph untouched at the target.
//!
//! Scoping is flat: a lookup consults at most one scope and then the globals.

use crate::ast::{Ast, MAX_NESTING, NodeId, NodeKind};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::symbol::{SymbolGraph, SymbolId, SymbolNode};

/// Knobs for a single `resolve` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Treat an identifier as its own name (non-computed property keys)
    pub simple_identifier: bool,
    /// Materialize missing member properties as empty objects
    pub create_missing_props: bool,
}

impl ResolveOptions {
    pub fn simple_identifier() -> Self {
        Self { simple_identifier: true, ..Self::default() }
    }

    pub fn create_missing_props() -> Self {
        Self { create_missing_props: true, ..Self::default() }
    }
}

/// Resolver over one module's tree, writing into its graph
pub struct SymbolResolver<'a> {
    ast: &'a Ast,
    graph: &'a mut SymbolGraph,
    sink: &'a mut dyn DiagnosticSink,
    depth: usize,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(ast: &'a Ast, graph: &'a mut SymbolGraph, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self { ast, graph, sink, depth: 0 }
    }

    pub fn ast(&self) -> &'a Ast {
        self.ast
    }

    pub fn graph(&self) -> &SymbolGraph {
        &*self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SymbolGraph {
        &mut *self.graph
    }

    pub fn globals(&self) -> SymbolId {
        self.graph.root()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
    }

    /// Map `node` to the symbol it denotes
    ///
    /// Expressions nested deeper than [`MAX_NESTING`] are not followed.
    pub fn resolve(
        &mut self,
        node: NodeId,
        scope: Option<SymbolId>,
        options: ResolveOptions,
    ) -> Option<SymbolId> {
        if self.depth >= MAX_NESTING {
            self.sink.report(Diagnostic::NestingLimit { node });
            return None;
        }
        self.depth += 1;
        let symbol = self.resolve_node(node, scope, options);
        self.depth -= 1;
        symbol
    }

    fn resolve_node(
        &mut self,
        node: NodeId,
        scope: Option<SymbolId>,
        options: ResolveOptions,
    ) -> Option<SymbolId> {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::Identifier { name } => self.resolve_identifier(name, scope, options),
            NodeKind::MemberExpression { object, property, computed } => {
                let object_symbol = self.resolve(*object, scope, options);
                let key = self.property_key(*property, *computed, scope);

                if let (Some(object_symbol), Some(key)) = (object_symbol, key.as_deref()) {
                    if let Some(existing) = self.graph.member(object_symbol, key) {
                        return Some(existing);
                    }
                    if options.create_missing_props && self.graph.get(object_symbol).has_members() {
                        let placeholder = self.graph.alloc(SymbolNode::object(None));
                        self.graph.set_prop(object_symbol, key, placeholder);
                        return Some(placeholder);
                    }
                }

                self.sink.report(Diagnostic::MissingProperty {
                    node,
                    property: describe_key(ast, *property, key),
                });
                None
            }
            NodeKind::ClassDeclaration { .. }
            | NodeKind::FunctionDeclaration { .. }
            | NodeKind::FunctionExpression { .. }
            | NodeKind::ArrowFunctionExpression => Some(self.function_symbol(node)),
            NodeKind::AssignmentExpression { left, right } => self.bind(*left, Some(*right), scope),
            NodeKind::ClassBody { body } => {
                let class = self.graph.alloc(SymbolNode::object(Some(node)));
                for method in body {
                    let Some(name) = (!method.computed)
                        .then(|| ast.static_key(method.key))
                        .flatten()
                    else {
                        continue;
                    };
                    let method_symbol = self.graph.alloc(SymbolNode::object(Some(method.value)));
                    self.graph.set_prop(class, &name, method_symbol);
                }
                Some(class)
            }
            NodeKind::ObjectExpression { properties } => {
                let object = self.graph.alloc(SymbolNode::object(Some(node)));
                for property in properties.iter().filter(|p| !p.computed) {
                    let Some(key) = ast.static_key(property.key) else {
                        continue;
                    };
                    if let Some(value) = self.resolve(property.value, scope, options) {
                        self.graph.set_prop(object, &key, value);
                    }
                }
                Some(object)
            }
            NodeKind::Literal { value } => {
                Some(self.graph.alloc(SymbolNode::literal(Some(node), value.as_key())))
            }
            other => {
                self.sink.report(Diagnostic::Unsupported {
                    node,
                    kind: other.name().to_string(),
                });
                None
            }
        }
    }

    /// Store `value` at `target`, returning the stored symbol
    pub fn bind(
        &mut self,
        target: NodeId,
        value: Option<NodeId>,
        scope: Option<SymbolId>,
    ) -> Option<SymbolId> {
        let ast = self.ast;
        let globals = self.globals();
        let block = scope.unwrap_or(globals);

        // Declarations register globally wherever they appear
        let declared = match ast.kind(target) {
            NodeKind::ClassDeclaration { id: Some(id), body } => Some((*id, *body)),
            NodeKind::FunctionDeclaration { id: Some(id) } => Some((*id, target)),
            _ => None,
        };
        if let Some((id, value)) = declared {
            return match ast.kind(id) {
                NodeKind::Identifier { .. } => self.bind(id, Some(value), Some(globals)),
                _ => None,
            };
        }

        match ast.kind(target) {
            NodeKind::Identifier { name } => match value {
                Some(value) => match self.resolve(value, Some(block), ResolveOptions::default()) {
                    Some(symbol) => {
                        self.graph.set_prop(block, name, symbol);
                        Some(symbol)
                    }
                    None => {
                        self.sink.report(Diagnostic::UnresolvedValue {
                            node: target,
                            name: name.clone(),
                        });
                        None
                    }
                },
                None => {
                    let placeholder = self.graph.alloc(SymbolNode::placeholder());
                    self.graph.set_prop(block, name, placeholder);
                    Some(placeholder)
                }
            },
            NodeKind::MemberExpression { object, property, computed } => {
                let object_symbol = self
                    .resolve(*object, Some(block), ResolveOptions::default())
                    .filter(|&symbol| self.graph.get(symbol).has_members());
                let key = self.property_key(*property, *computed, Some(block));

                let (Some(object_symbol), Some(key)) = (object_symbol, key) else {
                    self.sink.report(Diagnostic::UnresolvedTarget {
                        node: target,
                        target: ast.member_path(target).unwrap_or_else(|| "<member>".to_string()),
                    });
                    return None;
                };

                let resolved = value
                    .and_then(|value| self.resolve(value, Some(block), ResolveOptions::default()));
                match resolved {
                    Some(symbol) => {
                        self.graph.set_prop(object_symbol, &key, symbol);
                        Some(symbol)
                    }
                    None => {
                        self.sink.report(Diagnostic::UnresolvedValue { node: target, name: key });
                        None
                    }
                }
            }
            _ => None,
        }
    }

    fn resolve_identifier(
        &mut self,
        name: &str,
        scope: Option<SymbolId>,
        options: ResolveOptions,
    ) -> Option<SymbolId> {
        if options.simple_identifier {
            return Some(self.graph.alloc(SymbolNode::literal(None, Some(name.to_string()))));
        }

        let globals = self.globals();
        let block = scope.unwrap_or(globals);
        self.graph
            .prop(block, name)
            .or_else(|| self.graph.prop(globals, name))
    }

    /// Key text for `obj.prop` / `obj[expr]`; only literal results count
    fn property_key(
        &mut self,
        property: NodeId,
        computed: bool,
        scope: Option<SymbolId>,
    ) -> Option<String> {
        match self.ast.kind(property) {
            NodeKind::Identifier { name } if !computed => Some(name.clone()),
            NodeKind::Literal { value } => value.as_key(),
            _ => {
                let symbol = self.resolve(property, scope, ResolveOptions::default())?;
                self.graph.scalar_key(symbol)
            }
        }
    }

    /// Callable object with an empty `prototype`
    fn function_symbol(&mut self, node: NodeId) -> SymbolId {
        let function = self.graph.alloc(SymbolNode::object(Some(node)));
        let prototype = self.graph.alloc(SymbolNode::object(None));
        self.graph.set_prop(function, "prototype", prototype);
        function
    }
}

fn describe_key(ast: &Ast, property: NodeId, key: Option<String>) -> String {
    key.or_else(|| ast.identifier_name(property).map(str::to_string))
        .unwrap_or_else(|| ast.kind(property).name().to_string())
}
