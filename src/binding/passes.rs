//! Binding passes over the top-level module body
//!
//! Pass 1 (declarations) hoists every variable declarator as an empty
//! placeholder so later references resolve regardless of source order.
//! Pass 2 (assignments) binds values and flags export declarations.
//!
//! Only top-level statements are visited; function and class bodies, blocks
//! and control flow are not traversed.

use crate::ast::{NodeId, NodeKind, VariableDeclarator};
use crate::diagnostics::Diagnostic;
use crate::symbol::SymbolId;
use super::resolver::{ResolveOptions, SymbolResolver};

/// Reserved global key holding anonymous default exports
pub const DEFAULT_EXPORT: &str = "default";

/// Drives both passes through a [`SymbolResolver`]
pub struct Binder<'a> {
    resolver: SymbolResolver<'a>,
}

impl<'a> Binder<'a> {
    pub fn new(resolver: SymbolResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Run the declaration pass, then the assignment pass
    pub fn bind_module(&mut self) {
        let program = self.resolver.ast().program();
        self.declare(program);
        self.assign(program);
    }

    /// Pass 1: register placeholders for every declarator
    pub fn declare(&mut self, node: NodeId) {
        let ast = self.resolver.ast();
        match ast.kind(node) {
            NodeKind::Program { body } => {
                for statement in body {
                    self.declare(*statement);
                }
            }
            NodeKind::ExpressionStatement { expression } => self.declare(*expression),
            NodeKind::VariableDeclaration { kind, declarations } => {
                for declarator in declarations {
                    let globals = self.resolver.globals();
                    let symbol = self.resolver.bind(declarator.id, None, Some(globals));
                    if !kind.is_implicitly_global() {
                        continue;
                    }
                    let window = self.resolver.graph().window();
                    if let (Some(symbol), Some(window), Some(name)) =
                        (symbol, window, ast.identifier_name(declarator.id))
                    {
                        self.resolver.graph_mut().set_prop(window, name, symbol);
                    }
                }
            }
            NodeKind::ExportNamedDeclaration { declaration: Some(declaration), .. } => {
                self.declare(*declaration);
            }
            _ => {}
        }
    }

    /// Pass 2: bind values and record export flags
    pub fn assign(&mut self, node: NodeId) {
        let ast = self.resolver.ast();
        match ast.kind(node) {
            NodeKind::Program { body } => {
                for statement in body {
                    self.assign(*statement);
                }
            }
            NodeKind::ExpressionStatement { expression } => self.assign(*expression),
            NodeKind::AssignmentExpression { left, right } => {
                self.resolver.bind(*left, Some(*right), None);
            }
            NodeKind::VariableDeclaration { declarations, .. } => {
                self.bind_declarators(declarations);
            }
            NodeKind::FunctionDeclaration { id: Some(id) } => {
                if ast.identifier_name(*id).is_some() {
                    let globals = self.resolver.globals();
                    self.resolver.bind(*id, Some(node), Some(globals));
                }
            }
            NodeKind::ClassDeclaration { id: Some(id), body } => {
                // The class binds to its body, not the declaration node
                let globals = self.resolver.globals();
                self.resolver.bind(*id, Some(*body), Some(globals));
            }
            NodeKind::ExportDefaultDeclaration { declaration } => {
                self.export_default(*declaration);
            }
            NodeKind::ExportNamedDeclaration { declaration, specifiers } => {
                if let Some(declaration) = declaration {
                    self.export_declaration(*declaration);
                }
                for specifier in specifiers {
                    self.assign(*specifier);
                }
            }
            NodeKind::ExportSpecifier { local } => {
                let globals = self.resolver.globals();
                match self.resolver.resolve(*local, Some(globals), ResolveOptions::default()) {
                    Some(symbol) => self.mark_exported(symbol),
                    None => self.resolver.report(Diagnostic::UnresolvedValue {
                        node: *local,
                        name: ast.identifier_name(*local).unwrap_or("?").to_string(),
                    }),
                }
            }
            _ => {}
        }
    }

    fn bind_declarators(&mut self, declarations: &[VariableDeclarator]) -> Vec<SymbolId> {
        declarations
            .iter()
            .filter_map(|declarator| self.resolver.bind(declarator.id, declarator.init, None))
            .collect()
    }

    /// `export default <declaration>`
    fn export_default(&mut self, declaration: NodeId) {
        let bound = self.resolver.bind(declaration, Some(declaration), None);
        let symbol = bound.or_else(|| {
            // Anonymous values have no name to bind; keep them under `default`
            let symbol = self.resolver.resolve(declaration, None, ResolveOptions::default())?;
            let globals = self.resolver.globals();
            self.resolver.graph_mut().set_prop(globals, DEFAULT_EXPORT, symbol);
            Some(symbol)
        });
        if let Some(symbol) = symbol {
            self.mark_exported(symbol);
        }
    }

    /// Inline declaration of `export <declaration>`
    fn export_declaration(&mut self, declaration: NodeId) {
        let ast = self.resolver.ast();
        let symbols = match ast.kind(declaration) {
            NodeKind::VariableDeclaration { declarations, .. } => self.bind_declarators(declarations),
            _ => self
                .resolver
                .bind(declaration, Some(declaration), None)
                .into_iter()
                .collect(),
        };
        for symbol in symbols {
            self.mark_exported(symbol);
        }
    }

    fn mark_exported(&mut self, symbol: SymbolId) {
        self.resolver.graph_mut().mark_exported(symbol);
    }
}
