//! Symbol Graph - inferred bindings of one module
//!
//! Every value the binder can reason about becomes a [`SymbolNode`] stored in
//! a single arena owned by [`SymbolGraph`]. Property edges are `name → SymbolId`
//! entries, so aliasing (`exports` / `module.exports`) and cycles (`window`
//! pointing back at the global root) are just repeated ids.

use crate::ast::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Handle to a node inside a [`SymbolGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// What a symbol node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Declared but not (yet) assigned a meaningful value
    Unknown,
    /// A scalar; its props are never consulted
    Literal,
    /// Function, class, class body or object literal
    Object,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Unknown => "unknown",
            SymbolKind::Literal => "literal",
            SymbolKind::Object => "object",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node of the binding graph
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolNode {
    pub kind: SymbolKind,
    /// Originating syntax node, compared by identity only
    pub value: Option<NodeId>,
    /// Key text a literal contributes when used as a property name
    pub scalar: Option<String>,
    pub props: HashMap<String, SymbolId>,
    pub exported: bool,
}

impl SymbolNode {
    pub fn placeholder() -> Self {
        Self {
            kind: SymbolKind::Unknown,
            value: None,
            scalar: None,
            props: HashMap::new(),
            exported: false,
        }
    }

    pub fn object(value: Option<NodeId>) -> Self {
        Self {
            kind: SymbolKind::Object,
            value,
            ..Self::placeholder()
        }
    }

    pub fn literal(value: Option<NodeId>, scalar: Option<String>) -> Self {
        Self {
            kind: SymbolKind::Literal,
            value,
            scalar,
            ..Self::placeholder()
        }
    }

    /// Literals never expose properties
    pub fn has_members(&self) -> bool {
        self.kind != SymbolKind::Literal
    }

    /// Does this node stand for `target`?
    pub fn wraps(&self, target: NodeId) -> bool {
        self.kind == SymbolKind::Object && self.value == Some(target)
    }
}

/// Arena of symbol nodes rooted at the module's global scope.
///
/// Mutated only while a module is being bound; export queries borrow it
/// immutably.
#[derive(Debug, Clone)]
pub struct SymbolGraph {
    nodes: Vec<SymbolNode>,
    root: SymbolId,
}

impl Default for SymbolGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolGraph {
    /// Create a graph holding only an empty global root
    pub fn new() -> Self {
        Self {
            nodes: vec![SymbolNode::placeholder()],
            root: SymbolId(0),
        }
    }

    /// Seed `module.exports` / `exports` and the `window` self-alias
    pub fn seed_globals(&mut self, common_js: bool, window: bool) {
        let root = self.root;
        if common_js {
            let module = self.alloc(SymbolNode::object(None));
            let exports = self.alloc(SymbolNode::object(None));
            self.set_prop(module, "exports", exports);
            self.set_prop(root, "module", module);
            self.set_prop(root, "exports", exports);
        }
        if window {
            self.set_prop(root, "window", root);
        }
    }

    pub fn root(&self) -> SymbolId {
        self.root
    }

    pub fn alloc(&mut self, node: SymbolNode) -> SymbolId {
        let id = SymbolId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: SymbolId) -> &SymbolNode {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut SymbolNode {
        &mut self.nodes[id.0 as usize]
    }

    pub fn prop(&self, id: SymbolId, key: &str) -> Option<SymbolId> {
        self.get(id).props.get(key).copied()
    }

    /// Property `key` of `id` as seen by member access; literals have none
    pub fn member(&self, id: SymbolId, key: &str) -> Option<SymbolId> {
        let node = self.get(id);
        if !node.has_members() {
            return None;
        }
        node.props.get(key).copied()
    }

    /// Property targets reachable from `id`; empty for literals
    pub fn members(&self, id: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        let node = self.get(id);
        node.props
            .values()
            .copied()
            .filter(move |_| node.has_members())
    }

    /// Point `id.key` at `target`, replacing any previous edge
    pub fn set_prop(&mut self, id: SymbolId, key: &str, target: SymbolId) {
        self.get_mut(id).props.insert(key.to_string(), target);
    }

    /// Property key a resolved symbol yields; only literals have one
    pub fn scalar_key(&self, id: SymbolId) -> Option<String> {
        let node = self.get(id);
        match node.kind {
            SymbolKind::Literal => node.scalar.clone(),
            _ => None,
        }
    }

    pub fn mark_exported(&mut self, id: SymbolId) {
        self.get_mut(id).exported = true;
    }

    /// `module.exports` as it stands after binding, if seeded
    pub fn module_exports(&self) -> Option<SymbolId> {
        let module = self.prop(self.root, "module")?;
        self.prop(module, "exports")
    }

    /// The global object alias, if seeded
    pub fn window(&self) -> Option<SymbolId> {
        self.prop(self.root, "window")
    }

    /// Look a name up in the global scope
    pub fn global(&self, name: &str) -> Option<SymbolId> {
        self.prop(self.root, name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &SymbolNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (SymbolId(i as u32), node))
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            symbols: self.nodes.len(),
            ..GraphStats::default()
        };
        for node in &self.nodes {
            match node.kind {
                SymbolKind::Unknown => stats.placeholders += 1,
                SymbolKind::Literal => stats.literals += 1,
                SymbolKind::Object => stats.objects += 1,
            }
            if node.exported {
                stats.exported += 1;
            }
            stats.edges += node.props.len();
        }
        stats.globals = self.get(self.root).props.len();
        stats
    }
}

/// Statistics about a symbol graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub symbols: usize,
    pub objects: usize,
    pub literals: usize,
    pub placeholders: usize,
    pub exported: usize,
    pub edges: usize,
    pub globals: usize,
}
