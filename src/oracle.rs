//! Export Oracle - answers "is this syntax node exported?"
//!
//! Two independent channels:
//! - CommonJS: the node is reachable from `module.exports`
//! - ESM: the node is reachable from a symbol flagged `exported`
//!
//! Both searches walk `props` edges of a possibly cyclic graph.

use crate::analyzer::AnalyzerOptions;
use crate::ast::NodeId;
use crate::symbol::{SymbolGraph, SymbolId};
use std::collections::HashSet;

/// Is `target` reachable from `root`?
///
/// Depth-first; a node counts as visited only while it is on the current
/// path, so a node shared by sibling branches is explored from each of them.
/// Literal props are never followed.
pub fn find_node(graph: &SymbolGraph, target: NodeId, root: SymbolId) -> bool {
    if graph.get(root).wraps(target) {
        return true;
    }

    // Explicit stack so long property chains cannot exhaust the call stack
    let mut path = HashSet::from([root]);
    let mut stack = vec![PathFrame::new(graph, root)];
    while let Some(frame) = stack.last_mut() {
        match frame.children.next() {
            Some(child) => {
                if !path.insert(child) {
                    continue;
                }
                if graph.get(child).wraps(target) {
                    return true;
                }
                stack.push(PathFrame::new(graph, child));
            }
            None => {
                let block = frame.block;
                stack.pop();
                path.remove(&block);
            }
        }
    }
    false
}

struct PathFrame {
    block: SymbolId,
    children: std::vec::IntoIter<SymbolId>,
}

impl PathFrame {
    fn new(graph: &SymbolGraph, block: SymbolId) -> Self {
        Self {
            block,
            children: graph.members(block).collect::<Vec<_>>().into_iter(),
        }
    }
}

/// Is `target` reachable from any exported symbol below `root`?
///
/// Unlike [`find_node`], the visited set is shared by the whole walk: each
/// namespace is expanded at most once.
pub fn find_exported_node(graph: &SymbolGraph, target: NodeId, root: SymbolId) -> bool {
    let mut visited = HashSet::from([root]);
    let mut pending = vec![root];

    while let Some(block) = pending.pop() {
        for child in graph.members(block) {
            if graph.get(child).exported && find_node(graph, target, child) {
                return true;
            }
            if visited.insert(child) {
                pending.push(child);
            }
        }
    }
    false
}

/// Check both channels, honoring the options that disable them
pub fn is_exported(graph: &SymbolGraph, target: NodeId, options: &AnalyzerOptions) -> bool {
    if options.check_common_js_exports {
        if let Some(exports) = graph.module_exports() {
            if find_node(graph, target, exports) {
                return true;
            }
        }
    }

    options.check_esm_exports && find_exported_node(graph, target, graph.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolNode;

    fn object(graph: &mut SymbolGraph, value: u32) -> SymbolId {
        graph.alloc(SymbolNode::object(Some(NodeId(value))))
    }

    #[test]
    fn test_find_node_follows_props() {
        let mut graph = SymbolGraph::new();
        let a = object(&mut graph, 1);
        let b = object(&mut graph, 2);
        graph.set_prop(a, "b", b);

        assert!(find_node(&graph, NodeId(2), a));
        assert!(find_node(&graph, NodeId(1), a));
        assert!(!find_node(&graph, NodeId(1), b));
    }

    #[test]
    fn test_literals_never_match() {
        let mut graph = SymbolGraph::new();
        let literal = graph.alloc(SymbolNode::literal(Some(NodeId(7)), Some("x".into())));
        assert!(!find_node(&graph, NodeId(7), literal));
    }

    #[test]
    fn test_props_of_literals_are_not_followed() {
        let mut graph = SymbolGraph::new();
        graph.seed_globals(true, false);
        let exports = graph.module_exports().unwrap();
        let root = graph.root();
        let literal = graph.alloc(SymbolNode::literal(None, Some("x".into())));
        let f = object(&mut graph, 3);
        graph.set_prop(literal, "f", f);
        graph.set_prop(exports, "s", literal);
        graph.mark_exported(literal);
        graph.set_prop(root, "s", literal);

        assert!(!find_node(&graph, NodeId(3), exports));
        assert!(!find_exported_node(&graph, NodeId(3), root));
    }

    #[test]
    fn test_long_chains_do_not_overflow() {
        let mut graph = SymbolGraph::new();
        let root = graph.root();
        let mut tail = root;
        for _ in 0..100_000 {
            let next = graph.alloc(SymbolNode::object(None));
            graph.set_prop(tail, "a", next);
            tail = next;
        }
        let leaf = object(&mut graph, 42);
        graph.set_prop(tail, "leaf", leaf);
        graph.mark_exported(leaf);

        assert!(find_node(&graph, NodeId(42), root));
        assert!(!find_node(&graph, NodeId(43), root));
        assert!(find_exported_node(&graph, NodeId(42), root));
    }

    #[test]
    fn test_find_node_survives_cycles() {
        let mut graph = SymbolGraph::new();
        graph.seed_globals(true, true);
        let a = object(&mut graph, 1);
        let root = graph.root();
        graph.set_prop(a, "self", a);
        graph.set_prop(root, "a", a);

        assert!(!find_node(&graph, NodeId(99), root));
        assert!(find_node(&graph, NodeId(1), root));
    }

    #[test]
    fn test_diamond_revisited_via_siblings() {
        // root -> {left, right} -> shared -> target
        let mut graph = SymbolGraph::new();
        let root = graph.root();
        let left = object(&mut graph, 1);
        let right = object(&mut graph, 2);
        let shared = object(&mut graph, 3);
        let target = object(&mut graph, 4);
        graph.set_prop(root, "left", left);
        graph.set_prop(root, "right", right);
        graph.set_prop(left, "shared", shared);
        graph.set_prop(right, "shared", shared);
        graph.set_prop(shared, "target", target);

        assert!(find_node(&graph, NodeId(4), root));
    }

    #[test]
    fn test_exported_search_starts_at_flagged_node() {
        let mut graph = SymbolGraph::new();
        graph.seed_globals(false, true);
        let root = graph.root();
        let exported = object(&mut graph, 1);
        let internal = object(&mut graph, 2);
        graph.mark_exported(exported);
        graph.set_prop(root, "exported", exported);
        graph.set_prop(root, "internal", internal);

        assert!(find_exported_node(&graph, NodeId(1), root));
        assert!(!find_exported_node(&graph, NodeId(2), root));
    }

    #[test]
    fn test_exported_search_descends_into_namespaces() {
        let mut graph = SymbolGraph::new();
        let root = graph.root();
        let ns = graph.alloc(SymbolNode::object(None));
        let inner = object(&mut graph, 5);
        graph.mark_exported(inner);
        graph.set_prop(root, "ns", ns);
        graph.set_prop(ns, "inner", inner);
        graph.set_prop(ns, "back", root);

        assert!(find_exported_node(&graph, NodeId(5), root));
        assert!(!find_exported_node(&graph, NodeId(6), root));
    }

    #[test]
    fn test_channels_can_be_disabled() {
        let mut graph = SymbolGraph::new();
        graph.seed_globals(true, false);
        let exports = graph.module_exports().unwrap();
        let root = graph.root();
        let cjs = object(&mut graph, 1);
        let esm = object(&mut graph, 2);
        graph.set_prop(exports, "cjs", cjs);
        graph.mark_exported(esm);
        graph.set_prop(root, "esm", esm);

        let both = AnalyzerOptions::default();
        let cjs_only = AnalyzerOptions { check_esm_exports: false, ..both };
        let esm_only = AnalyzerOptions { check_common_js_exports: false, ..both };

        assert!(is_exported(&graph, NodeId(1), &both));
        assert!(is_exported(&graph, NodeId(2), &both));
        assert!(is_exported(&graph, NodeId(1), &cjs_only));
        assert!(!is_exported(&graph, NodeId(2), &cjs_only));
        assert!(!is_exported(&graph, NodeId(1), &esm_only));
        assert!(is_exported(&graph, NodeId(2), &esm_only));
    }
}
