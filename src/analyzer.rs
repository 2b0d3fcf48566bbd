//! Entry Point - `parse` a module once, then ask `is_exported` per node

use crate::ast::{Ast, NodeId};
use crate::binding::{Binder, SymbolResolver};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::oracle;
use crate::symbol::{GraphStats, SymbolGraph};
use serde::{Deserialize, Serialize};

/// Analysis switches; every channel is on by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerOptions {
    /// Follow `export` declarations
    pub check_esm_exports: bool,
    /// Seed `module.exports` / `exports` and follow assignments to them
    pub check_common_js_exports: bool,
    /// Seed `window` as an alias of the global scope (`var` hoisting)
    pub init_window: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            check_esm_exports: true,
            check_common_js_exports: true,
            init_window: true,
        }
    }
}

impl AnalyzerOptions {
    pub fn esm_only() -> Self {
        Self { check_common_js_exports: false, ..Self::default() }
    }

    pub fn common_js_only() -> Self {
        Self { check_esm_exports: false, ..Self::default() }
    }
}

/// Result of binding one module; reusable across any number of queries
#[derive(Debug, Clone)]
pub struct ModuleAnalysis {
    graph: SymbolGraph,
}

impl ModuleAnalysis {
    pub fn graph(&self) -> &SymbolGraph {
        &self.graph
    }

    pub fn is_exported(&self, node: NodeId, options: &AnalyzerOptions) -> bool {
        oracle::is_exported(&self.graph, node, options)
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }
}

/// Bind `ast`, reporting soft failures to `tracing`
pub fn parse(ast: &Ast, options: &AnalyzerOptions) -> ModuleAnalysis {
    parse_with_sink(ast, options, &mut TracingSink)
}

/// Bind `ast`, reporting soft failures to `sink`
pub fn parse_with_sink(
    ast: &Ast,
    options: &AnalyzerOptions,
    sink: &mut dyn DiagnosticSink,
) -> ModuleAnalysis {
    let mut graph = SymbolGraph::new();
    graph.seed_globals(options.check_common_js_exports, options.init_window);

    Binder::new(SymbolResolver::new(ast, &mut graph, sink)).bind_module();

    tracing::debug!(
        nodes = ast.len(),
        symbols = graph.len(),
        "bound module"
    );
    ModuleAnalysis { graph }
}

/// Is `node` (from the tree given to `parse`) part of the export surface?
pub fn is_exported(node: NodeId, analysis: &ModuleAnalysis, options: &AnalyzerOptions) -> bool {
    analysis.is_exported(node, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstBuilder, DeclarationKind, NodeKind};
    use crate::diagnostics::CollectingSink;

    #[test]
    fn test_commonjs_function_export() {
        // function foo(){} module.exports = foo;
        let mut b = AstBuilder::new();
        let foo = b.function_declaration(Some("foo"));
        let target = b.path("module.exports");
        let value = b.identifier("foo");
        let stmt = b.assign_statement(target, value);
        let ast = b.program(vec![foo, stmt]);

        let options = AnalyzerOptions::common_js_only();
        let analysis = parse(&ast, &options);
        assert!(is_exported(foo, &analysis, &options));
    }

    #[test]
    fn test_no_exports() {
        let mut b = AstBuilder::new();
        let foo = b.function_declaration(Some("foo"));
        let bar = b.function_declaration(Some("bar"));
        let ast = b.program(vec![foo, bar]);

        let options = AnalyzerOptions::default();
        let analysis = parse(&ast, &options);
        assert!(!is_exported(foo, &analysis, &options));
        assert!(!is_exported(bar, &analysis, &options));
    }

    #[test]
    fn test_esm_function_export() {
        // export function foo(){}
        let mut b = AstBuilder::new();
        let foo = b.function_declaration(Some("foo"));
        let export = b.export_named(Some(foo), &[]);
        let ast = b.program(vec![export]);

        let options = AnalyzerOptions::esm_only();
        let analysis = parse(&ast, &options);
        assert!(is_exported(foo, &analysis, &options));
    }

    #[test]
    fn test_object_property_reached_through_exports() {
        // const obj = {}; obj.a = function(){}; module.exports = obj;
        let mut b = AstBuilder::new();
        let empty = b.object(vec![]);
        let decl = b.variable(DeclarationKind::Const, "obj", Some(empty));
        let target = b.path("obj.a");
        let f = b.function_expression();
        let assign = b.assign_statement(target, f);
        let exports = b.path("module.exports");
        let obj = b.identifier("obj");
        let export = b.assign_statement(exports, obj);
        let ast = b.program(vec![decl, assign, export]);

        let options = AnalyzerOptions::default();
        let analysis = parse(&ast, &options);
        assert!(is_exported(f, &analysis, &options));
    }

    #[test]
    fn test_default_exported_class_exposes_methods_not_declaration() {
        // class Foo { bar(){} } export default Foo;
        let mut b = AstBuilder::new();
        let body = b.class_body(&["bar"]);
        let class = b.class_declaration(Some("Foo"), body);
        let foo = b.identifier("Foo");
        let export = b.export_default(foo);
        let ast = b.program(vec![class, export]);
        let NodeKind::ClassBody { body: methods } = ast.kind(body) else {
            panic!("expected class body");
        };
        let bar = methods[0].value;

        let options = AnalyzerOptions::default();
        let analysis = parse(&ast, &options);
        assert!(is_exported(bar, &analysis, &options));
        assert!(!is_exported(class, &analysis, &options));
    }

    #[test]
    fn test_queries_are_idempotent_and_pure() {
        let mut b = AstBuilder::new();
        let foo = b.function_declaration(Some("foo"));
        let export = b.export_named(None, &["foo"]);
        let ast = b.program(vec![foo, export]);

        let options = AnalyzerOptions::default();
        let analysis = parse(&ast, &options);
        let before = analysis.stats();
        for _ in 0..3 {
            assert!(analysis.is_exported(foo, &options));
        }
        assert_eq!(analysis.stats(), before);
    }

    #[test]
    fn test_self_referential_graph_terminates() {
        // var a = {}; a.self = a; a.f = function(){}; exports.a = a;
        let mut b = AstBuilder::new();
        let empty = b.object(vec![]);
        let decl = b.variable(DeclarationKind::Var, "a", Some(empty));
        let self_target = b.path("a.self");
        let a = b.identifier("a");
        let self_assign = b.assign_statement(self_target, a);
        let f_target = b.path("a.f");
        let f = b.function_expression();
        let f_assign = b.assign_statement(f_target, f);
        let export_target = b.path("exports.a");
        let a2 = b.identifier("a");
        let export = b.assign_statement(export_target, a2);
        let unrelated = b.function_declaration(Some("unrelated"));
        let ast = b.program(vec![decl, self_assign, f_assign, export, unrelated]);

        let options = AnalyzerOptions::default();
        let analysis = parse(&ast, &options);
        assert!(analysis.is_exported(f, &options));
        assert!(!analysis.is_exported(unrelated, &options));
    }

    #[test]
    fn test_disabled_commonjs_skips_seeding() {
        let mut b = AstBuilder::new();
        let foo = b.function_declaration(Some("foo"));
        let target = b.path("module.exports");
        let value = b.identifier("foo");
        let stmt = b.assign_statement(target, value);
        let ast = b.program(vec![foo, stmt]);

        let options = AnalyzerOptions::esm_only();
        let mut sink = CollectingSink::new();
        let analysis = parse_with_sink(&ast, &options, &mut sink);

        assert!(analysis.graph().global("module").is_none());
        assert!(!analysis.is_exported(foo, &AnalyzerOptions::default()));
        assert!(!sink.diagnostics.is_empty());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: AnalyzerOptions = toml::from_str("init_window = false").unwrap();
        assert!(!options.init_window);
        assert!(options.check_esm_exports);
        assert!(options.check_common_js_exports);
    }
}
