//! JavaScript adapter
//!
//! Parses source with tree-sitter-javascript and lowers the concrete tree to
//! the analyzer's grammar subset. Constructs outside the subset become
//! `NodeKind::Other` carrying the tree-sitter kind; nothing is rejected.

use crate::ast::{
    Ast, AstBuilder, DeclarationKind, LiteralValue, MAX_NESTING, MethodDefinition, NodeId,
    NodeKind, Property, Span, VariableDeclarator,
};
use crate::{Error, Result};
use super::framework::SyntaxAdapter;
use std::iter::Peekable;
use std::str::Chars;
use tree_sitter::{Language, Node, Parser};

/// tree-sitter backed JavaScript front-end
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaScriptAdapter;

impl JavaScriptAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SyntaxAdapter for JavaScriptAdapter {
    fn language_name(&self) -> &str {
        "JavaScript"
    }

    fn file_extensions(&self) -> &[&str] {
        &["js", "mjs", "cjs", "jsx"]
    }

    fn parse_source(&self, path: &str, content: &str) -> Result<Ast> {
        let language: Language = tree_sitter_javascript::LANGUAGE.into();
        let mut parser = Parser::new();
        parser.set_language(&language)
            .map_err(|e| Error::Adapter(format!("Failed to set language: {}", e)))?;

        let tree = parser.parse(content, None)
            .ok_or_else(|| Error::Parse(format!("{}: parser returned no tree", path)))?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(path, "syntax errors present, lowering recovered tree");
        }

        Ok(Lowering::new(content.as_bytes()).program(root))
    }
}

/// Concrete tree → grammar subset
struct Lowering<'s> {
    source: &'s [u8],
    builder: AstBuilder,
    depth: usize,
}

impl<'s> Lowering<'s> {
    fn new(source: &'s [u8]) -> Self {
        Self { source, builder: AstBuilder::new(), depth: 0 }
    }

    fn program(mut self, root: Node) -> Ast {
        let body = named_children(root)
            .into_iter()
            .map(|child| self.statement(child))
            .collect();
        self.builder.at_line(1);
        self.builder.program(body)
    }

    fn statement(&mut self, node: Node) -> NodeId {
        match node.kind() {
            "expression_statement" => {
                let expression = match named_children(node).first() {
                    Some(inner) => self.expression(*inner),
                    None => self.other(node),
                };
                self.push(NodeKind::ExpressionStatement { expression }, node)
            }
            "lexical_declaration" | "variable_declaration" => self.variable_declaration(node),
            "function_declaration" | "generator_function_declaration" => {
                let id = self.optional_identifier(node, "name");
                self.push(NodeKind::FunctionDeclaration { id }, node)
            }
            "class_declaration" => self.class(node),
            "export_statement" => self.export_statement(node),
            _ => self.other(node),
        }
    }

    fn variable_declaration(&mut self, node: Node) -> NodeId {
        let kind = node
            .child(0)
            .and_then(|keyword| DeclarationKind::from_keyword(self.text(keyword)))
            .unwrap_or(DeclarationKind::Var);

        let declarations = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "variable_declarator")
            .map(|declarator| {
                let id = match declarator.child_by_field_name("name") {
                    Some(name) if name.kind() == "identifier" => self.identifier(name),
                    Some(pattern) => self.other(pattern),
                    None => self.other(declarator),
                };
                let init = declarator
                    .child_by_field_name("value")
                    .map(|value| self.expression(value));
                VariableDeclarator { id, init }
            })
            .collect();

        self.push(NodeKind::VariableDeclaration { kind, declarations }, node)
    }

    /// Lower an expression; anything nested past [`MAX_NESTING`] becomes `Other`
    fn expression(&mut self, node: Node) -> NodeId {
        if self.depth >= MAX_NESTING {
            return self.other(node);
        }
        self.depth += 1;
        let id = self.lower_expression(node);
        self.depth -= 1;
        id
    }

    fn lower_expression(&mut self, node: Node) -> NodeId {
        match node.kind() {
            "identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "private_property_identifier" => self.identifier(node),
            "assignment_expression" => {
                let left = self.field_expression(node, "left");
                let right = self.field_expression(node, "right");
                self.push(NodeKind::AssignmentExpression { left, right }, node)
            }
            "member_expression" => {
                let object = self.field_expression(node, "object");
                let property = match node.child_by_field_name("property") {
                    Some(property) => self.identifier(property),
                    None => self.other(node),
                };
                self.push(NodeKind::MemberExpression { object, property, computed: false }, node)
            }
            "subscript_expression" => {
                let object = self.field_expression(node, "object");
                let property = self.field_expression(node, "index");
                self.push(NodeKind::MemberExpression { object, property, computed: true }, node)
            }
            "function_expression" | "function" | "generator_function" => {
                let id = self.optional_identifier(node, "name");
                self.push(NodeKind::FunctionExpression { id }, node)
            }
            "arrow_function" => self.push(NodeKind::ArrowFunctionExpression, node),
            "class" => self.class(node),
            "object" => self.object(node),
            "string" => {
                let raw = self.text(node);
                let unquoted = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
                let value = match unescape(unquoted) {
                    Some(text) => LiteralValue::String(text),
                    None => LiteralValue::Other(raw.to_string()),
                };
                self.literal(value, node)
            }
            "number" => {
                let value = parse_number(self.text(node))
                    .map(LiteralValue::Number)
                    .unwrap_or_else(|| LiteralValue::Other(self.text(node).to_string()));
                self.literal(value, node)
            }
            "true" => self.literal(LiteralValue::Boolean(true), node),
            "false" => self.literal(LiteralValue::Boolean(false), node),
            "null" => self.literal(LiteralValue::Null, node),
            "template_string" | "regex" => {
                self.literal(LiteralValue::Other(self.text(node).to_string()), node)
            }
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => self.expression(*inner),
                None => self.other(node),
            },
            _ => self.other(node),
        }
    }

    /// Declarations and class expressions share one shape
    fn class(&mut self, node: Node) -> NodeId {
        let id = self.optional_identifier(node, "name");
        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                if member.kind() == "method_definition" {
                    methods.push(self.method(member));
                }
            }
        }
        let body = match node.child_by_field_name("body") {
            Some(body_node) => self.push(NodeKind::ClassBody { body: methods }, body_node),
            None => self.push(NodeKind::ClassBody { body: methods }, node),
        };
        self.push(NodeKind::ClassDeclaration { id, body }, node)
    }

    fn method(&mut self, node: Node) -> MethodDefinition {
        let (key, computed) = self.property_key(node, "name");
        let value = self.push(NodeKind::FunctionExpression { id: None }, node);
        MethodDefinition { key, value, computed }
    }

    fn object(&mut self, node: Node) -> NodeId {
        let mut properties = Vec::new();
        for entry in named_children(node) {
            match entry.kind() {
                "pair" => {
                    let (key, computed) = self.property_key(entry, "key");
                    let value = self.field_expression(entry, "value");
                    properties.push(Property { key, value, computed });
                }
                "shorthand_property_identifier" => {
                    let key = self.identifier(entry);
                    let value = self.identifier(entry);
                    properties.push(Property { key, value, computed: false });
                }
                "method_definition" => {
                    let method = self.method(entry);
                    properties.push(Property {
                        key: method.key,
                        value: method.value,
                        computed: method.computed,
                    });
                }
                _ => {}
            }
        }
        self.push(NodeKind::ObjectExpression { properties }, node)
    }

    /// Key of a pair or method; `[expr]` keys are computed
    fn property_key(&mut self, node: Node, field: &str) -> (NodeId, bool) {
        match node.child_by_field_name(field) {
            Some(key) if key.kind() == "computed_property_name" => {
                let inner = match named_children(key).first() {
                    Some(inner) => self.expression(*inner),
                    None => self.other(key),
                };
                (inner, true)
            }
            Some(key) => (self.expression(key), false),
            None => (self.other(node), true),
        }
    }

    fn export_statement(&mut self, node: Node) -> NodeId {
        let declaration = node.child_by_field_name("declaration");
        let value = node.child_by_field_name("value");
        let mut cursor = node.walk();
        let is_default = node.children(&mut cursor).any(|child| child.kind() == "default");

        if is_default {
            let declaration = match (declaration, value) {
                (Some(declaration), _) => self.statement(declaration),
                (None, Some(value)) => self.expression(value),
                (None, None) => self.other(node),
            };
            return self.push(NodeKind::ExportDefaultDeclaration { declaration }, node);
        }

        let declaration = declaration.map(|declaration| self.statement(declaration));
        let mut specifiers = Vec::new();
        // `export { a } from "mod"` names bindings of another module
        if node.child_by_field_name("source").is_none() {
            for clause in named_children(node).into_iter().filter(|c| c.kind() == "export_clause") {
                for specifier in named_children(clause) {
                    if specifier.kind() != "export_specifier" {
                        continue;
                    }
                    let Some(name) = specifier
                        .child_by_field_name("name")
                        .filter(|name| name.kind() == "identifier")
                    else {
                        continue;
                    };
                    let local = self.identifier(name);
                    specifiers.push(self.push(NodeKind::ExportSpecifier { local }, specifier));
                }
            }
        }
        self.push(NodeKind::ExportNamedDeclaration { declaration, specifiers }, node)
    }

    fn field_expression(&mut self, node: Node, field: &str) -> NodeId {
        match node.child_by_field_name(field) {
            Some(child) => self.expression(child),
            None => self.other(node),
        }
    }

    fn optional_identifier(&mut self, node: Node, field: &str) -> Option<NodeId> {
        node.child_by_field_name(field).map(|name| self.identifier(name))
    }

    fn identifier(&mut self, node: Node) -> NodeId {
        let name = self.text(node).to_string();
        self.push(NodeKind::Identifier { name }, node)
    }

    fn literal(&mut self, value: LiteralValue, node: Node) -> NodeId {
        self.push(NodeKind::Literal { value }, node)
    }

    fn other(&mut self, node: Node) -> NodeId {
        self.push(NodeKind::Other { kind: node.kind().to_string() }, node)
    }

    fn push(&mut self, kind: NodeKind, node: Node) -> NodeId {
        let span = Span::new(
            node.start_position().row as u32 + 1,
            node.end_position().row as u32 + 1,
        );
        self.builder.push_spanned(kind, span)
    }

    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let radix = match lower.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    match radix {
        Some(radix) => i64::from_str_radix(&lower[2..], radix).ok().map(|n| n as f64),
        None => lower.parse::<f64>().ok(),
    }
}

/// Decode the escape sequences of a string literal body.
///
/// `None` for escapes that cannot be decoded (legacy octal, lone surrogates,
/// truncated hex).
fn unescape(body: &str) -> Option<String> {
    if !body.contains('\\') {
        return Some(body.to_string());
    }

    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next()? {
            'n' => text.push('\n'),
            't' => text.push('\t'),
            'r' => text.push('\r'),
            'b' => text.push('\u{8}'),
            'f' => text.push('\u{c}'),
            'v' => text.push('\u{b}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => text.push('\0'),
            '0'..='9' => return None,
            'x' => text.push(char::from_u32(hex_digits(&mut chars, 2)?)?),
            'u' => text.push(unicode_escape(&mut chars)?),
            // Line continuations contribute nothing
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => text.push(other),
        }
    }
    Some(text)
}

/// `\uXXXX`, `\u{X...}` and UTF-16 surrogate pairs, after the `u`
fn unicode_escape(chars: &mut Peekable<Chars>) -> Option<char> {
    if chars.next_if_eq(&'{').is_some() {
        let mut value = 0u32;
        let mut digits = 0;
        loop {
            match chars.next()? {
                '}' if digits > 0 => break,
                c => {
                    value = value.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
                    digits += 1;
                }
            }
        }
        return char::from_u32(value);
    }

    let unit = hex_digits(chars, 4)?;
    if !(0xD800..0xDC00).contains(&unit) {
        return char::from_u32(unit);
    }
    if chars.next()? != '\\' || chars.next()? != 'u' {
        return None;
    }
    let low = hex_digits(chars, 4)?;
    if !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
}

fn hex_digits(chars: &mut Peekable<Chars>, count: usize) -> Option<u32> {
    (0..count).try_fold(0u32, |value, _| Some(value * 16 + chars.next()?.to_digit(16)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{self, AnalyzerOptions};
    use crate::ast::Candidate;

    fn lower(source: &str) -> Ast {
        JavaScriptAdapter::new().parse_source("test.js", source).unwrap()
    }

    fn candidate<'a>(candidates: &'a [Candidate], name: &str) -> &'a Candidate {
        candidates
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("no candidate named {}", name))
    }

    fn exported(source: &str, name: &str, options: AnalyzerOptions) -> bool {
        let ast = lower(source);
        let analysis = analyzer::parse(&ast, &options);
        let candidates = ast.candidates();
        analysis.is_exported(candidate(&candidates, name).node, &options)
    }

    #[test]
    fn test_lowers_declarations() {
        let ast = lower("// header\nconst x = 1, y = 'a';\nvar z;\n");
        assert_eq!(ast.body().len(), 2);

        let NodeKind::VariableDeclaration { kind, declarations } = ast.kind(ast.body()[0]) else {
            panic!("expected declaration, got {:?}", ast.kind(ast.body()[0]));
        };
        assert_eq!(*kind, DeclarationKind::Const);
        assert_eq!(declarations.len(), 2);
        assert_eq!(ast.identifier_name(declarations[1].id), Some("y"));
        let init = declarations[1].init.unwrap();
        assert_eq!(
            ast.kind(init),
            &NodeKind::Literal { value: LiteralValue::String("a".into()) }
        );

        let NodeKind::VariableDeclaration { kind, declarations } = ast.kind(ast.body()[1]) else {
            panic!("expected declaration");
        };
        assert_eq!(*kind, DeclarationKind::Var);
        assert!(declarations[0].init.is_none());
        assert_eq!(ast.span(ast.body()[1]).start_line, 3);
    }

    #[test]
    fn test_lowers_member_and_subscript_targets() {
        let ast = lower("module.exports.a = 1;\nobj['b'] = 2;\n");
        let targets: Vec<_> = ast
            .body()
            .iter()
            .map(|stmt| {
                let NodeKind::ExpressionStatement { expression } = ast.kind(*stmt) else {
                    panic!("expected expression statement");
                };
                let NodeKind::AssignmentExpression { left, .. } = ast.kind(*expression) else {
                    panic!("expected assignment");
                };
                ast.member_path(*left).unwrap()
            })
            .collect();
        assert_eq!(targets, vec!["module.exports.a", "obj[b]"]);
    }

    #[test]
    fn test_numbers_parse_all_radixes() {
        assert_eq!(parse_number("0x1F"), Some(31.0));
        assert_eq!(parse_number("1_000"), Some(1000.0));
        assert_eq!(parse_number("0b101"), Some(5.0));
        assert_eq!(parse_number("2.5"), Some(2.5));
        assert_eq!(parse_number("10n"), None);
    }

    #[test]
    fn test_string_escapes_are_decoded() {
        let ast = lower("obj['a\\'b'] = 1;\nobj[\"\\x41\\u{42}\"] = 2;\n");
        let paths: Vec<_> = ast
            .body()
            .iter()
            .filter_map(|stmt| match ast.kind(*stmt) {
                NodeKind::ExpressionStatement { expression } => match ast.kind(*expression) {
                    NodeKind::AssignmentExpression { left, .. } => ast.member_path(*left),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(paths, vec!["obj[a'b]", "obj[AB]"]);
    }

    #[test]
    fn test_unescape_sequences() {
        assert_eq!(unescape("plain").as_deref(), Some("plain"));
        assert_eq!(unescape(r"a\nb\tc").as_deref(), Some("a\nb\tc"));
        assert_eq!(unescape(r#"\'\"\\"#).as_deref(), Some("'\"\\"));
        assert_eq!(unescape(r"\x41\u0042\u{43}").as_deref(), Some("ABC"));
        assert_eq!(unescape(r"\uD83D\uDE00").as_deref(), Some("\u{1F600}"));
        assert_eq!(unescape(r"\q\0").as_deref(), Some("q\0"));
        assert_eq!(unescape("line\\\ncontinued").as_deref(), Some("linecontinued"));
        assert_eq!(unescape(r"\x4"), None);
        assert_eq!(unescape(r"\uD83D"), None);
        assert_eq!(unescape(r"\u{}"), None);
        assert_eq!(unescape(r"\101"), None);
    }

    #[test]
    fn test_undecodable_string_stays_raw() {
        let ast = lower("x = '\\uD800';\n");
        let literal = ast
            .ids()
            .find(|id| matches!(ast.kind(*id), NodeKind::Literal { .. }))
            .unwrap();
        assert_eq!(
            ast.kind(literal),
            &NodeKind::Literal { value: LiteralValue::Other(r"'\uD800'".into()) }
        );
    }

    #[test]
    fn test_escaped_key_export() {
        let source = "const obj = {};\nobj['a\\'b'] = function () {};\nmodule.exports = obj;\n";
        assert!(exported(source, "obj[a'b]", AnalyzerOptions::default()));
    }

    #[test]
    fn test_exported_class_binds_methods() {
        for source in [
            "export class Foo {\n  bar() {}\n}\n",
            "export default class Foo {\n  bar() {}\n}\n",
        ] {
            assert!(exported(source, "Foo.bar", AnalyzerOptions::default()), "{}", source);
            assert!(!exported(source, "Foo", AnalyzerOptions::default()), "{}", source);
        }
    }

    #[test]
    fn test_properties_of_strings_not_exported() {
        let source = "const s = 'x';\ns.f = function () {};\nmodule.exports = s;\n";
        assert!(!exported(source, "s.f", AnalyzerOptions::default()));
    }

    #[test]
    fn test_deep_member_chain_is_bounded() {
        let source = format!("module.exports{} = function () {{}};\n", ".a".repeat(5_000));
        let ast = lower(&source);
        let analysis = analyzer::parse(&ast, &AnalyzerOptions::default());
        let candidates = ast.candidates();

        assert_eq!(candidates.len(), 1);
        assert!(!analysis.is_exported(candidates[0].node, &AnalyzerOptions::default()));
        assert!(ast.ids().any(|id| ast.kind(id).name() == "member_expression"));
    }

    #[test]
    fn test_commonjs_function_export() {
        let source = "function foo() {}\nmodule.exports = foo;\n";
        assert!(exported(source, "foo", AnalyzerOptions::common_js_only()));
    }

    #[test]
    fn test_unexported_functions() {
        let source = "function foo() {}\nfunction bar() {}\n";
        assert!(!exported(source, "foo", AnalyzerOptions::default()));
        assert!(!exported(source, "bar", AnalyzerOptions::default()));
    }

    #[test]
    fn test_esm_function_export() {
        assert!(exported("export function foo() {}\n", "foo", AnalyzerOptions::esm_only()));
    }

    #[test]
    fn test_object_property_export() {
        let source = "const obj = {};\nobj.a = function () {};\nmodule.exports = obj;\n";
        assert!(exported(source, "obj.a", AnalyzerOptions::default()));
    }

    #[test]
    fn test_default_class_exports_methods_only() {
        let source = "class Foo {\n  bar() {}\n}\nexport default Foo;\n";
        assert!(exported(source, "Foo.bar", AnalyzerOptions::default()));
        assert!(!exported(source, "Foo", AnalyzerOptions::default()));
    }

    #[test]
    fn test_object_literal_members() {
        let source = "module.exports = {\n  helper() {},\n  other: () => 1,\n  [dyn]: function () {},\n};\n";
        let ast = lower(source);
        let analysis = analyzer::parse(&ast, &AnalyzerOptions::default());
        let candidates = ast.candidates();

        let other = candidate(&candidates, "other");
        assert!(analysis.is_exported(other.node, &AnalyzerOptions::default()));
        let anonymous = candidate(&candidates, "<anonymous>");
        assert!(!analysis.is_exported(anonymous.node, &AnalyzerOptions::default()));
    }

    #[test]
    fn test_anonymous_default_export() {
        let ast = lower("export default function () {}\n");
        let analysis = analyzer::parse(&ast, &AnalyzerOptions::default());
        let candidates = ast.candidates();
        assert_eq!(candidates.len(), 1);
        assert!(analysis.is_exported(candidates[0].node, &AnalyzerOptions::default()));
    }

    #[test]
    fn test_specifiers_and_reexports() {
        let source = "function a() {}\nfunction b() {}\nexport { a };\nexport { b } from './other';\n";
        assert!(exported(source, "a", AnalyzerOptions::default()));
        assert!(!exported(source, "b", AnalyzerOptions::default()));
    }

    #[test]
    fn test_window_aliases_global_scope() {
        let source = "var api;\nwindow.api = function () {};\nexports.api = window.api;\n";
        assert!(exported(source, "window.api", AnalyzerOptions::default()));
        assert!(!exported(source, "window.api", AnalyzerOptions { init_window: false, ..AnalyzerOptions::default() }));
    }

    #[test]
    fn test_nested_statements_ignored() {
        let source = "function outer() {\n  module.exports = function inner() {};\n}\n";
        let ast = lower(source);
        let analysis = analyzer::parse(&ast, &AnalyzerOptions::default());
        let candidates = ast.candidates();
        assert_eq!(candidates.len(), 1);
        assert!(!analysis.is_exported(candidates[0].node, &AnalyzerOptions::default()));
    }
}
