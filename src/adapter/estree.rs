//! ESTree adapter
//!
//! Reads the JSON syntax trees external parsers (acorn, espree, babel with
//! `estree` plugin) emit. Node kinds outside the subset are kept as `Other`;
//! a supported node missing a required field is a malformed tree.

use crate::ast::{
    Ast, AstBuilder, DeclarationKind, LiteralValue, MAX_NESTING, MethodDefinition, NodeId,
    NodeKind, Property, Span, VariableDeclarator,
};
use crate::{Error, Result};
use super::framework::SyntaxAdapter;
use serde_json::Value;
use std::path::Path;

const SUFFIX: &str = ".estree.json";

/// ESTree JSON front-end for `*.estree.json` files
#[derive(Debug, Default, Clone, Copy)]
pub struct EstreeAdapter;

impl EstreeAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Lower an already-decoded ESTree `Program`
    pub fn lower(&self, program: &Value) -> Result<Ast> {
        let mut lowering = Lowering { builder: AstBuilder::new(), depth: 0 };
        let body = match kind_of(program)? {
            "Program" => array(program, "body")?
                .iter()
                .map(|statement| lowering.node(statement))
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(Error::MalformedTree(format!("expected Program, found {}", other)));
            }
        };
        lowering.builder.at_line(span_of(program).start_line);
        Ok(lowering.builder.program(body))
    }
}

impl SyntaxAdapter for EstreeAdapter {
    fn language_name(&self) -> &str {
        "ESTree"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(SUFFIX))
    }

    fn parse_source(&self, path: &str, content: &str) -> Result<Ast> {
        let program: Value = serde_json::from_str(content)?;
        self.lower(&program).map_err(|e| match e {
            Error::MalformedTree(detail) => Error::MalformedTree(format!("{}: {}", path, detail)),
            other => other,
        })
    }
}

struct Lowering {
    builder: AstBuilder,
    depth: usize,
}

impl Lowering {
    /// Lower one node; subtrees nested past [`MAX_NESTING`] become `Other`
    fn node(&mut self, value: &Value) -> Result<NodeId> {
        if self.depth >= MAX_NESTING {
            let kind = NodeKind::Other { kind: kind_of(value)?.to_string() };
            return Ok(self.builder.push_spanned(kind, span_of(value)));
        }
        self.depth += 1;
        let id = self.lower_node(value);
        self.depth -= 1;
        id
    }

    fn lower_node(&mut self, value: &Value) -> Result<NodeId> {
        let span = span_of(value);
        let kind = match kind_of(value)? {
            "ExpressionStatement" => NodeKind::ExpressionStatement {
                expression: self.field(value, "expression")?,
            },
            "VariableDeclaration" => {
                let keyword = string(value, "kind")?;
                let kind = DeclarationKind::from_keyword(keyword).ok_or_else(|| {
                    Error::MalformedTree(format!("unknown declaration kind {}", keyword))
                })?;
                let declarations = array(value, "declarations")?
                    .iter()
                    .map(|declarator| {
                        Ok(VariableDeclarator {
                            id: self.field(declarator, "id")?,
                            init: self.optional_field(declarator, "init")?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                NodeKind::VariableDeclaration { kind, declarations }
            }
            "AssignmentExpression" => {
                // Compound operators (`+=`) do not rebind
                if value.get("operator").and_then(Value::as_str).is_some_and(|op| op != "=") {
                    NodeKind::Other { kind: "AssignmentExpression".to_string() }
                } else {
                    NodeKind::AssignmentExpression {
                        left: self.field(value, "left")?,
                        right: self.field(value, "right")?,
                    }
                }
            }
            "Identifier" => NodeKind::Identifier { name: string(value, "name")?.to_string() },
            "MemberExpression" => NodeKind::MemberExpression {
                object: self.field(value, "object")?,
                property: self.field(value, "property")?,
                computed: flag(value, "computed"),
            },
            "FunctionDeclaration" => NodeKind::FunctionDeclaration {
                id: self.optional_field(value, "id")?,
            },
            "FunctionExpression" => NodeKind::FunctionExpression {
                id: self.optional_field(value, "id")?,
            },
            "ArrowFunctionExpression" => NodeKind::ArrowFunctionExpression,
            "ClassDeclaration" | "ClassExpression" => NodeKind::ClassDeclaration {
                id: self.optional_field(value, "id")?,
                body: self.field(value, "body")?,
            },
            "ClassBody" => {
                let mut body = Vec::new();
                for member in array(value, "body")? {
                    if kind_of(member)? != "MethodDefinition" {
                        continue;
                    }
                    body.push(MethodDefinition {
                        key: self.field(member, "key")?,
                        value: self.field(member, "value")?,
                        computed: flag(member, "computed"),
                    });
                }
                NodeKind::ClassBody { body }
            }
            "ObjectExpression" => {
                let mut properties = Vec::new();
                for property in array(value, "properties")? {
                    if kind_of(property)? != "Property" {
                        continue;
                    }
                    properties.push(Property {
                        key: self.field(property, "key")?,
                        value: self.field(property, "value")?,
                        computed: flag(property, "computed"),
                    });
                }
                NodeKind::ObjectExpression { properties }
            }
            "Literal" => NodeKind::Literal { value: literal_value(value) },
            "ExportDefaultDeclaration" => NodeKind::ExportDefaultDeclaration {
                declaration: self.field(value, "declaration")?,
            },
            "ExportNamedDeclaration" => {
                let declaration = self.optional_field(value, "declaration")?;
                let reexport = value.get("source").is_some_and(|source| !source.is_null());
                let specifiers = if reexport {
                    Vec::new()
                } else {
                    array(value, "specifiers")?
                        .iter()
                        .map(|specifier| self.node(specifier))
                        .collect::<Result<Vec<_>>>()?
                };
                NodeKind::ExportNamedDeclaration { declaration, specifiers }
            }
            "ExportSpecifier" => NodeKind::ExportSpecifier { local: self.field(value, "local")? },
            "ParenthesizedExpression" => return self.field(value, "expression"),
            other => NodeKind::Other { kind: other.to_string() },
        };
        Ok(self.builder.push_spanned(kind, span))
    }

    fn field(&mut self, value: &Value, name: &str) -> Result<NodeId> {
        match value.get(name) {
            Some(child) if !child.is_null() => self.node(child),
            _ => Err(missing(value, name)),
        }
    }

    fn optional_field(&mut self, value: &Value, name: &str) -> Result<Option<NodeId>> {
        match value.get(name) {
            Some(child) if !child.is_null() => self.node(child).map(Some),
            _ => Ok(None),
        }
    }
}

fn kind_of(value: &Value) -> Result<&str> {
    value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedTree("node without a `type`".to_string()))
}

fn string<'v>(value: &'v Value, name: &str) -> Result<&'v str> {
    value
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(value, name))
}

fn array<'v>(value: &'v Value, name: &str) -> Result<&'v Vec<Value>> {
    value
        .get(name)
        .and_then(Value::as_array)
        .ok_or_else(|| missing(value, name))
}

fn flag(value: &Value, name: &str) -> bool {
    value.get(name).and_then(Value::as_bool).unwrap_or(false)
}

fn missing(value: &Value, name: &str) -> Error {
    let kind = kind_of(value).unwrap_or("node");
    Error::MalformedTree(format!("{} is missing `{}`", kind, name))
}

fn literal_value(value: &Value) -> LiteralValue {
    if value.get("regex").is_some() || value.get("bigint").is_some() {
        let raw = value.get("raw").and_then(Value::as_str).unwrap_or_default();
        return LiteralValue::Other(raw.to_string());
    }
    match value.get("value") {
        Some(Value::String(s)) => LiteralValue::String(s.clone()),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(LiteralValue::Number)
            .unwrap_or_else(|| LiteralValue::Other(n.to_string())),
        Some(Value::Bool(b)) => LiteralValue::Boolean(*b),
        _ => LiteralValue::Null,
    }
}

fn span_of(value: &Value) -> Span {
    let line = |edge: &str| {
        value
            .pointer(&format!("/loc/{}/line", edge))
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32
    };
    Span::new(line("start"), line("end"))
}
