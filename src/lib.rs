//! # Exportgraph - Export Reachability for JavaScript Modules
//!
//! Decides whether a function, class, method or object literal in a module
//! is part of that module's public surface.
//!
//! Exportgraph provides:
//! - A syntax tree restricted to the constructs that create bindings
//! - An inferred symbol graph of scopes, objects and their properties
//! - Reachability queries from `module.exports` and ESM export flags
//! - tree-sitter and ESTree JSON front-ends

pub mod ast;
pub mod symbol;
pub mod diagnostics;
pub mod binding;
pub mod oracle;
pub mod analyzer;
pub mod adapter;
pub mod report;
pub mod ignore;
pub mod output;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use ast::{Ast, AstBuilder, NodeId, NodeKind};
pub use symbol::{SymbolGraph, SymbolId, SymbolKind, SymbolNode};
pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use analyzer::{AnalyzerOptions, ModuleAnalysis, is_exported, parse, parse_with_sink};

/// Result type alias for Exportgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Exportgraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Malformed syntax tree: {0}")]
    MalformedTree(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}
