//! Core adapter framework
//!
//! Defines the trait every syntax front-end implements and the registry that
//! picks one per file.

use crate::Result;
use crate::ast::Ast;
use std::path::Path;

/// Trait for syntax front-ends
///
/// Each adapter is responsible for:
/// 1. Identifying files it can parse
/// 2. Producing a syntax tree restricted to the supported grammar subset
pub trait SyntaxAdapter: Send + Sync {
    /// Get the language name (for display)
    fn language_name(&self) -> &str;

    /// Get file extensions this adapter handles
    fn file_extensions(&self) -> &[&str];

    /// Check if this adapter can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.file_extensions().contains(&ext)
        } else {
            false
        }
    }

    /// Parse file contents into a syntax tree
    fn parse_source(&self, path: &str, content: &str) -> Result<Ast>;
}

/// Registry of syntax adapters
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SyntaxAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter
    pub fn register(&mut self, adapter: impl SyntaxAdapter + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    /// Find an adapter for a file; earlier registrations win
    pub fn find_adapter(&self, path: &Path) -> Option<&dyn SyntaxAdapter> {
        self.adapters
            .iter()
            .find(|a| a.can_handle(path))
            .map(|a| a.as_ref())
    }

    /// Parse a file using the appropriate adapter
    pub fn parse_file(&self, path: &Path, content: &str) -> Result<Option<Ast>> {
        if let Some(adapter) = self.find_adapter(path) {
            let display_path = path.to_string_lossy();
            let ast = adapter.parse_source(&display_path, content)?;
            Ok(Some(ast))
        } else {
            Ok(None)
        }
    }
}

/// Create a default registry with all built-in adapters
pub fn default_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(super::estree::EstreeAdapter::new());
    registry.register(super::javascript::JavaScriptAdapter::new());
    registry
}
