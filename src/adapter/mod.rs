//! Syntax Adapter Framework
//!
//! Each front-end turns a source file into the analyzer's grammar subset.
//! The binder and oracle never see parser-specific types.

pub mod framework;
pub mod javascript;
pub mod estree;

pub use framework::{SyntaxAdapter, AdapterRegistry, default_registry};
pub use javascript::JavaScriptAdapter;
pub use estree::EstreeAdapter;
