//! Binding - builds the symbol graph from a module's top-level statements
//!
//! The resolver interprets individual expressions; the passes walk the
//! module body and feed declarations and assignments through it.

pub mod passes;
pub mod resolver;

pub use passes::{Binder, DEFAULT_EXPORT};
pub use resolver::{ResolveOptions, SymbolResolver};
