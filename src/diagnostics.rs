//! Soft-failure diagnostics
//!
//! Binding never aborts: a construct that cannot be resolved is skipped and
//! reported to a [`DiagnosticSink`]. The default sink forwards to `tracing`
//! at trace level; callers can silence or collect instead.

use crate::ast::{MAX_NESTING, NodeId};
use serde::Serialize;

/// Why a construct was skipped during binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Diagnostic {
    /// `obj.prop` read where `obj` or `prop` is unknown
    MissingProperty { node: NodeId, property: String },
    /// `name = <expr>` where `<expr>` did not resolve
    UnresolvedValue { node: NodeId, name: String },
    /// `obj.prop = <expr>` where the target could not be located
    UnresolvedTarget { node: NodeId, target: String },
    /// Expression kind outside the modeled subset
    Unsupported { node: NodeId, kind: String },
    /// Expression nested deeper than the resolver follows
    NestingLimit { node: NodeId },
}

impl Diagnostic {
    pub fn node(&self) -> NodeId {
        match self {
            Diagnostic::MissingProperty { node, .. }
            | Diagnostic::UnresolvedValue { node, .. }
            | Diagnostic::UnresolvedTarget { node, .. }
            | Diagnostic::Unsupported { node, .. }
            | Diagnostic::NestingLimit { node } => *node,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingProperty { property, .. } => {
                write!(f, "missing property `{}`", property)
            }
            Diagnostic::UnresolvedValue { name, .. } => {
                write!(f, "no value symbol for `{}`", name)
            }
            Diagnostic::UnresolvedTarget { target, .. } => {
                write!(f, "assignment target `{}` not found", target)
            }
            Diagnostic::Unsupported { kind, .. } => write!(f, "unsupported node `{}`", kind),
            Diagnostic::NestingLimit { .. } => {
                write!(f, "expression nested deeper than {} levels", MAX_NESTING)
            }
        }
    }
}

/// Receiver for soft failures
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `tracing::trace!`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(node = diagnostic.node().0, "{}", diagnostic);
    }
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Keeps diagnostics in arrival order
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_keeps_order() {
        let mut sink = CollectingSink::new();
        sink.report(Diagnostic::Unsupported { node: NodeId(1), kind: "IfStatement".into() });
        sink.report(Diagnostic::UnresolvedValue { node: NodeId(2), name: "x".into() });

        let diagnostics = sink.into_inner();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[1].node(), NodeId(2));
        assert_eq!(diagnostics[0].to_string(), "unsupported node `IfStatement`");
    }

    #[test]
    fn test_nesting_limit_message() {
        let diagnostic = Diagnostic::NestingLimit { node: NodeId(4) };
        assert_eq!(diagnostic.node(), NodeId(4));
        assert_eq!(diagnostic.to_string(), "expression nested deeper than 256 levels");
    }
}
