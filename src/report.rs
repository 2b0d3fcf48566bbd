//! Per-file export report
//!
//! Pairs every candidate of a module with the oracle's answer.

use crate::analyzer::{AnalyzerOptions, ModuleAnalysis};
use crate::ast::{Ast, CandidateKind, NodeId};

/// One candidate and whether it is exported
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CandidateStatus {
    pub node: NodeId,
    pub name: String,
    pub kind: CandidateKind,
    pub line: u32,
    pub exported: bool,
}

/// Export answers for one module
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExportReport {
    pub path: String,
    pub candidates: Vec<CandidateStatus>,
}

impl ExportReport {
    pub fn build(path: &str, ast: &Ast, analysis: &ModuleAnalysis, options: &AnalyzerOptions) -> Self {
        let candidates = ast
            .candidates()
            .into_iter()
            .map(|c| CandidateStatus {
                exported: analysis.is_exported(c.node, options),
                node: c.node,
                name: c.name,
                kind: c.kind,
                line: c.line,
            })
            .collect();

        Self { path: path.to_string(), candidates }
    }

    pub fn exported(&self) -> impl Iterator<Item = &CandidateStatus> {
        self.candidates.iter().filter(|c| c.exported)
    }

    pub fn exported_count(&self) -> usize {
        self.exported().count()
    }

    /// Only the exported candidates
    pub fn retain_exported(mut self) -> Self {
        self.candidates.retain(|c| c.exported);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer;
    use crate::ast::{AstBuilder, DeclarationKind};

    fn sample() -> (Ast, NodeId, NodeId) {
        // function internal(){} const api = { run: function(){} }; module.exports = api;
        let mut b = AstBuilder::new();
        b.at_line(1);
        let internal = b.function_declaration(Some("internal"));
        b.at_line(2);
        let run = b.function_expression();
        let prop = b.property("run", run);
        let obj = b.object(vec![prop]);
        let decl = b.variable(DeclarationKind::Const, "api", Some(obj));
        b.at_line(3);
        let target = b.path("module.exports");
        let api = b.identifier("api");
        let export = b.assign_statement(target, api);
        (b.program(vec![internal, decl, export]), internal, run)
    }

    #[test]
    fn test_report_marks_each_candidate() {
        let (ast, internal, run) = sample();
        let options = AnalyzerOptions::default();
        let analysis = analyzer::parse(&ast, &options);
        let report = ExportReport::build("api.js", &ast, &analysis, &options);

        let status = |node| report.candidates.iter().find(|c| c.node == node).unwrap();
        assert!(!status(internal).exported);
        assert!(status(run).exported);
        assert_eq!(status(internal).line, 1);
        assert_eq!(report.exported_count(), 2);
    }

    #[test]
    fn test_retain_exported_and_json_shape() {
        let (ast, _, _) = sample();
        let options = AnalyzerOptions::default();
        let analysis = analyzer::parse(&ast, &options);
        let report = ExportReport::build("api.js", &ast, &analysis, &options).retain_exported();

        assert!(report.candidates.iter().all(|c| c.exported));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["path"], "api.js");
        assert_eq!(json["candidates"][0]["exported"], true);
    }
}
