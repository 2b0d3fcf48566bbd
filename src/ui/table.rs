use crate::report::CandidateStatus;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct CandidateRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Line")]
    pub line: u32,
    #[tabled(rename = "Exported")]
    pub exported: String,
}

/// Candidates of one module, one row each
#[derive(Default)]
pub struct CandidateTable {
    rows: Vec<CandidateRow>,
}

impl CandidateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, status: &CandidateStatus) {
        self.rows.push(CandidateRow {
            name: status.name.clone(),
            kind: status.kind.to_string(),
            line: status.line,
            exported: if status.exported { "yes" } else { "no" }.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let rows: Vec<TableRow> = stats
        .iter()
        .map(|(label, value)| TableRow {
            metric: label.to_string(),
            value: value.clone(),
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }

    Table::new(&rows).with(Style::rounded()).to_string()
}
