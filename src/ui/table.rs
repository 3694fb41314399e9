use crate::storage::{AuditReport, DbStats};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Rows")]
    pub rows: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            table: label.to_string(),
            rows: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Row counts per table
pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    for (table, count) in stats.rows() {
        builder.add_row(table, &count.to_string());
    }
    builder.build()
}

/// Finding counts per audit check
pub fn audit_table(report: &AuditReport) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("self follows", &report.self_follows.len().to_string());
    builder.add_row("cross-blog categories", &report.cross_blog_categories.len().to_string());
    builder.add_row("cross-blog tags", &report.cross_blog_tags.len().to_string());
    builder.add_row("articles without detail", &report.articles_without_detail.len().to_string());
    builder.build()
}
