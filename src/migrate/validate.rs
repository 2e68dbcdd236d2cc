//! Integrity check for exported migration data.
//!
//! Run between export and import: every configured table must have a
//! readable JSON array under the data directory before an import is worth
//! attempting. Missing files are tolerated (the table may simply be empty
//! upstream) but a corrupt file fails the whole validation.

use anyhow::{Result, bail};
use console::style;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Outcome for a single table's export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Valid { rows: usize },
    Missing,
    Invalid { reason: String },
}

#[derive(Debug)]
pub struct TableReport {
    pub table: String,
    pub status: TableStatus,
}

/// Validation results for the full table list, in configured order.
#[derive(Debug)]
pub struct ValidationReport {
    pub tables: Vec<TableReport>,
}

impl ValidationReport {
    pub fn valid_count(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| matches!(t.status, TableStatus::Valid { .. }))
            .count()
    }

    pub fn missing_count(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| t.status == TableStatus::Missing)
            .count()
    }

    pub fn invalid_count(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| matches!(t.status, TableStatus::Invalid { .. }))
            .count()
    }

    pub fn total_rows(&self) -> usize {
        self.tables
            .iter()
            .filter_map(|t| match t.status {
                TableStatus::Valid { rows } => Some(rows),
                _ => None,
            })
            .sum()
    }

    /// Import is safe only when nothing is corrupt and at least one table
    /// actually has data on disk.
    pub fn passed(&self) -> bool {
        self.invalid_count() == 0 && self.valid_count() > 0
    }
}

/// Checks every table's export file under `data_dir`.
pub fn validate_data_dir(data_dir: &Path, tables: &[String]) -> Result<ValidationReport> {
    if !data_dir.is_dir() {
        bail!(
            "data directory {} does not exist; run the export first",
            data_dir.display()
        );
    }

    let tables = tables
        .iter()
        .map(|table| TableReport {
            table: table.clone(),
            status: validate_file(&data_dir.join(format!("{table}.json"))),
        })
        .collect();

    Ok(ValidationReport { tables })
}

fn validate_file(path: &Path) -> TableStatus {
    if !path.exists() {
        return TableStatus::Missing;
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            return TableStatus::Invalid {
                reason: format!("read error: {err}"),
            };
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(rows)) => TableStatus::Valid { rows: rows.len() },
        Ok(_) => TableStatus::Invalid {
            reason: "not a JSON array".to_string(),
        },
        Err(err) => TableStatus::Invalid {
            reason: format!("JSON error: {err}"),
        },
    }
}

/// Renders the per-table listing and the summary block.
pub fn print_report(data_dir: &Path, report: &ValidationReport) {
    let bar = "=".repeat(60);
    let rule = "-".repeat(60);

    println!("{bar}");
    println!("MIGRATION DATA VALIDATION");
    println!("{bar}");
    println!("Data directory: {}\n", data_dir.display());

    println!("{:<30} {:<8} {:>10}  Notes", "Table", "Status", "Rows");
    println!("{rule}");
    for entry in &report.tables {
        let (glyph, rows, notes) = match &entry.status {
            TableStatus::Valid { rows } => ("✓", *rows, String::new()),
            TableStatus::Missing => ("⚠", 0, "file not found".to_string()),
            TableStatus::Invalid { reason } => ("✗", 0, reason.clone()),
        };
        println!("{:<30} {:<8} {:>10}  {}", entry.table, glyph, rows, notes);
    }
    println!("{rule}");
    println!("{:<30} {:<8} {:>10}", "TOTAL", "", report.total_rows());

    let total = report.tables.len();
    println!("\n{bar}");
    println!("SUMMARY");
    println!("{bar}");
    println!("Valid tables:    {:>3} / {total}", report.valid_count());
    println!("Missing tables:  {:>3} / {total}", report.missing_count());
    println!("Invalid tables:  {:>3} / {total}", report.invalid_count());
    println!("Total rows:      {:>10}", report.total_rows());
    println!("{bar}");

    if report.invalid_count() > 0 {
        println!(
            "\n{}",
            style("Some files are invalid. Check errors above.").red()
        );
    } else if report.valid_count() == 0 {
        println!("\n{}", style("No valid data found. Run export first.").red());
    } else {
        println!(
            "\n{}",
            style(format!(
                "Validation passed. Ready to import {} rows.",
                report.total_rows()
            ))
            .green()
        );
    }
}
