//! CSV report of audit findings.
//!
//! One row per issue, covering both kinds the audit detects: sales orders
//! whose database record lacks a ship date, and orders whose database date
//! diverges from the sheet by more than the allowed window. The report is
//! what operations reviews, so its `Status` column records whether the run
//! already fixed the row or left it for a human.

use crate::errors::AuditError;
use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Missing,
    Divergent,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Missing => write!(f, "MISSING"),
            IssueKind::Divergent => write!(f, "DIVERGENT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    /// The run filled the missing date.
    Filled,
    /// Missing date left untouched (dry run, declined, or no sheet date).
    Pending,
    /// Divergent dates always need a human decision.
    Review,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Filled => write!(f, "Filled"),
            IssueStatus::Pending => write!(f, "Pending"),
            IssueStatus::Review => write!(f, "Review"),
        }
    }
}

/// One reportable finding for a sales order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub cargo: String,
    pub sales_order: String,
    pub kind: IssueKind,
    pub sheet_date: Option<NaiveDateTime>,
    pub db_date: Option<NaiveDateTime>,
    pub diff_days: Option<i64>,
    pub status: IssueStatus,
}

/// Writes all issues to `path` as CSV. An empty issue list still produces a
/// file with the header row, which downstream tooling treats as "all clean".
pub fn write_report(path: &Path, issues: &[Issue]) -> Result<(), AuditError> {
    let failed = |source| AuditError::ReportWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(failed)?;
    writer
        .write_record([
            "Cargo",
            "SO",
            "Kind",
            "SheetDate",
            "DbDate",
            "DiffDays",
            "Status",
        ])
        .map_err(failed)?;

    for issue in issues {
        let diff = issue
            .diff_days
            .map(|days| days.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        writer
            .write_record([
                issue.cargo.clone(),
                issue.sales_order.clone(),
                issue.kind.to_string(),
                date_cell(issue.sheet_date),
                date_cell(issue.db_date),
                diff,
                issue.status.to_string(),
            ])
            .map_err(failed)?;
    }

    writer.flush().map_err(|source| AuditError::ReportWriteFailed {
        path: path.to_path_buf(),
        source: source.into(),
    })?;
    Ok(())
}

fn date_cell(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
