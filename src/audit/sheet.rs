//! Extraction of ship dates from cargo data sheets.
//!
//! Every cargo folder is expected to hold a `Data {N}.csv` export (naming
//! varies between `Data 12`, `Data_12` and `data12`, so matching is loose).
//! Column C carries the ship date and column E the sales order number. The
//! placement is positional and the sheets come from a spreadsheet export, so
//! numbers often arrive as `104023.0` and dates in whichever format the
//! operator's locale produced that week.

use crate::errors::AuditError;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

const SHIP_DATE_COLUMN: usize = 2;
const SALES_ORDER_COLUMN: usize = 4;

/// One deduplicated sheet row: a sales order and its ship date, when the
/// sheet had a parseable one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub sales_order: String,
    pub ship_date: Option<NaiveDateTime>,
}

/// Locates the data sheet for a cargo inside its folder.
///
/// Matches any `.csv` file whose name contains one of the known naming
/// variants for this cargo number, case-insensitively. Candidates are sorted
/// so the pick is deterministic when several files match.
pub fn find_data_sheet(cargo_folder: &Path, cargo_number: &str) -> Option<PathBuf> {
    let patterns = [
        format!("data {cargo_number}"),
        format!("data_{cargo_number}"),
        format!("data{cargo_number}"),
    ];

    let mut candidates: Vec<PathBuf> = fs::read_dir(cargo_folder)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .filter(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            patterns.iter().any(|pattern| name.contains(pattern))
        })
        .collect();

    candidates.sort();
    candidates.into_iter().next()
}

/// Reads a data sheet and returns its unique sales orders in row order.
///
/// Duplicate sales orders keep their first occurrence; a later row may only
/// contribute its date when every earlier occurrence lacked one. Rows with an
/// empty sales-order cell are skipped.
pub fn extract_entries(path: &Path) -> Result<Vec<SheetEntry>, AuditError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| AuditError::SheetRead {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader.headers().map_err(|source| AuditError::SheetRead {
        path: path.to_path_buf(),
        source,
    })?;
    if headers.len() <= SALES_ORDER_COLUMN {
        return Err(AuditError::SheetEmpty {
            path: path.to_path_buf(),
        });
    }

    let mut order: Vec<String> = Vec::new();
    let mut dates: HashMap<String, Option<NaiveDateTime>> = HashMap::new();

    for record in reader.records() {
        let record = record.map_err(|source| AuditError::SheetRead {
            path: path.to_path_buf(),
            source,
        })?;

        let Some(sales_order) = record.get(SALES_ORDER_COLUMN).and_then(normalize_sales_order)
        else {
            continue;
        };
        let ship_date = record.get(SHIP_DATE_COLUMN).and_then(parse_ship_date);

        match dates.entry(sales_order.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(ship_date);
                order.push(sales_order);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().is_none() && ship_date.is_some() {
                    slot.insert(ship_date);
                }
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|sales_order| {
            let ship_date = dates.remove(&sales_order).flatten();
            SheetEntry {
                sales_order,
                ship_date,
            }
        })
        .collect())
}

/// Trims a sales-order cell and strips the `.0` suffix that spreadsheet
/// exports append to numeric cells. Empty cells yield `None`.
fn normalize_sales_order(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some((integer, fraction)) = trimmed.split_once('.') {
        if !integer.is_empty()
            && !fraction.is_empty()
            && integer.chars().all(|c| c.is_ascii_digit())
            && fraction.chars().all(|c| c == '0')
        {
            return Some(integer.to_string());
        }
    }
    Some(trimmed.to_string())
}

/// Parses a ship-date cell in any of the formats the sheets have used:
/// US datetime (`01/15/2026 08:30:00 AM`), day-first (`15/01/2026`) or ISO
/// (`2026-01-15`). Date-only values land at midnight.
pub(crate) fn parse_ship_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%m/%d/%Y %I:%M:%S %p") {
        return Some(parsed);
    }
    for format in ["%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}
