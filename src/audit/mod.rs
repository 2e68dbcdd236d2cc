//! Ship-date audit: cross-checks cargo data sheets against the database.
//!
//! A run scans the import drive for cargo folders, pulls the sales orders and
//! ship dates out of each cargo's data sheet, and compares them with what the
//! database holds, via the `query-shipments` function. Two findings matter:
//! a database record with no ship date at all (fillable from the sheet) and a
//! record whose date strays from the sheet by more than the allowed window.
//!
//! Whether missing dates get written back depends on [`AuditMode`]. Every
//! finding ends up in the issue list, which the report writer turns into a
//! CSV for the operations team.

use crate::config::AuditSection;
use crate::errors::AuditError;
use crate::rest::{ProjectClient, RetryPolicy, with_retry};
use crate::ui::icons;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

pub mod report;
pub mod scan;
pub mod sheet;

pub use report::{Issue, IssueKind, IssueStatus, write_report};
pub use scan::{CargoFolder, scan_cargo_folders};
pub use sheet::{SheetEntry, extract_entries, find_data_sheet};

/// How a run treats missing ship dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditMode {
    /// Detect and report, write nothing.
    DryRun,
    /// Fill every missing date that has a sheet date, no questions asked.
    AutoFill,
    /// Like auto-fill, but asks per cargo before writing.
    Interactive,
    /// Report generation only, same write behavior as a dry run.
    ReportOnly,
}

impl AuditMode {
    fn fills_enabled(self) -> bool {
        matches!(self, AuditMode::AutoFill | AuditMode::Interactive)
    }
}

/// Counters printed at the end of a run.
#[derive(Debug, Default)]
pub struct AuditStats {
    pub cargos_scanned: usize,
    pub sheets_found: usize,
    pub orders_extracted: usize,
    pub found_in_db: usize,
    pub not_found_in_db: usize,
    pub missing_ship_dates: usize,
    pub divergences: usize,
    pub auto_filled: usize,
    pub errors: usize,
}

impl AuditStats {
    pub fn print_summary(&self) {
        let bar = "=".repeat(60);
        println!("\n{bar}");
        println!("  AUDIT SUMMARY");
        println!("{bar}");
        println!("Cargo folders scanned:      {}", self.cargos_scanned);
        println!("Data sheets found:          {}", self.sheets_found);
        println!("Sales orders extracted:     {}", self.orders_extracted);
        println!("Found in database:          {}", self.found_in_db);
        println!("Not found in database:      {}", self.not_found_in_db);
        println!("Missing ship dates:         {}", self.missing_ship_dates);
        println!("Divergences found:          {}", self.divergences);
        println!("Auto-filled:                {}", self.auto_filled);
        println!("Errors:                     {}", self.errors);
        println!("{bar}");
    }
}

/// One shipment row as returned by the `query-shipments` function. Extra
/// fields in the response are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DbShipment {
    pub sales_order: String,
    #[serde(default)]
    pub ship_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    #[serde(default)]
    data: Vec<DbShipment>,
}

/// Drives the audit across cargo folders, caching database lookups so a
/// sales order that appears in several cargos is only queried once.
pub struct Auditor<'a> {
    client: &'a ProjectClient,
    settings: &'a AuditSection,
    mode: AuditMode,
    retry: RetryPolicy,
    cache: HashMap<String, Option<DbShipment>>,
    pub stats: AuditStats,
    pub issues: Vec<Issue>,
}

impl<'a> Auditor<'a> {
    pub fn new(client: &'a ProjectClient, settings: &'a AuditSection, mode: AuditMode) -> Self {
        Self {
            client,
            settings,
            mode,
            retry: RetryPolicy::default(),
            cache: HashMap::new(),
            stats: AuditStats::default(),
            issues: Vec::new(),
        }
    }

    /// Audits a single cargo folder end to end. Failures are absorbed into
    /// the stats so one broken sheet never stops the run.
    pub async fn audit_cargo(&mut self, cargo: &CargoFolder) {
        let folder_name = cargo
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("\n--- Cargo {}: {}", cargo.number, folder_name);

        let Some(sheet_path) = find_data_sheet(&cargo.path, &cargo.number) else {
            println!("  {}no data sheet found", icons::WARN);
            return;
        };
        let sheet_name = sheet_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {}sheet: {sheet_name}", icons::FOLDER);
        self.stats.sheets_found += 1;

        let entries = match extract_entries(&sheet_path) {
            Ok(entries) => entries,
            Err(AuditError::SheetEmpty { .. }) => {
                println!("  {}sheet has too few columns, skipping", icons::WARN);
                return;
            }
            Err(err) => {
                println!("  {}{err}", icons::CROSS);
                self.stats.errors += 1;
                return;
            }
        };
        if entries.is_empty() {
            println!("  no sales orders in sheet");
            return;
        }
        println!("  {} unique sales orders", entries.len());
        self.stats.orders_extracted += entries.len();

        let orders: Vec<String> = entries.iter().map(|e| e.sales_order.clone()).collect();
        let db_rows = self.lookup_orders(&orders).await;

        let found = db_rows.values().filter(|row| row.is_some()).count();
        let not_found = db_rows.len() - found;
        self.stats.found_in_db += found;
        self.stats.not_found_in_db += not_found;
        if not_found > 0 {
            println!("  {found} found in database, {not_found} not found");
        }

        let mut fills: Vec<(String, NaiveDateTime)> = Vec::new();
        let mut queued: Vec<usize> = Vec::new();

        for entry in &entries {
            let Some(db_row) = db_rows.get(&entry.sales_order).and_then(|row| row.as_ref())
            else {
                continue;
            };
            let db_raw = db_row
                .ship_date
                .as_deref()
                .map(str::trim)
                .filter(|raw| !raw.is_empty());

            match db_raw {
                None => {
                    self.stats.missing_ship_dates += 1;
                    let fill_now = self.mode.fills_enabled() && entry.ship_date.is_some();
                    self.issues.push(Issue {
                        cargo: cargo.number.clone(),
                        sales_order: entry.sales_order.clone(),
                        kind: IssueKind::Missing,
                        sheet_date: entry.ship_date,
                        db_date: None,
                        diff_days: None,
                        status: if fill_now {
                            IssueStatus::Filled
                        } else {
                            IssueStatus::Pending
                        },
                    });
                    if fill_now {
                        if let Some(date) = entry.ship_date {
                            fills.push((entry.sales_order.clone(), date));
                            queued.push(self.issues.len() - 1);
                        }
                    } else {
                        let sheet = entry
                            .ship_date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_else(|| "N/A".to_string());
                        println!(
                            "  SO {}: ship date missing (sheet: {sheet})",
                            entry.sales_order
                        );
                    }
                }
                Some(raw) => {
                    let Some(sheet_date) = entry.ship_date else {
                        continue;
                    };
                    let Some(db_date) = parse_db_timestamp(raw) else {
                        println!(
                            "  {}SO {}: unparseable database ship date '{raw}'",
                            icons::WARN,
                            entry.sales_order
                        );
                        self.stats.errors += 1;
                        continue;
                    };
                    let diff = (db_date.date() - sheet_date.date()).num_days().abs();
                    if diff > self.settings.divergence_days {
                        self.stats.divergences += 1;
                        self.issues.push(Issue {
                            cargo: cargo.number.clone(),
                            sales_order: entry.sales_order.clone(),
                            kind: IssueKind::Divergent,
                            sheet_date: Some(sheet_date),
                            db_date: Some(db_date),
                            diff_days: Some(diff),
                            status: IssueStatus::Review,
                        });
                        println!(
                            "  SO {}: DIVERGENT db {} vs sheet {} ({diff} days)",
                            entry.sales_order,
                            db_date.format("%Y-%m-%d"),
                            sheet_date.format("%Y-%m-%d")
                        );
                    }
                }
            }
        }

        if self.mode == AuditMode::Interactive && !fills.is_empty() {
            use dialoguer::Confirm;
            let accepted = Confirm::new()
                .with_prompt(format!(
                    "Fill {} missing ship dates for cargo {}?",
                    fills.len(),
                    cargo.number
                ))
                .default(false)
                .interact()
                .unwrap_or(false);
            if !accepted {
                println!("  skipped {} fills", fills.len());
                for index in &queued {
                    self.issues[*index].status = IssueStatus::Pending;
                }
                fills.clear();
            }
        }

        if !fills.is_empty() {
            println!("  updating {} sales orders...", fills.len());
            let updated = self.apply_fills(&fills).await;
            self.stats.auto_filled += updated;
            println!("  {}{updated} updated", icons::CHECK);
        }
    }

    /// Batched, cached lookup of sales orders in the database. Orders a
    /// failed batch could not resolve are cached as absent so they are not
    /// retried on the next cargo.
    async fn lookup_orders(
        &mut self,
        orders: &[String],
    ) -> HashMap<String, Option<DbShipment>> {
        let mut unique: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for so in orders {
            if seen.insert(so.as_str()) {
                unique.push(so.clone());
            }
        }

        let uncached: Vec<String> = unique
            .iter()
            .filter(|so| !self.cache.contains_key(so.as_str()))
            .cloned()
            .collect();

        let client = self.client;
        for batch in uncached.chunks(self.settings.query_batch_size) {
            let payload = json!({ "sales_orders": batch });
            let result =
                with_retry(&self.retry, || client.invoke_function("query-shipments", &payload))
                    .await;
            match result.and_then(|response| {
                serde_json::from_value::<QueryEnvelope>(response).map_err(|err| {
                    crate::errors::ApiError::Function {
                        name: "query-shipments".to_string(),
                        message: format!("malformed response: {err}"),
                    }
                })
            }) {
                Ok(envelope) => {
                    for row in envelope.data {
                        self.cache.insert(row.sales_order.clone(), Some(row));
                    }
                }
                Err(err) => {
                    println!("  {}sales-order lookup failed: {err}", icons::CROSS);
                    self.stats.errors += 1;
                }
            }
            for so in batch {
                self.cache.entry(so.clone()).or_insert(None);
            }
        }

        unique
            .into_iter()
            .map(|so| {
                let row = self.cache.get(&so).cloned().unwrap_or(None);
                (so, row)
            })
            .collect()
    }

    /// Pushes queued fills through `update-ship-dates` in batches. Returns
    /// how many rows the database reports as updated.
    async fn apply_fills(&mut self, fills: &[(String, NaiveDateTime)]) -> usize {
        let client = self.client;
        let mut updated = 0usize;

        for batch in fills.chunks(self.settings.update_batch_size) {
            let updates: Vec<Value> = batch
                .iter()
                .map(|(sales_order, date)| {
                    json!({
                        "sales_order": sales_order,
                        "ship_date": date.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    })
                })
                .collect();
            let payload = json!({ "updates": updates });

            let result = with_retry(&self.retry, || {
                client.invoke_function("update-ship-dates", &payload)
            })
            .await;
            match result {
                Ok(response) => {
                    updated += response
                        .get("updated")
                        .and_then(Value::as_u64)
                        .unwrap_or(0) as usize;
                }
                Err(err) => {
                    println!("  {}batch update failed: {err}", icons::CROSS);
                    self.stats.errors += 1;
                }
            }
        }

        updated
    }
}

/// Parses the timestamp format the database returns for ship dates. Accepts
/// RFC 3339 with any offset, a bare datetime, or a bare date.
pub(crate) fn parse_db_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
