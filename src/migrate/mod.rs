//! Data migration between two hosted projects.
//!
//! Export walks the configured table list in foreign-key-safe order and pages
//! every row out through the REST layer into one JSON file per table under
//! `migrate.data_dir`. Import replays those files against the target project
//! in batched upserts. Both directions share [`MigrationStats`], which is
//! printed as a summary block at the end of a run.
//!
//! Tables are processed independently. A table that fails keeps its error in
//! the stats and the run moves on, so one bad table never blocks the rest.

pub mod validate;

use crate::config::MigrateSection;
use crate::errors::ApiError;
use crate::rest::{ProjectClient, RetryPolicy, with_retry};
use crate::ui::icons;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Per-run bookkeeping: row counts per table plus every error encountered.
#[derive(Debug)]
pub struct MigrationStats {
    exported: HashMap<String, usize>,
    imported: HashMap<String, usize>,
    errors: Vec<String>,
    started: Instant,
}

impl MigrationStats {
    pub fn new() -> Self {
        Self {
            exported: HashMap::new(),
            imported: HashMap::new(),
            errors: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn add_export(&mut self, table: &str, rows: usize) {
        self.exported.insert(table.to_string(), rows);
    }

    pub fn add_import(&mut self, table: &str, rows: usize) {
        self.imported.insert(table.to_string(), rows);
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn exported_rows(&self, table: &str) -> Option<usize> {
        self.exported.get(table).copied()
    }

    pub fn imported_rows(&self, table: &str) -> Option<usize> {
        self.imported.get(table).copied()
    }

    pub fn exported_total(&self) -> usize {
        self.exported.values().sum()
    }

    pub fn imported_total(&self) -> usize {
        self.imported.values().sum()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Prints the summary block. `tables` fixes the row order so the report
    /// matches the configured migration order rather than hash order.
    pub fn print_summary(&self, tables: &[String]) {
        let bar = "=".repeat(60);
        println!("\n{bar}");
        println!("MIGRATION SUMMARY");
        println!("{bar}");

        if !self.exported.is_empty() {
            println!("\nExported:");
            for table in tables {
                if let Some(rows) = self.exported.get(table) {
                    println!("  {table:<30} {rows:>6} rows");
                }
            }
            println!("  {:<30} {:>6} rows", "TOTAL", self.exported_total());
        }

        if !self.imported.is_empty() {
            println!("\nImported:");
            for table in tables {
                if let Some(rows) = self.imported.get(table) {
                    println!("  {table:<30} {rows:>6} rows");
                }
            }
            println!("  {:<30} {:>6} rows", "TOTAL", self.imported_total());
        }

        if !self.errors.is_empty() {
            println!("\nErrors: {}", self.errors.len());
            for error in self.errors.iter().take(5) {
                println!("  - {error}");
            }
            if self.errors.len() > 5 {
                println!("  ... and {} more", self.errors.len() - 5);
            }
        }

        println!("\nElapsed time: {:.2}s", self.started.elapsed().as_secs_f64());
        println!("{bar}");
    }
}

impl Default for MigrationStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Exports every configured table from `client` into `settings.data_dir`.
pub async fn export_tables(
    client: &ProjectClient,
    settings: &MigrateSection,
    stats: &mut MigrationStats,
) -> Result<()> {
    let progress = table_progress(settings.tables.len(), "Exporting");
    for table in &settings.tables {
        progress.set_message(table.clone());
        export_table(client, settings, table, stats, &progress).await?;
        progress.inc(1);
    }
    progress.finish_and_clear();
    Ok(())
}

/// Pages one table out and writes `{data_dir}/{table}.json`.
///
/// A missing table is logged and counted as zero rows; any other failure is
/// recorded in the stats. Both leave the run alive for the remaining tables.
async fn export_table(
    client: &ProjectClient,
    settings: &MigrateSection,
    table: &str,
    stats: &mut MigrationStats,
    progress: &ProgressBar,
) -> Result<()> {
    let retry = RetryPolicy::default();
    let mut rows: Vec<Value> = Vec::new();
    let mut offset = 0usize;

    loop {
        let page = match with_retry(&retry, || {
            client.fetch_page(table, offset, settings.export_batch_size)
        })
        .await
        {
            Ok(page) => page,
            Err(ApiError::TableMissing { .. }) => {
                progress.println(format!("{}{table}: table not found, skipping", icons::WARN));
                stats.add_export(table, 0);
                return Ok(());
            }
            Err(err) => {
                progress.println(format!("{}{table}: export failed: {err}", icons::CROSS));
                stats.add_error(format!("Export {table}: {err}"));
                return Ok(());
            }
        };

        if page.rows.is_empty() {
            break;
        }
        offset += page.rows.len();
        let short_page = page.rows.len() < settings.export_batch_size;
        let past_total = page.total.is_some_and(|total| offset as u64 >= total);
        rows.extend(page.rows);
        if past_total || short_page {
            break;
        }
    }

    write_export_file(&settings.data_dir, table, &rows)?;
    stats.add_export(table, rows.len());
    progress.println(format!("{}{table}: {} rows", icons::EXPORT, rows.len()));
    Ok(())
}

/// Envelope returned by the `export-data` edge function.
#[derive(Debug, Deserialize)]
struct ExportEnvelope {
    #[serde(default)]
    data: Vec<Value>,
}

/// Exports via the `export-data` edge function instead of the REST data API.
/// Useful when row-level security blocks the service role from direct reads.
pub async fn export_tables_via_function(
    client: &ProjectClient,
    settings: &MigrateSection,
    stats: &mut MigrationStats,
) -> Result<()> {
    let retry = RetryPolicy::default();
    let progress = table_progress(settings.tables.len(), "Exporting");

    for table in &settings.tables {
        progress.set_message(table.clone());
        let payload = serde_json::json!({ "table": table });
        match with_retry(&retry, || client.invoke_function("export-data", &payload)).await {
            Ok(response) => match serde_json::from_value::<ExportEnvelope>(response) {
                Ok(envelope) => {
                    write_export_file(&settings.data_dir, table, &envelope.data)?;
                    stats.add_export(table, envelope.data.len());
                    progress.println(format!(
                        "{}{table}: {} rows",
                        icons::EXPORT,
                        envelope.data.len()
                    ));
                }
                Err(err) => {
                    progress.println(format!(
                        "{}{table}: malformed export-data response: {err}",
                        icons::CROSS
                    ));
                    stats.add_error(format!("Export {table}: malformed response: {err}"));
                }
            },
            Err(err) => {
                progress.println(format!("{}{table}: export failed: {err}", icons::CROSS));
                stats.add_error(format!("Export {table}: {err}"));
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(())
}

/// Imports every configured table from `settings.data_dir` into `client`.
pub async fn import_tables(
    client: &ProjectClient,
    settings: &MigrateSection,
    stats: &mut MigrationStats,
) -> Result<()> {
    let progress = table_progress(settings.tables.len(), "Importing");
    for table in &settings.tables {
        progress.set_message(table.clone());
        import_table(client, settings, table, stats, &progress).await?;
        progress.inc(1);
    }
    progress.finish_and_clear();
    Ok(())
}

/// Replays one export file in `import_batch_size` chunks of upserts.
///
/// A failed batch is recorded and the remaining batches still run, so a
/// single conflicting row costs one batch rather than the whole table.
async fn import_table(
    client: &ProjectClient,
    settings: &MigrateSection,
    table: &str,
    stats: &mut MigrationStats,
    progress: &ProgressBar,
) -> Result<()> {
    let Some(rows) = load_export_file(&settings.data_dir, table)? else {
        progress.println(format!("{}{table}: no export file, skipping", icons::WARN));
        return Ok(());
    };
    if rows.is_empty() {
        stats.add_import(table, 0);
        progress.println(format!("{}{table}: 0 rows", icons::IMPORT));
        return Ok(());
    }

    let retry = RetryPolicy::default();
    let mut imported = 0usize;

    for (index, batch) in rows.chunks(settings.import_batch_size).enumerate() {
        match with_retry(&retry, || client.upsert_rows(table, batch)).await {
            Ok(()) => imported += batch.len(),
            Err(err) => {
                let start = index * settings.import_batch_size;
                stats.add_error(format!(
                    "Import {table} rows {start}-{}: {err}",
                    start + batch.len()
                ));
            }
        }
    }

    stats.add_import(table, imported);
    if imported == rows.len() {
        progress.println(format!("{}{table}: {imported} rows", icons::IMPORT));
    } else {
        progress.println(format!(
            "{}{table}: {imported} of {} rows",
            icons::WARN,
            rows.len()
        ));
    }
    Ok(())
}

/// Writes one table's rows as pretty-printed JSON, creating the directory
/// on first use. Returns the file path.
fn write_export_file(data_dir: &Path, table: &str, rows: &[Value]) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    let path = data_dir.join(format!("{table}.json"));
    let json = serde_json::to_string_pretty(rows)
        .with_context(|| format!("failed to serialize rows for {table}"))?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Reads one table's export file. `Ok(None)` means the file was never
/// written, which import treats as a skip rather than an error.
fn load_export_file(data_dir: &Path, table: &str) -> Result<Option<Vec<Value>>> {
    let path = data_dir.join(format!("{table}.json"));
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows: Vec<Value> = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a JSON array of rows", path.display()))?;
    Ok(Some(rows))
}

fn table_progress(tables: usize, prefix: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("progress bar template is a valid static string")
        .progress_chars("█▓▒░");
    let bar = ProgressBar::new(tables as u64);
    bar.set_style(style);
    bar.set_prefix(prefix.to_string());
    bar
}
