//! Configuration for the shipops CLI.
//!
//! Settings load from `shipops.toml` in the working directory (or the
//! path given with `--config`), with key material optionally coming
//! from the environment. Layering is file → environment → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [source]
//! url = "https://old-project.example.co"
//! key = "anon-key"
//!
//! [target]
//! url = "https://new-project.example.co"
//! key = "anon-key"
//! service_key = "service-role-key"
//!
//! [migrate]
//! data_dir = "migration_data"
//! export_batch_size = 1000
//! import_batch_size = 100
//!
//! [schema]
//! migrations_dir = "migrations"
//! output = "full_schema.sql"
//!
//! [audit]
//! base_dir = "/imports"
//! year_filter = "2026"
//! query_batch_size = 500
//! update_batch_size = 200
//! divergence_days = 1
//! report = "audit_report.csv"
//! ```
//!
//! Keys can also be supplied as `SHIPOPS_SOURCE_KEY`,
//! `SHIPOPS_TARGET_KEY`, and `SHIPOPS_TARGET_SERVICE_KEY` (a `.env`
//! file is honored); the environment wins over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Endpoint and credentials for one hosted project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Project base URL, e.g. `https://old-project.example.co`.
    #[serde(default)]
    pub url: String,
    /// Anon/public API key.
    #[serde(default)]
    pub key: String,
    /// Service-role key. Imports need it to bypass row security.
    #[serde(default)]
    pub service_key: Option<String>,
}

impl ProjectSection {
    /// Key used for writes: the service-role key when present,
    /// otherwise the anon key.
    pub fn write_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.key)
    }
}

/// Settings for table export/import between projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateSection {
    /// Directory holding the per-table `{table}.json` export files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Rows per Range-paginated export page.
    #[serde(default = "default_export_batch_size")]
    pub export_batch_size: usize,
    /// Rows per upsert POST during import.
    #[serde(default = "default_import_batch_size")]
    pub import_batch_size: usize,
    /// Tables in foreign-key-safe import order.
    #[serde(default = "default_tables")]
    pub tables: Vec<String>,
}

/// Settings for schema assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSection {
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    #[serde(default = "default_schema_output")]
    pub output: PathBuf,
}

/// Settings for the ship-date audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSection {
    /// Directory containing the `IMPORTS <year>` folders.
    #[serde(default = "default_audit_base_dir")]
    pub base_dir: PathBuf,
    /// Limit scanning to one year folder, e.g. "2026". Unset scans all.
    #[serde(default)]
    pub year_filter: Option<String>,
    /// Sales orders per lookup call.
    #[serde(default = "default_query_batch_size")]
    pub query_batch_size: usize,
    /// Rows per ship-date fill call.
    #[serde(default = "default_update_batch_size")]
    pub update_batch_size: usize,
    /// Tolerated |db - sheet| difference before a date counts as
    /// divergent.
    #[serde(default = "default_divergence_days")]
    pub divergence_days: i64,
    /// CSV report path.
    #[serde(default = "default_report_path")]
    pub report: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("migration_data")
}

fn default_export_batch_size() -> usize {
    1000
}

fn default_import_batch_size() -> usize {
    100
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_schema_output() -> PathBuf {
    PathBuf::from("full_schema.sql")
}

fn default_audit_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_query_batch_size() -> usize {
    500
}

fn default_update_batch_size() -> usize {
    200
}

fn default_divergence_days() -> i64 {
    1
}

fn default_report_path() -> PathBuf {
    PathBuf::from("audit_report.csv")
}

/// Tables in dependency order: parents before children, so an import
/// that walks the list never hits a missing foreign key.
fn default_tables() -> Vec<String> {
    [
        "profiles",
        "customers",
        "customer_contacts",
        "alert_rules",
        "cargos",
        "processed_shipments",
        "cargo_sales_orders",
        "cargo_history",
        "shipment_history",
        "tracking_master",
        "customer_assignments",
        "active_alerts",
        "notifications",
        "notification_queue",
        "auth_attempts",
        "security_audit_log",
        "user_roles",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for MigrateSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_batch_size: default_export_batch_size(),
            import_batch_size: default_import_batch_size(),
            tables: default_tables(),
        }
    }
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            output: default_schema_output(),
        }
    }
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            base_dir: default_audit_base_dir(),
            year_filter: None,
            query_batch_size: default_query_batch_size(),
            update_batch_size: default_update_batch_size(),
            divergence_days: default_divergence_days(),
            report: default_report_path(),
        }
    }
}

/// Root configuration, one section per concern. Every section has full
/// defaults so a missing file still yields a usable config for
/// commands that need no credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsConfig {
    #[serde(default)]
    pub source: ProjectSection,
    #[serde(default)]
    pub target: ProjectSection,
    #[serde(default)]
    pub migrate: MigrateSection,
    #[serde(default)]
    pub schema: SchemaSection,
    #[serde(default)]
    pub audit: AuditSection,
}

impl OpsConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse shipops.toml")
    }

    /// Load from the given path, falling back to defaults when the
    /// file does not exist. Environment overrides are applied either
    /// way.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Pull key material from the environment. Set variables win over
    /// file contents.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("SHIPOPS_SOURCE_KEY") {
            self.source.key = key;
        }
        if let Ok(key) = std::env::var("SHIPOPS_TARGET_KEY") {
            self.target.key = key;
        }
        if let Ok(key) = std::env::var("SHIPOPS_TARGET_SERVICE_KEY") {
            self.target.service_key = Some(key);
        }
    }

    /// Source project, validated for commands that read from it.
    pub fn require_source(&self) -> Result<&ProjectSection> {
        require_project(&self.source, "source")
    }

    /// Target project, validated for commands that write to it.
    pub fn require_target(&self) -> Result<&ProjectSection> {
        require_project(&self.target, "target")
    }
}

fn require_project<'a>(section: &'a ProjectSection, name: &str) -> Result<&'a ProjectSection> {
    if section.url.is_empty() {
        bail!("No [{name}] url configured; set it in shipops.toml");
    }
    if section.key.is_empty() {
        bail!(
            "No [{name}] key configured; set it in shipops.toml or SHIPOPS_{}_KEY",
            name.to_uppercase()
        );
    }
    Ok(section)
}
