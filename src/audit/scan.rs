//! Discovery of cargo folders on the shared import drive.
//!
//! The drive is organized as `{base_dir}/IMPORTS {YYYY}/CARGO {N} - ...`.
//! Year directories that do not match the `IMPORTS` pattern are ignored, as
//! is anything that is not a directory. An optional year filter narrows the
//! scan to folders whose name contains the given fragment, which keeps audits
//! of the current year from rereading a decade of archives.

use crate::errors::AuditError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static YEAR_DIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^IMPORTS\s+\d{4}").unwrap());

static CARGO_DIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CARGO\s+(\d+)").unwrap());

/// One cargo folder found on disk, keyed by its cargo number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoFolder {
    pub number: String,
    pub path: PathBuf,
}

/// Walks `{base_dir}/IMPORTS {YYYY}/` and collects every cargo folder.
///
/// Results are sorted by year folder then cargo folder name so repeated runs
/// visit cargos in the same order regardless of filesystem enumeration.
pub fn scan_cargo_folders(
    base_dir: &Path,
    year_filter: Option<&str>,
) -> Result<Vec<CargoFolder>, AuditError> {
    if !base_dir.is_dir() {
        return Err(AuditError::BaseDirNotFound(base_dir.to_path_buf()));
    }

    let mut cargos = Vec::new();

    for year_dir in sorted_dirs(base_dir)? {
        let Some(year_name) = file_name(&year_dir) else {
            continue;
        };
        if !YEAR_DIR_RE.is_match(&year_name) {
            continue;
        }
        if let Some(filter) = year_filter {
            if !year_name.contains(filter) {
                continue;
            }
        }
        debug!(folder = %year_name, "scanning year folder");

        for cargo_dir in sorted_dirs(&year_dir)? {
            let Some(cargo_name) = file_name(&cargo_dir) else {
                continue;
            };
            if let Some(captures) = CARGO_DIR_RE.captures(&cargo_name) {
                cargos.push(CargoFolder {
                    number: captures[1].to_string(),
                    path: cargo_dir,
                });
            }
        }
    }

    Ok(cargos)
}

fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>, AuditError> {
    let entries = fs::read_dir(dir)
        .map_err(|err| AuditError::Other(anyhow::anyhow!("cannot list {}: {err}", dir.display())))?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
