//! Schema assembly: migration files in, one deployable script out.
//!
//! The pipeline reads every `*.sql` migration in filename order,
//! concatenates them, splits the text into statements, classifies each
//! statement into an execution phase, and emits a single transactional
//! script with statements grouped phase by phase. Within a phase the
//! original migration order is preserved.
//!
//! | Module     | Responsibility                              |
//! |------------|---------------------------------------------|
//! | `splitter` | statement boundaries (comments, `$tag$`)    |
//! | `classify` | first-line pattern rules → [`Phase`]        |
//! | `phase`    | ordered execution bands                     |
//! | `emit`     | sort + banner/separator/transaction output  |

mod classify;
mod emit;
mod phase;
mod splitter;

pub use classify::classify;
pub use emit::{distribution, render, sort_statements};
pub use phase::Phase;
pub use splitter::split_statements;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::errors::SchemaError;

/// A single SQL statement tagged with its execution phase and its
/// position in the original migration sequence. The pair
/// `(phase, source_order)` is the sort key for emission.
#[derive(Debug, Clone)]
pub struct Statement {
    pub text: String,
    pub phase: Phase,
    pub source_order: usize,
}

/// Summary of an ordered assembly run, for console reporting.
#[derive(Debug)]
pub struct AssembleReport {
    pub statement_count: usize,
    pub distribution: BTreeMap<Phase, usize>,
    pub output_bytes: usize,
    pub output_lines: usize,
}

/// Summary of a sequential assembly run.
#[derive(Debug)]
pub struct SequentialReport {
    pub emitted_files: usize,
    pub output_bytes: usize,
    pub output_lines: usize,
}

/// Finds migration files in lexicographic filename order. Filenames
/// carry a sortable timestamp prefix, so this is also chronological
/// order.
pub fn discover_migrations(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SchemaError::MigrationsDirNotFound(dir.to_path_buf()).into());
    }
    let pattern = dir.join("*.sql");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .context("invalid migrations glob pattern")?
        .filter_map(|entry| entry.ok())
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(SchemaError::NoMigrationFiles(dir.to_path_buf()).into());
    }
    Ok(files)
}

/// Reads and concatenates migration files with blank-line separators.
/// No per-file comment headers: a header line would be glued onto the
/// following statement by the splitter.
pub fn concatenate(files: &[PathBuf]) -> Result<String> {
    let mut all = String::new();
    for file in files {
        let content = fs::read_to_string(file)
            .with_context(|| format!("failed to read migration {}", file.display()))?;
        all.push_str(&content);
        all.push_str("\n\n");
    }
    Ok(all)
}

/// Splits, classifies, and orders concatenated migration text. Returns
/// the rendered script together with the ordered statements.
pub fn assemble(concatenated: &str) -> (String, Vec<Statement>) {
    let mut statements: Vec<Statement> = split_statements(concatenated)
        .into_iter()
        .enumerate()
        .map(|(source_order, text)| {
            let phase = classify(&text);
            Statement {
                text,
                phase,
                source_order,
            }
        })
        .collect();
    sort_statements(&mut statements);
    let script = render(&statements);
    (script, statements)
}

/// Ordered assembly end to end: read the given migrations, order their
/// statements, write the script to `output`.
pub fn assemble_to_file(files: &[PathBuf], output: &Path) -> Result<AssembleReport> {
    let concatenated = concatenate(files)?;
    let (script, statements) = assemble(&concatenated);
    fs::write(output, &script).map_err(|source| SchemaError::OutputWriteFailed {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(AssembleReport {
        statement_count: statements.len(),
        distribution: distribution(&statements),
        output_bytes: script.len(),
        output_lines: script.lines().count(),
    })
}

/// Sequential assembly: migrations kept in original order, each under a
/// numbered banner, no reordering and no transaction bracket. Empty
/// files are skipped but keep their slot in the numbering.
pub fn assemble_sequential_to_file(files: &[PathBuf], output: &Path) -> Result<SequentialReport> {
    let mut lines: Vec<String> = vec![
        "-- Full Schema Migration (Sequential Order)".to_string(),
        "-- Migrations applied in original order".to_string(),
        bar(),
        String::new(),
    ];

    let mut emitted = 0usize;
    for (i, file) in files.iter().enumerate() {
        let content = fs::read_to_string(file)
            .with_context(|| format!("failed to read migration {}", file.display()))?;
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        lines.push(bar());
        lines.push(format!("-- Migration [{:02}]: {}", i + 1, name));
        lines.push(bar());
        lines.push(content.to_string());
        lines.push(String::new());
        emitted += 1;
    }

    let script = lines.join("\n");
    fs::write(output, &script).map_err(|source| SchemaError::OutputWriteFailed {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(SequentialReport {
        emitted_files: emitted,
        output_bytes: script.len(),
        output_lines: script.lines().count(),
    })
}

fn bar() -> String {
    format!("-- {}", "=".repeat(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MIXED: &str = "\
ALTER TABLE t ADD COLUMN x int;
CREATE INDEX idx ON t(x);
CREATE TABLE t (id int);
CREATE EXTENSION \"uuid-ossp\";
";

    #[test]
    fn assemble_orders_statements_by_phase() {
        let (script, statements) = assemble(MIXED);
        let phases: Vec<Phase> = statements.iter().map(|s| s.phase).collect();
        assert_eq!(
            phases,
            vec![
                Phase::Extensions,
                Phase::Tables,
                Phase::ColumnAlterations,
                Phase::Indexes
            ]
        );

        let ext = script.find("CREATE EXTENSION").unwrap();
        let table = script.find("CREATE TABLE t").unwrap();
        let alter = script.find("ALTER TABLE t ADD COLUMN").unwrap();
        let index = script.find("CREATE INDEX idx").unwrap();
        assert!(ext < table && table < alter && alter < index);
    }

    #[test]
    fn assemble_keeps_every_statement_exactly_once() {
        let (_, statements) = assemble(MIXED);
        assert_eq!(statements.len(), 4);
        let mut texts: Vec<&str> = statements.iter().map(|s| s.text.as_str()).collect();
        texts.sort_unstable();
        let mut expected: Vec<&str> = MIXED.lines().collect();
        expected.sort_unstable();
        assert_eq!(texts, expected);
    }

    #[test]
    fn reassembling_own_output_preserves_order() {
        let (script, statements) = assemble(MIXED);

        // Strip the banner/separator comments a re-split would glue
        // onto the statements, drop the transaction bracket, and run
        // the classifier and sort again.
        let resplit: Vec<String> = split_statements(&script)
            .into_iter()
            .map(|text| {
                text.lines()
                    .filter(|line| !line.trim_start().starts_with("--"))
                    .collect::<Vec<_>>()
                    .join("\n")
                    .trim()
                    .to_string()
            })
            .filter(|text| text != "BEGIN;" && text != "COMMIT;")
            .collect();

        let first: Vec<String> = statements.iter().map(|s| s.text.clone()).collect();
        assert_eq!(resplit, first);

        let mut again: Vec<Statement> = resplit
            .into_iter()
            .enumerate()
            .map(|(source_order, text)| {
                let phase = classify(&text);
                Statement {
                    text,
                    phase,
                    source_order,
                }
            })
            .collect();
        sort_statements(&mut again);
        let reordered: Vec<String> = again.into_iter().map(|s| s.text).collect();
        assert_eq!(reordered, first);
    }

    #[test]
    fn comments_only_input_produces_empty_script() {
        let (script, statements) = assemble("-- nothing\n\n-- to do\n");
        assert!(statements.is_empty());
        assert!(script.contains("BEGIN;"));
        assert!(script.contains("COMMIT;"));
        assert!(!script.contains("-- PHASE"));
    }

    #[test]
    fn discover_migrations_sorts_by_filename() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("20250102000000_b.sql"), "SELECT 2;").unwrap();
        fs::write(dir.path().join("20250101000000_a.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("README.md"), "not sql").unwrap();

        let files = discover_migrations(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["20250101000000_a.sql", "20250102000000_b.sql"]
        );
    }

    #[test]
    fn discover_migrations_fails_on_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("no_such_dir");
        let err = discover_migrations(&missing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::MigrationsDirNotFound(_))
        ));
    }

    #[test]
    fn discover_migrations_fails_on_empty_dir() {
        let dir = tempdir().unwrap();
        let err = discover_migrations(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::NoMigrationFiles(_))
        ));
    }

    #[test]
    fn assemble_to_file_writes_ordered_script() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("001_tables.sql"),
            "CREATE TABLE cargos (id uuid);\nALTER TABLE cargos ADD COLUMN ship_date timestamptz;",
        )
        .unwrap();
        fs::write(
            dir.path().join("002_ext.sql"),
            "CREATE EXTENSION pgcrypto;",
        )
        .unwrap();

        let files = discover_migrations(dir.path()).unwrap();
        let output = dir.path().join("full_schema.sql");
        let report = assemble_to_file(&files, &output).unwrap();

        assert_eq!(report.statement_count, 3);
        assert_eq!(report.distribution.get(&Phase::Extensions), Some(&1));
        assert_eq!(report.distribution.get(&Phase::Tables), Some(&1));
        assert_eq!(
            report.distribution.get(&Phase::ColumnAlterations),
            Some(&1)
        );

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written.len(), report.output_bytes);
        let ext = written.find("CREATE EXTENSION").unwrap();
        let table = written.find("CREATE TABLE cargos").unwrap();
        assert!(ext < table, "extension must run before the table");
    }

    #[test]
    fn identical_input_produces_identical_output() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("001.sql"), MIXED).unwrap();
        let files = discover_migrations(dir.path()).unwrap();

        let out_a = dir.path().join("a.sql");
        let out_b = dir.path().join("b.sql");
        assemble_to_file(&files, &out_a).unwrap();
        assemble_to_file(&files, &out_b).unwrap();

        assert_eq!(
            fs::read_to_string(&out_a).unwrap(),
            fs::read_to_string(&out_b).unwrap()
        );
    }

    #[test]
    fn sequential_assembly_keeps_original_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("001_first.sql"),
            "ALTER TABLE t ADD COLUMN x int;",
        )
        .unwrap();
        fs::write(dir.path().join("002_second.sql"), "CREATE TABLE t (id int);").unwrap();

        let files = discover_migrations(dir.path()).unwrap();
        let output = dir.path().join("seq.sql");
        let report = assemble_sequential_to_file(&files, &output).unwrap();
        assert_eq!(report.emitted_files, 2);

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("-- Full Schema Migration (Sequential Order)"));
        assert!(written.contains("-- Migration [01]: 001_first.sql"));
        assert!(written.contains("-- Migration [02]: 002_second.sql"));
        let alter = written.find("ALTER TABLE t").unwrap();
        let create = written.find("CREATE TABLE t").unwrap();
        assert!(alter < create, "sequential mode must not reorder");
        assert!(!written.contains("BEGIN;"));
    }

    #[test]
    fn sequential_assembly_skips_empty_files_keeping_numbering() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("001_empty.sql"), "   \n").unwrap();
        fs::write(dir.path().join("002_real.sql"), "SELECT 1;").unwrap();

        let files = discover_migrations(dir.path()).unwrap();
        let output = dir.path().join("seq.sql");
        let report = assemble_sequential_to_file(&files, &output).unwrap();
        assert_eq!(report.emitted_files, 1);

        let written = fs::read_to_string(&output).unwrap();
        assert!(!written.contains("001_empty.sql"));
        assert!(written.contains("-- Migration [02]: 002_real.sql"));
    }
}
