//! Data export/import between projects — `shipops export|import|migrate`.

use anyhow::Result;

use super::super::Cli;
use shipops::migrate::MigrationStats;

pub async fn cmd_export(cli: &Cli, via_function: bool) -> Result<()> {
    use shipops::config::OpsConfig;
    use shipops::migrate;
    use shipops::rest::ProjectClient;

    let config = OpsConfig::load_or_default(&cli.config)?;
    let source = config.require_source()?;
    let client = ProjectClient::for_reads(source)?;

    print_banner("EXPORTING DATA FROM SOURCE PROJECT");
    println!("Project: {}", source.url);
    println!("Tables:  {}", config.migrate.tables.len());
    println!("Output:  {}\n", config.migrate.data_dir.display());

    let mut stats = MigrationStats::new();
    if via_function {
        migrate::export_tables_via_function(&client, &config.migrate, &mut stats).await?;
    } else {
        migrate::export_tables(&client, &config.migrate, &mut stats).await?;
    }

    stats.print_summary(&config.migrate.tables);
    finish(&stats)
}

pub async fn cmd_import(cli: &Cli) -> Result<()> {
    use shipops::config::OpsConfig;
    use shipops::migrate;
    use shipops::rest::ProjectClient;

    let config = OpsConfig::load_or_default(&cli.config)?;
    let target = config.require_target()?;
    if !config.migrate.data_dir.is_dir() {
        anyhow::bail!(
            "data directory {} not found; run 'shipops export' first",
            config.migrate.data_dir.display()
        );
    }
    let client = ProjectClient::for_writes(target)?;

    print_banner("IMPORTING DATA TO TARGET PROJECT");
    println!("Project: {}", target.url);
    println!("Tables:  {}", config.migrate.tables.len());
    println!("Input:   {}\n", config.migrate.data_dir.display());

    let mut stats = MigrationStats::new();
    migrate::import_tables(&client, &config.migrate, &mut stats).await?;

    stats.print_summary(&config.migrate.tables);
    finish(&stats)
}

/// Export then import in one run, sharing a single summary.
pub async fn cmd_migrate(cli: &Cli) -> Result<()> {
    use shipops::config::OpsConfig;
    use shipops::migrate;
    use shipops::rest::ProjectClient;

    let config = OpsConfig::load_or_default(&cli.config)?;
    let source = config.require_source()?;
    let target = config.require_target()?;
    let source_client = ProjectClient::for_reads(source)?;
    let target_client = ProjectClient::for_writes(target)?;

    print_banner("FULL MIGRATION");
    println!("Source: {}", source.url);
    println!("Target: {}", target.url);
    println!("Tables: {}", config.migrate.tables.len());

    let mut stats = MigrationStats::new();

    print_banner("EXPORTING DATA FROM SOURCE PROJECT");
    migrate::export_tables(&source_client, &config.migrate, &mut stats).await?;

    print_banner("IMPORTING DATA TO TARGET PROJECT");
    migrate::import_tables(&target_client, &config.migrate, &mut stats).await?;

    stats.print_summary(&config.migrate.tables);
    finish(&stats)
}

fn print_banner(title: &str) {
    let bar = "=".repeat(60);
    println!("\n{bar}\n{title}\n{bar}");
}

fn finish(stats: &MigrationStats) -> Result<()> {
    if stats.error_count() > 0 {
        anyhow::bail!("completed with {} errors", stats.error_count());
    }
    Ok(())
}
