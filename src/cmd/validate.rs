//! Export file validation — `shipops validate`.

use anyhow::Result;

use super::super::Cli;

pub fn cmd_validate(cli: &Cli) -> Result<()> {
    use shipops::config::OpsConfig;
    use shipops::migrate::validate::{print_report, validate_data_dir};

    let config = OpsConfig::load_or_default(&cli.config)?;
    let report = validate_data_dir(&config.migrate.data_dir, &config.migrate.tables)?;
    print_report(&config.migrate.data_dir, &report);

    if !report.passed() {
        anyhow::bail!("validation failed");
    }
    Ok(())
}
