//! Ship-date audit — `shipops audit`.

use anyhow::Result;

use super::super::Cli;
use shipops::audit::AuditMode;

pub async fn cmd_audit(
    cli: &Cli,
    dry_run: bool,
    auto_fill: bool,
    interactive: bool,
    report_only: bool,
) -> Result<()> {
    use shipops::audit::{Auditor, scan_cargo_folders, write_report};
    use shipops::config::OpsConfig;
    use shipops::rest::ProjectClient;
    use shipops::ui::icons;

    // Read-only modes win over fill modes when several flags are given.
    let mode = if report_only {
        AuditMode::ReportOnly
    } else if dry_run {
        AuditMode::DryRun
    } else if interactive {
        AuditMode::Interactive
    } else if auto_fill {
        AuditMode::AutoFill
    } else {
        AuditMode::DryRun
    };

    let config = OpsConfig::load_or_default(&cli.config)?;
    let target = config.require_target()?;
    let client = ProjectClient::for_reads(target)?;

    println!("{}Ship-date audit", icons::SEARCH);
    println!("  Base dir: {}", config.audit.base_dir.display());
    println!("  Project:  {}", target.url);
    println!("  Mode:     {}", mode_label(mode));

    let cargos = scan_cargo_folders(&config.audit.base_dir, config.audit.year_filter.as_deref())?;
    if cargos.is_empty() {
        println!("\n{}no cargo folders found", icons::WARN);
        return Ok(());
    }
    println!("\n{}{} cargo folders found", icons::CHECK, cargos.len());

    let mut auditor = Auditor::new(&client, &config.audit, mode);
    auditor.stats.cargos_scanned = cargos.len();
    for cargo in &cargos {
        auditor.audit_cargo(cargo).await;
    }

    if auditor.issues.is_empty() {
        println!("\n{}no missing or divergent ship dates found", icons::CHECK);
    } else {
        write_report(&config.audit.report, &auditor.issues)?;
        println!(
            "\n{}Report written: {} ({} issues)",
            icons::WRITE,
            config.audit.report.display(),
            auditor.issues.len()
        );
    }

    auditor.stats.print_summary();
    Ok(())
}

fn mode_label(mode: AuditMode) -> &'static str {
    match mode {
        AuditMode::DryRun => "dry-run (no writes)",
        AuditMode::AutoFill => "auto-fill",
        AuditMode::Interactive => "interactive",
        AuditMode::ReportOnly => "report-only",
    }
}
