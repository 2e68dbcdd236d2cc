//! Schema assembly — `shipops schema`.

use anyhow::Result;

use super::super::Cli;

pub fn cmd_schema(cli: &Cli, sequential: bool) -> Result<()> {
    use shipops::config::OpsConfig;
    use shipops::schema::{self, Phase};
    use shipops::ui::icons;

    let config = OpsConfig::load_or_default(&cli.config)?;
    let migrations_dir = &config.schema.migrations_dir;
    let output = &config.schema.output;

    println!("{}Generating deployable schema...", icons::CYCLE);
    println!(
        "{}Reading migration files from {}",
        icons::FOLDER,
        migrations_dir.display()
    );

    let files = schema::discover_migrations(migrations_dir)?;
    println!("   {}{} migration files", icons::CHECK, files.len());
    for (index, file) in files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("   [{:2}] {name}", index + 1);
    }

    if sequential {
        println!("\n{}Writing sequential schema...", icons::WRITE);
        let report = schema::assemble_sequential_to_file(&files, output)?;
        println!("{}Schema written: {}", icons::CHECK, output.display());
        println!("   Files:  {}", report.emitted_files);
        println!("   Size:   {:.1} KB", report.output_bytes as f64 / 1024.0);
        println!("   Lines:  {}", report.output_lines);
        return Ok(());
    }

    println!("\n{}Splitting statements...", icons::PARSE);
    let report = schema::assemble_to_file(&files, output)?;
    println!("   {}{} statements", icons::CHECK, report.statement_count);

    println!("\n{}Phase distribution:", icons::CHART);
    for phase in Phase::ALL {
        if let Some(count) = report.distribution.get(&phase) {
            println!("   Phase {} - {}: {count} statements", phase.number(), phase.title());
        }
    }

    println!("\n{}Schema written: {}", icons::CHECK, output.display());
    println!("   Size:   {:.1} KB", report.output_bytes as f64 / 1024.0);
    println!("   Lines:  {}", report.output_lines);
    Ok(())
}
