use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "shipops")]
#[command(version, about = "Operations CLI for the shipment-tracking database")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "shipops.toml", global = true)]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble migration files into a single phase-ordered schema
    Schema {
        /// Keep original file order instead of phase ordering
        #[arg(long)]
        sequential: bool,
    },
    /// Export table data from the source project to JSON files
    Export {
        /// Export through the export-data function instead of the data API
        #[arg(long)]
        via_function: bool,
    },
    /// Import exported JSON files into the target project
    Import,
    /// Export from source and import into target in one run
    Migrate,
    /// Check exported JSON files before importing
    Validate,
    /// Verify connectivity and credentials for both projects
    Ping,
    /// Cross-check sheet ship dates against the database
    Audit {
        /// Detect and report without writing (default)
        #[arg(long)]
        dry_run: bool,
        /// Fill missing ship dates from the sheets
        #[arg(long)]
        auto_fill: bool,
        /// Ask before filling each cargo's dates
        #[arg(long)]
        interactive: bool,
        /// Only write the CSV report
        #[arg(long)]
        report_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "shipops=debug"
    } else {
        "shipops=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match &cli.command {
        Commands::Schema { sequential } => cmd::cmd_schema(&cli, *sequential)?,
        Commands::Export { via_function } => cmd::cmd_export(&cli, *via_function).await?,
        Commands::Import => cmd::cmd_import(&cli).await?,
        Commands::Migrate => cmd::cmd_migrate(&cli).await?,
        Commands::Validate => cmd::cmd_validate(&cli)?,
        Commands::Ping => cmd::cmd_ping(&cli).await?,
        Commands::Audit {
            dry_run,
            auto_fill,
            interactive,
            report_only,
        } => cmd::cmd_audit(&cli, *dry_run, *auto_fill, *interactive, *report_only).await?,
    }

    Ok(())
}
