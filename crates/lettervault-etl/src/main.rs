//! Lettervault ETL - staging and vault load tool

use anyhow::Result;
use clap::Parser;
use lettervault_common::logging::{init_logging, LogConfig, LogLevel};
use lettervault_etl::config::Config;
use lettervault_etl::staging::StagingLoader;
use lettervault_etl::vault::VaultLoader;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lettervault")]
#[command(author, version, about = "Staging and Data Vault load tool for the letters feed")]
struct Cli {
    /// Pipeline stage to run
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Land the source feed in the staging table, unmodified
    Stage,

    /// Load the staging snapshot into the vault tables
    Vault,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env()?;
    let log_config = if cli.verbose {
        log_config.with_level(LogLevel::Debug)
    } else {
        log_config
    };
    init_logging(&log_config)?;

    let config = Config::load()?;

    match cli.command {
        Command::Stage => {
            info!("Running staging load");
            StagingLoader::new(&config).run().await?;
        },
        Command::Vault => {
            info!("Running vault load");
            let report = VaultLoader::new(&config).run().await?;
            if report.fatal_count() > 0 {
                anyhow::bail!(
                    "{} of {} table loads failed",
                    report.fatal_count(),
                    report.table_count()
                );
            }
        },
    }

    info!("Batch complete");
    Ok(())
}
