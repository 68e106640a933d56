use anyhow::Result;
use clap::Parser;

use reservation_scanner::cli::commands::scan::ScanCommand;
use reservation_scanner::cli::commands::serve::ServeCommand;
use reservation_scanner::cli::commands::show_config::ConfigCommand;
use reservation_scanner::cli::commands::verify::VerifyCommand;
use reservation_scanner::cli::commands::{show_how_to_scan, Command};
use reservation_scanner::cli::{Cli, Commands};
use reservation_scanner::config::ScannerConfig;
use reservation_scanner::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    ScannerConfig::load_env_file()?;
    let config = ScannerConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async {
        match cli.command {
            // No subcommand: explain how to start
            None => show_how_to_scan().await,
            Some(Commands::Scan) => ScanCommand::new(config).execute().await,
            Some(Commands::Verify { code }) => VerifyCommand::new(config, code).execute().await,
            Some(Commands::Serve { code, yes }) => {
                ServeCommand::new(config, code)
                    .with_auto_approve(yes)
                    .execute()
                    .await
            }
            Some(Commands::Config { write }) => ConfigCommand::new(config, write).execute().await,
        }
    });

    // Stdin is read on a blocking thread that cannot be cancelled; an
    // interrupted session must not wait for the next line
    runtime.shutdown_background();
    result
}
