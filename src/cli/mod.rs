use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "reservation-scanner")]
#[command(about = "Scan reservation tickets, verify them and mark clients as served")]
#[command(long_about = "Reservation Scanner reads ticket codes, verifies them against the reservation \
                       server and walks the operator through serving each client. Get started with \
                       'reservation-scanner scan' to open a scanning session.")]
pub struct Cli {
    /// Configuration file to use instead of reservation-scanner.toml
    #[arg(long, global = true, value_name = "PATH", help = "Read configuration from this TOML file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open an interactive scanning session (one code per line on stdin)
    Scan,
    /// Verify a single code and print the reservation summary
    Verify {
        /// Raw payload of the scanned code
        #[arg(help = "Code payload exactly as decoded from the ticket")]
        code: String,
    },
    /// Verify a code and mark the client as served
    Serve {
        /// Raw payload of the scanned code
        #[arg(help = "Code payload exactly as decoded from the ticket")]
        code: String,
        /// Serve without asking for confirmation
        #[arg(short = 'y', long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write the configuration to a file instead of printing it
        #[arg(long, value_name = "PATH", help = "Write the effective configuration as TOML to PATH")]
        write: Option<PathBuf>,
    },
}
