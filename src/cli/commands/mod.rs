use crate::config::ScannerConfig;
use crate::reservations::HttpReservationClient;
use crate::workflow::ScanWorkflow;
use anyhow::{Context, Result};

pub mod render;
pub mod scan;
pub mod serve;
pub mod show_config;
pub mod verify;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Workflow talking to the configured reservation server.
pub fn build_workflow(config: &ScannerConfig) -> Result<ScanWorkflow<HttpReservationClient>> {
    let client = HttpReservationClient::new(&config.server)
        .context("Failed to build reservation server client")?;
    tracing::debug!(base_url = %config.server.base_url, "Reservation client ready");
    Ok(ScanWorkflow::with_capacity(
        client,
        config.workflow.notification_capacity,
    ))
}

/// Log session counters when metrics are enabled.
pub fn finish_session(workflow: &ScanWorkflow<HttpReservationClient>, config: &ScannerConfig) {
    if config.observability.metrics_enabled {
        workflow.metrics().log_stats();
    }
}

pub async fn show_how_to_scan() -> Result<()> {
    println!("🎫 Reservation Scanner - ticket check-in");
    println!();
    println!("To get started:");
    println!("  📷 reservation-scanner scan            # Open a scanning session");
    println!("  🔍 reservation-scanner verify <CODE>   # Check a single ticket");
    println!("  🍽️  reservation-scanner serve <CODE>    # Check a ticket and serve the client");
    println!("  ⚙️  reservation-scanner config          # Show the effective configuration");
    println!();
    println!("💡 Point RESERVATION_SCANNER_SERVER__BASE_URL at your reservation server first.");
    Ok(())
}
