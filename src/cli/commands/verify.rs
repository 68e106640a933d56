use crate::cli::commands::render::render_client_summary;
use crate::cli::commands::{build_workflow, finish_session, Command};
use crate::config::ScannerConfig;
use crate::workflow::ScanOutcome;
use anyhow::{bail, Result};

pub struct VerifyCommand {
    config: ScannerConfig,
    code: String,
}

impl VerifyCommand {
    pub fn new(config: ScannerConfig, code: String) -> Self {
        Self { config, code }
    }
}

impl Command for VerifyCommand {
    async fn execute(&self) -> Result<()> {
        let mut workflow = build_workflow(&self.config)?;
        println!("🔍 Verifying code...");

        let outcome = workflow.on_code_decoded(&self.code).await;
        finish_session(&workflow, &self.config);

        match outcome {
            Ok(ScanOutcome::Verified(record)) => {
                println!("{}", render_client_summary(&record));
                Ok(())
            }
            Ok(ScanOutcome::Ignored) => bail!("Nothing to verify: the code is empty"),
            Err(e) => {
                println!("❌ {e}");
                Err(e.into())
            }
        }
    }
}
