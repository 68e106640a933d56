use crate::cli::commands::render::render_client_summary;
use crate::cli::commands::{build_workflow, finish_session, Command};
use crate::config::ScannerConfig;
use crate::reservations::HttpReservationClient;
use crate::workflow::{ScanOutcome, ScanWorkflow};
use anyhow::{bail, Result};

pub struct ServeCommand {
    config: ScannerConfig,
    code: String,
    auto_approve: bool,
}

impl ServeCommand {
    pub fn new(config: ScannerConfig, code: String) -> Self {
        Self {
            config,
            code,
            auto_approve: false,
        }
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }
}

impl Command for ServeCommand {
    async fn execute(&self) -> Result<()> {
        let mut workflow = build_workflow(&self.config)?;
        let result = serve_code(&mut workflow, &self.code, self.auto_approve).await;
        finish_session(&workflow, &self.config);
        result
    }
}

async fn serve_code(
    workflow: &mut ScanWorkflow<HttpReservationClient>,
    code: &str,
    auto_approve: bool,
) -> Result<()> {
    println!("🔍 Verifying code...");
    let record = match workflow.on_code_decoded(code).await {
        Ok(ScanOutcome::Verified(record)) => record,
        Ok(ScanOutcome::Ignored) => bail!("Nothing to serve: the code is empty"),
        Err(e) => {
            println!("❌ {e}");
            return Err(e.into());
        }
    };
    println!("{}", render_client_summary(&record));
    println!();

    if !auto_approve {
        print!("Serve this client? [y/N]: ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            workflow.dismiss()?;
            println!("↩️  Not served");
            return Ok(());
        }
    }

    match workflow.serve().await {
        Ok(message) => {
            println!("✅ {message}");
            Ok(())
        }
        Err(e) => {
            println!("❌ {e}");
            Err(e.into())
        }
    }
}
