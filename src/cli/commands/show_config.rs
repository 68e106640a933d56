use crate::cli::commands::Command;
use crate::config::ScannerConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct ConfigCommand {
    config: ScannerConfig,
    write: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn new(config: ScannerConfig, write: Option<PathBuf>) -> Self {
        Self { config, write }
    }
}

impl Command for ConfigCommand {
    async fn execute(&self) -> Result<()> {
        match &self.write {
            Some(path) => {
                self.config
                    .save_to_file(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("✅ Configuration written to {}", path.display());
            }
            None => print!("{}", self.config.to_toml()?),
        }
        Ok(())
    }
}
