use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

const CONFIG_FILE: &str = "reservation-scanner.toml";
const RC_FILE: &str = ".reservation-scanner-rc";
const ENV_PREFIX: &str = "RESERVATION_SCANNER";

/// Main configuration structure for the reservation scanner
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Reservation server settings
    pub server: ServerConfig,
    /// Logging and metrics settings
    pub observability: ObservabilityConfig,
    /// Scan workflow settings
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root URL of the reservation server
    pub base_url: String,
    /// Path of the code verification endpoint
    pub verify_path: String,
    /// Path prefix of the serve endpoint; the reservation id is appended
    pub serve_path: String,
    /// Per-request timeout. No timeout when unset.
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level directive, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON logs instead of human-readable ones
    pub json_logs: bool,
    /// Log workflow counters when a session ends
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Buffer size of the notification channel
    pub notification_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            verify_path: "/reservation-public/scanner/verify".to_string(),
            serve_path: "/reservation-public/scanner/serve".to_string(),
            request_timeout_seconds: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            notification_capacity: 16,
        }
    }
}

impl ScannerConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file: `explicit` if given, otherwise
    ///    reservation-scanner.toml and .reservation-scanner-rc when present
    /// 3. Environment variables (RESERVATION_SCANNER_SERVER__BASE_URL, ...)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match explicit {
            Some(path) => {
                let name = path
                    .to_str()
                    .with_context(|| format!("Config path is not valid UTF-8: {}", path.display()))?;
                builder = builder.add_source(File::new(name, FileFormat::Toml));
            }
            None => {
                if Path::new(CONFIG_FILE).exists() {
                    builder = builder.add_source(File::new(CONFIG_FILE, FileFormat::Toml));
                }
                if Path::new(RC_FILE).exists() {
                    builder = builder.add_source(File::new(RC_FILE, FileFormat::Toml));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to read configuration sources")?;
        let scanner_config: ScannerConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;

        Ok(scanner_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
