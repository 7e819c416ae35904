use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use certwatch_engine::CheckSettings;

use super::cli::{Cli, LogTarget};
use super::logging::LogDestination;

/// Store key of the site collection; also its file name in the state dir.
pub const SNAPSHOT_KEY: &str = "certwatch-sites.ron";
pub const LOG_FILENAME: &str = "certwatch.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerChoice {
    /// Handshake with each site and read its certificate.
    Direct,
    /// Ask a check service over HTTP.
    Endpoint(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub state_dir: PathBuf,
    pub checker: CheckerChoice,
    pub check: CheckSettings,
    pub log: LogDestination,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        if cli.timeout_secs == 0 {
            bail!("--timeout-secs must be at least 1");
        }
        let checker = match cli.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => CheckerChoice::Endpoint(endpoint.to_string()),
            _ => CheckerChoice::Direct,
        };
        Ok(Self {
            state_dir: cli.state_dir.clone(),
            checker,
            check: CheckSettings {
                timeout: Duration::from_secs(cli.timeout_secs),
                ..CheckSettings::default()
            },
            log: match cli.log {
                LogTarget::File => LogDestination::File,
                LogTarget::Terminal => LogDestination::Terminal,
                LogTarget::Both => LogDestination::Both,
            },
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join(LOG_FILENAME)
    }
}
