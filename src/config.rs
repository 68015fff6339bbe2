use std::collections::HashMap;

use anyhow::{anyhow, bail};
use chrono::TimeDelta;
use tracing::trace;

use crate::reporter::Reporter;
use crate::reporter::discord::DiscordReporter;
use crate::reporter::webhook::WebhookReporter;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Monitor name, selects the label namespace (defaults to `COMPLAINER_NAME` or "default")
    pub name: Option<String>,

    /// Seconds between runs
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Seconds a seen failure stays cached. Failures older than half of it are
    /// not reported.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    pub cluster: ClusterConfig,

    /// Reporter name → backend
    #[serde(default)]
    pub reporters: HashMap<String, ReporterConfig>,
}

/// Smallest accepted `timeout`; below it the staleness window is zero
const MIN_TIMEOUT_SECS: u64 = 2;

impl Config {
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(crate::util::get_name)
    }

    /// `timeout` as a [`TimeDelta`], rejected when too small or out of range
    pub fn timeout_delta(&self) -> anyhow::Result<TimeDelta> {
        if self.timeout < MIN_TIMEOUT_SECS {
            bail!(
                "`timeout` must be at least {MIN_TIMEOUT_SECS}s, got {}s",
                self.timeout
            );
        }

        i64::try_from(self.timeout)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| anyhow!("`timeout` of {}s is out of range", self.timeout))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.interval == 0 {
            bail!("`interval` must be at least 1s");
        }
        self.timeout_delta()?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ClusterConfig {
    pub url: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReporterConfig {
    Discord {
        /// Default webhook URL, used when labels give none
        url: Option<String>,
        user_id: Option<String>,
    },
    Webhook {
        url: Option<String>,
    },
}

fn default_interval() -> u64 {
    crate::actors::monitor::DEFAULT_INTERVAL.as_secs()
}

fn default_timeout() -> u64 {
    crate::monitor::DEFAULT_TIMEOUT_SECS as u64
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&file_content)
        .map_err(|e| anyhow!("Invalid configuration file provided: {e}"))?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration file provided: {e}"))?;

    trace!("loaded config: {config:?}");
    Ok(config)
}

/// Instantiate every configured reporter, keyed by its name
pub fn build_reporters(config: &Config) -> HashMap<String, Box<dyn Reporter>> {
    config
        .reporters
        .iter()
        .map(|(name, reporter)| {
            let reporter: Box<dyn Reporter> = match reporter {
                ReporterConfig::Discord { url, user_id } => {
                    Box::new(DiscordReporter::new(url.clone(), user_id.clone()))
                }
                ReporterConfig::Webhook { url } => Box::new(WebhookReporter::new(url.clone())),
            };
            (name.clone(), reporter)
        })
        .collect()
}
