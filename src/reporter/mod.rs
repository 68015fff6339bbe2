//! Reporter backends
//!
//! A reporter delivers one failure notification to one configured instance
//! (a webhook, a channel). Reporters are injected into the monitor by name and
//! look up their per-instance settings through [`ReportConfig`].
//!
//! ## Backends
//!
//! - **discord**: Discord webhook message with an embed
//! - **webhook**: generic JSON POST

pub mod discord;
pub mod webhook;

use async_trait::async_trait;

use crate::Failure;
use crate::error::ReportError;
use crate::labels::Labels;

/// A pluggable notification backend
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Deliver a report of `failure` to the instance described by `config`
    async fn report(
        &self,
        failure: &Failure,
        config: &ReportConfig<'_>,
        stdout_url: &str,
        stderr_url: &str,
    ) -> Result<(), ReportError>;
}

/// Read-only settings view for one (reporter, instance) pair of one failure
#[derive(Debug, Clone, Copy)]
pub struct ReportConfig<'a> {
    labels: &'a Labels,
    reporter: &'a str,
    instance: &'a str,
}

impl<'a> ReportConfig<'a> {
    pub fn new(labels: &'a Labels, reporter: &'a str, instance: &'a str) -> Self {
        Self {
            labels,
            reporter,
            instance,
        }
    }

    pub fn monitor(&self) -> &'a str {
        self.labels.monitor()
    }

    pub fn reporter(&self) -> &'a str {
        self.reporter
    }

    pub fn instance(&self) -> &'a str {
        self.instance
    }

    /// Instance setting `key`, or the reporter-wide one if the instance has none
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.labels.get(self.reporter, self.instance, key)
    }
}
