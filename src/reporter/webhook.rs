use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{error, info, instrument};

use super::{ReportConfig, Reporter};
use crate::Failure;
use crate::error::ReportError;

/// Posts failures as JSON to a generic webhook
///
/// The target is the `url` setting of the instance, or the configured default.
#[derive(Debug, Clone)]
pub struct WebhookReporter {
    client: Client,
    url: Option<String>,
}

impl WebhookReporter {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Reporter for WebhookReporter {
    #[instrument(skip_all, fields(failure_id = %failure.id, instance = %config.instance()))]
    async fn report(
        &self,
        failure: &Failure,
        config: &ReportConfig<'_>,
        stdout_url: &str,
        stderr_url: &str,
    ) -> Result<(), ReportError> {
        let url = config
            .get("url")
            .or(self.url.as_deref())
            .ok_or_else(|| ReportError::MissingSetting("url".to_string()))?;

        let payload = json!({
            "monitor": config.monitor(),
            "instance": config.instance(),
            "id": failure.id,
            "name": failure.name,
            "state": failure.state,
            "finished": failure.finished.to_rfc3339(),
            "labels": failure.labels,
            "stdout": stdout_url,
            "stderr": stderr_url,
            "timestamp": Utc::now().to_rfc3339()
        });

        let response = self.client.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            error!("Webhook report failed with status: {}", response.status());
            return Err(ReportError::Status(response.status().as_u16()));
        }

        info!("Successfully sent webhook report");
        Ok(())
    }
}
