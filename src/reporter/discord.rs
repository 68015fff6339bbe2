use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, instrument};

use super::{ReportConfig, Reporter};
use crate::Failure;
use crate::error::ReportError;

const COLOR_RED: u32 = 15158332;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Default)]
pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

/// Reports failures to a Discord webhook
///
/// Settings (from labels, falling back to the configured defaults):
/// - `url`: webhook URL
/// - `user_id`: user to mention in the message content
#[derive(Debug, Clone)]
pub struct DiscordReporter {
    client: Client,
    url: Option<String>,
    user_id: Option<String>,
}

impl DiscordReporter {
    pub fn new(url: Option<String>, user_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
            user_id,
        }
    }

    pub fn build_failure_embed(
        &self,
        failure: &Failure,
        config: &ReportConfig<'_>,
        stdout_url: &str,
        stderr_url: &str,
    ) -> Embed {
        let task = if failure.name.is_empty() {
            failure.id.as_str()
        } else {
            failure.name.as_str()
        };

        let mut fields = vec![EmbedField {
            name: "🆔 Task ID".to_string(),
            value: format!("`{}`", failure.id),
            inline: false,
        }];

        if !failure.state.is_empty() {
            fields.push(EmbedField {
                name: "📍 State".to_string(),
                value: failure.state.clone(),
                inline: true,
            });
        }

        fields.push(EmbedField {
            name: "🕒 Finished".to_string(),
            value: failure.finished.to_rfc3339(),
            inline: true,
        });
        fields.push(EmbedField {
            name: "📄 Logs".to_string(),
            value: format!("[stdout]({stdout_url}) · [stderr]({stderr_url})"),
            inline: false,
        });

        Embed {
            title: Some("💥 Task Failed".to_string()),
            description: Some(format!("Task **{task}** has failed")),
            color: Some(COLOR_RED),
            fields,
            footer: Some(EmbedFooter {
                text: format!(
                    "Monitor: {} | {}/{}",
                    config.monitor(),
                    config.reporter(),
                    config.instance()
                ),
            }),
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }
}

#[async_trait]
impl Reporter for DiscordReporter {
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

        let embed = self.build_failure_embed(failure, config, stdout_url, stderr_url);
        let mut message_builder = MessageBuilder::new().add_embed(embed);
        if let Some(user_id) = config.get("user_id").or(self.user_id.as_deref()) {
            message_builder = message_builder.content(format!("💥 `{}` <@{user_id}>", failure.id));
        }

        let response = self
            .client
            .post(url)
            .json(&message_builder.build())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Discord message failed with status: {status}");
            if let Ok(error_text) = response.text().await {
                error!("Discord API error response: {error_text}");
            }
            return Err(ReportError::Status(status.as_u16()));
        }

        info!("Successfully sent Discord message");
        Ok(())
    }
}
