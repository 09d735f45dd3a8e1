use crate::traits::NotifyChannel;
use crate::types::{NotificationPayload, NotifyConfig, Result, WatchError};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Build an alert stamped with the current local time.
pub fn build_payload(title: &str, body: &str, mention_all: bool) -> NotificationPayload {
    build_payload_at(title, body, mention_all, Local::now())
}

pub fn build_payload_at(title: &str, body: &str, mention_all: bool, at: DateTime<Local>) -> NotificationPayload {
    NotificationPayload {
        title: title.to_string(),
        body: body.to_string(),
        timestamp_label: at.format(TIMESTAMP_FORMAT).to_string(),
        mention_all,
    }
}

/// Markdown text shown in the chat card.
pub fn render_markdown(payload: &NotificationPayload, attribution: &str) -> String {
    format!(
        "\n## {}\n#### {}\n#### 时间: {}\n{}\n",
        payload.title, payload.body, payload.timestamp_label, attribution
    )
}

/// DingTalk group robot, reached through its webhook.
pub struct DingTalkChannel {
    client: Client,
    webhook_url: String,
    access_token: String,
    attribution: String,
}

impl DingTalkChannel {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            access_token: config.access_token.clone(),
            attribution: config.attribution.clone(),
        })
    }

    fn format_payload<'a>(&self, payload: &'a NotificationPayload) -> DingTalkMessage<'a> {
        DingTalkMessage {
            msgtype: "markdown",
            markdown: DingTalkMarkdown {
                title: &payload.title,
                text: render_markdown(payload, &self.attribution),
            },
            at: DingTalkAt {
                at_mobiles: Vec::new(),
                is_at_all: payload.mention_all,
            },
        }
    }
}

#[async_trait]
impl NotifyChannel for DingTalkChannel {
    fn name(&self) -> &'static str {
        "dingtalk"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<serde_json::Value> {
        let message = self.format_payload(payload);

        debug!("Posting '{}' to DingTalk webhook", payload.title);

        let response = self
            .client
            .post(&self.webhook_url)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("DingTalk webhook returned {}: {}", status, body);
            return Err(WatchError::NotificationDelivery(format!("HTTP {}: {}", status, body)));
        }

        let body: serde_json::Value = response.json().await?;

        // The robot answers 200 with a non-zero errcode for rejected messages
        match body.get("errcode").and_then(|c| c.as_i64()) {
            Some(0) | None => Ok(body),
            Some(code) => {
                let errmsg = body.get("errmsg").and_then(|m| m.as_str()).unwrap_or("unknown");
                Err(WatchError::NotificationDelivery(format!("errcode {}: {}", code, errmsg)))
            }
        }
    }
}

/// Writes alerts to the log instead of delivering them.
pub struct LogChannel {
    attribution: String,
}

impl LogChannel {
    pub fn new(attribution: impl Into<String>) -> Self {
        Self {
            attribution: attribution.into(),
        }
    }
}

#[async_trait]
impl NotifyChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<serde_json::Value> {
        info!("[dry-run] {}", render_markdown(payload, &self.attribution));
        Ok(serde_json::json!({ "errcode": 0, "errmsg": "dry-run" }))
    }
}

#[derive(Debug, Serialize)]
struct DingTalkMessage<'a> {
    msgtype: &'static str,
    markdown: DingTalkMarkdown<'a>,
    at: DingTalkAt,
}

#[derive(Debug, Serialize)]
struct DingTalkMarkdown<'a> {
    title: &'a str,
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DingTalkAt {
    at_mobiles: Vec<String>,
    is_at_all: bool,
}
