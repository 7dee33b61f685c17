//! 通知投递：通过 `NotificationSender` 抽象对接外部服务。
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use models::communication::Channel;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("recipient missing: {0}")]
    MissingRecipient(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider rejected message: status {0}")]
    Rejected(u16),
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub communication_id: Uuid,
    pub business_id: Uuid,
    pub channel: Channel,
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn send(&self, message: &Notification) -> Result<(), NotificationError>;
}

/// 仅写日志，开发与测试使用
#[derive(Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    fn provider(&self) -> &'static str { "log" }

    async fn send(&self, message: &Notification) -> Result<(), NotificationError> {
        info!(
            service = "notifications",
            event = "notification_logged",
            channel = message.channel.as_str(),
            to = %message.to,
            communication_id = %message.communication_id,
            "notification delivered to log"
        );
        Ok(())
    }
}

/// 以 JSON POST 投递到外部 webhook
pub struct WebhookSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    fn provider(&self) -> &'static str { "webhook" }

    #[instrument(skip(self, message), fields(channel = message.channel.as_str(), communication_id = %message.communication_id))]
    async fn send(&self, message: &Notification) -> Result<(), NotificationError> {
        let resp = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

pub fn sender_from_config(cfg: &configs::NotificationConfig) -> Result<Arc<dyn NotificationSender>, NotificationError> {
    match cfg.provider.as_str() {
        "webhook" => {
            let url = cfg
                .webhook_url
                .clone()
                .ok_or_else(|| NotificationError::Transport("notifications.webhook_url missing".into()))?;
            Ok(Arc::new(WebhookSender::new(url, Duration::from_secs(cfg.timeout_secs))?))
        }
        _ => Ok(Arc::new(LogSender)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg() -> Notification {
        Notification {
            communication_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            channel: Channel::Email,
            to: "pat@example.com".into(),
            subject: Some("Appointment confirmed".into()),
            body: "See you Monday at 9:00".into(),
        }
    }

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        assert!(LogSender.send(&msg()).await.is_ok());
    }

    #[tokio::test]
    async fn webhook_unreachable_is_transport_error() {
        let sender = WebhookSender::new("http://127.0.0.1:9/notify", Duration::from_secs(2)).unwrap();
        let err = sender.send(&msg()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Transport(_)));
    }

    #[tokio::test]
    async fn webhook_success_and_rejection() -> Result<(), anyhow::Error> {
        let hook = crate::test_support::spawn_webhook().await?;
        let message = msg();
        let ok = WebhookSender::new(format!("{}/ok", hook.base_url), Duration::from_secs(5))?;
        ok.send(&message).await?;
        let received = hook.received.lock().await.clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["communicationId"], message.communication_id.to_string());
        assert_eq!(received[0]["channel"], "email");
        assert_eq!(received[0]["to"], "pat@example.com");

        let failing = WebhookSender::new(format!("{}/fail", hook.base_url), Duration::from_secs(5))?;
        let err = failing.send(&msg()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Rejected(500)));
        Ok(())
    }

    #[test]
    fn config_selects_provider() {
        let log = sender_from_config(&configs::NotificationConfig::default()).unwrap();
        assert_eq!(log.provider(), "log");
        let cfg = configs::NotificationConfig {
            provider: "webhook".into(),
            webhook_url: Some("https://hooks.example.com/n".into()),
            ..Default::default()
        };
        assert_eq!(sender_from_config(&cfg).unwrap().provider(), "webhook");
    }
}
