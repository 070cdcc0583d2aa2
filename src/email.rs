//! Outbound email capability.
//!
//! The auth flow only needs "send this HTML message to that address". No
//! retries happen here; callers decide what a failure means.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivers a message or returns an error.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// Development sender that logs instead of delivering.
#[derive(Clone, Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html_body,
            "email send stub"
        );
        Ok(())
    }
}

/// Posts messages as JSON to an HTTP mail relay.
#[derive(Clone)]
pub struct RelayEmailSender {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl RelayEmailSender {
    pub fn new(url: String, token: Option<String>, from: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("build email relay client")?;
        Ok(Self {
            client,
            url,
            token,
            from,
        })
    }
}

#[async_trait]
impl EmailSender for RelayEmailSender {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        let mut req = self.client.post(&self.url).json(&RelayPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html_body,
        });
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.send()
            .await
            .context("email relay request")?
            .error_for_status()
            .context("email relay rejected message")?;
        info!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Picks the relay when one is configured, the logging sender otherwise.
pub fn sender_from_config(cfg: &EmailConfig) -> anyhow::Result<Arc<dyn EmailSender>> {
    match &cfg.relay_url {
        Some(url) => Ok(Arc::new(RelayEmailSender::new(
            url.clone(),
            cfg.relay_token.clone(),
            cfg.sender.clone(),
        )?)),
        None => Ok(Arc::new(LogEmailSender)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        let msg = EmailMessage {
            to: "a@b.io".into(),
            subject: "Hi".into(),
            html_body: "<p>hi</p>".into(),
        };
        assert!(LogEmailSender.send(&msg).await.is_ok());
    }

    #[test]
    fn config_without_relay_builds_a_sender() {
        let cfg = EmailConfig {
            relay_url: None,
            relay_token: None,
            sender: "no-reply@example.com".into(),
            public_base_url: "http://localhost:8080/api/auth".into(),
            confirmation_ttl_hours: 24,
        };
        assert!(sender_from_config(&cfg).is_ok());
    }
}
