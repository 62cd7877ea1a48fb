//! Outbound alerts: Telegram when configured, the log otherwise.

use crate::config::TelegramConfig;
use crate::models::Listing;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const NO_NEW_COURSES: &str = "No new courses found.";

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("alert rejected (status {status}): {description}")]
    Rejected { status: u16, description: String },
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), AlertError>;
}

/// Message announcing one newly found course. The title is already escaped.
pub fn format_message(listing: &Listing) -> String {
    format!(
        "🔥 New Free Course Found!\n\nPlatform: {}\nTitle: {}\n\nEnroll Now:\n{}",
        listing.platform, listing.title, listing.link
    )
}

/// Pick the sink the configuration allows.
pub fn sink_from_config(config: &TelegramConfig) -> Result<Box<dyn AlertSink>> {
    match (config.bot_token.as_deref(), config.chat_id.as_deref()) {
        (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
            Ok(Box::new(TelegramSink::new(token, chat)?))
        }
        _ => {
            info!("Telegram not configured; alerts will be logged");
            Ok(Box::new(LogSink))
        }
    }
}

// ── Telegram ──────────────────────────────────────────────────────────────────

pub struct TelegramSink {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramSink {
    pub fn new(bot_token: &str, chat_id: &str) -> Result<Self> {
        Self::with_api_base(TELEGRAM_API, bot_token, chat_id)
    }

    pub fn with_api_base(api_base: &str, bot_token: &str, chat_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), bot_token),
            chat_id: chat_id.to_string(),
        })
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    async fn send(&self, message: &str) -> Result<(), AlertError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": message,
                "parse_mode": "HTML",
            }))
            .send()
            .await?;

        let status = resp.status();
        let reply = resp.json::<TelegramReply>().await;

        match reply {
            Ok(r) if r.ok && status.is_success() => Ok(()),
            Ok(r) => Err(AlertError::Rejected {
                status: status.as_u16(),
                description: r.description.unwrap_or_else(|| "no description".to_string()),
            }),
            Err(_) if status.is_success() => Ok(()),
            Err(e) => Err(AlertError::Rejected {
                status: status.as_u16(),
                description: e.to_string(),
            }),
        }
    }
}

// ── Log fallback ──────────────────────────────────────────────────────────────

pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn send(&self, message: &str) -> Result<(), AlertError> {
        info!("Alert:\n{}", message);
        Ok(())
    }
}
