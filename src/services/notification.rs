//! Notification delivery
//!
//! [`LogNotifier`] writes notifications to the log; [`WebhookNotifier`] posts
//! them as JSON to a configured endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::Notifier;
use crate::errors::{AppError, AppResult};
use crate::models::{Notification, RecognizedMedia};
use crate::utils::url::douban_dispatch_link;

/// Build the "subscription added" message for a newly subscribed show.
pub fn subscription_added(
    media: &RecognizedMedia,
    season: Option<u32>,
    description: &str,
    link: &str,
    source_label: &str,
    subscribe_page_url: Option<&str>,
) -> Notification {
    let summary = if !description.trim().is_empty() {
        description.to_string()
    } else {
        media
            .overview
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .unwrap_or("暂无简介")
            .to_string()
    };

    Notification {
        title: format!(
            "{} Season {} 已添加订阅",
            media.title_year(),
            season.unwrap_or(1)
        ),
        text: format!(
            "{}\n豆瓣链接：{}\n\n[{}]",
            summary,
            douban_dispatch_link(link),
            source_label
        ),
        image: media.message_image(),
        link: subscribe_page_url.map(str::to_string),
    }
}

#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> AppResult<()> {
        info!("{}: {}", notification.title, notification.text);
        Ok(())
    }
}

pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> AppResult<()> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                "webhook",
                format!("{} responded with {}", self.url, status),
            ));
        }
        debug!("Notification delivered: {}", notification.title);
        Ok(())
    }
}
