//! Webhook delivery of notifications (Discord-compatible embeds).

use super::{EventSink, Notification};
use crate::config::Config;
use crate::logger::{self, LogTag};
use crate::types::TradeMode;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;

/// Sends events to a configured webhook. When the webhook is disabled (or
/// suppressed for simulated runs) events still land in the log, so the
/// stream of outcomes is always observable somewhere. Delivery failures
/// are logged and swallowed - a dead webhook must not stall trading.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
    deliver: bool,
}

impl WebhookNotifier {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let notifications = &config.notifications;
        let deliver = should_deliver(
            notifications.webhook_enabled,
            config.mode,
            notifications.notify_in_simulated,
        );

        Ok(Self {
            http,
            url: notifications.webhook_url.clone(),
            deliver,
        })
    }
}

/// Webhooks go out when enabled, except for simulated runs with
/// `notify_in_simulated` switched off.
fn should_deliver(webhook_enabled: bool, mode: TradeMode, notify_in_simulated: bool) -> bool {
    if !webhook_enabled {
        return false;
    }
    mode != TradeMode::Simulated || notify_in_simulated
}

#[async_trait]
impl EventSink for WebhookNotifier {
    async fn send(&self, notification: Notification) {
        let level = notification.level();
        let body = notification.render();

        // the log always carries the event, webhook or not
        logger::info(
            LogTag::Notify,
            &format!("{} {}", level, body.replace('\n', " | ")),
        );

        if !self.deliver {
            logger::debug(LogTag::Notify, "webhook delivery disabled, logged only");
            return;
        }

        let payload = json!({
            "embeds": [{
                "title": format!("{} {}", level.emoji(), level),
                "description": body,
                "color": level.color(),
                "timestamp": Utc::now().to_rfc3339(),
            }]
        });

        match self.http.post(&self.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                logger::debug(LogTag::Notify, &format!("webhook delivered ({})", level));
            }
            Ok(response) => {
                logger::warning(
                    LogTag::Notify,
                    &format!("webhook returned HTTP {}", response.status()),
                );
            }
            Err(e) => {
                logger::warning(LogTag::Notify, &format!("webhook delivery failed: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_gating() {
        // disabled webhook never delivers
        assert!(!should_deliver(false, TradeMode::Real, true));
        assert!(!should_deliver(false, TradeMode::Simulated, true));

        // enabled delivers for paper/real regardless of the simulated switch
        assert!(should_deliver(true, TradeMode::Paper, false));
        assert!(should_deliver(true, TradeMode::Real, false));

        // simulated runs respect notify_in_simulated
        assert!(should_deliver(true, TradeMode::Simulated, true));
        assert!(!should_deliver(true, TradeMode::Simulated, false));
    }
}
