use async_trait::async_trait;
use serde::Serialize;

use crate::application::{AppError, AppResult, LikeEvent, LikeNotifier, LikeOutcome};

/// Posts each sweep outcome as a text message to a webhook. The receiving
/// bridge routes it to the tenant's configured log channel.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook: String,
}

impl WebhookNotifier {
    pub fn new(webhook: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook,
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookMsg<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<u64>,
}

#[async_trait]
impl LikeNotifier for WebhookNotifier {
    async fn notify(&self, event: &LikeEvent) -> AppResult<()> {
        let text = format_event_text(event);

        let payload = WebhookMsg {
            content: &text,
            channel: event.notify_channel,
        };

        self.client
            .post(&self.webhook)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Notifier(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Notifier(e.to_string()))?;

        Ok(())
    }
}

fn format_event_text(event: &LikeEvent) -> String {
    match &event.outcome {
        LikeOutcome::Liked => {
            format!("✅ Auto-liked `{}` ({})", event.uid, event.region)
        }
        LikeOutcome::AlreadyAtLimit => {
            format!(
                "❌ Failed auto-like `{}` ({}) - already max today",
                event.uid, event.region
            )
        }
        LikeOutcome::RemoteError(code) => {
            format!("⚠️ API error {} for `{}` ({})", code, event.uid, event.region)
        }
        LikeOutcome::TransportError(cause) => {
            format!("⚠️ Error liking `{}` ({}): {}", event.uid, event.region, cause)
        }
    }
}
