use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use shared::palettes::TraitSet;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("delivery rejected with status {0}")]
    Rejected(u16),
}

/// Outbound message delivery. Any failure, including a timeout, is treated
/// as retryable by the scheduler: the egg goes back to `pending` and the
/// same message is rebuilt on the next attempt.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: i64, text: &str) -> Result<(), NotifyError>;
}

/// Delivers messages by POSTing JSON to a relay URL; the relay owns the
/// actual chat transport.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, user_id: i64, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(DELIVERY_TIMEOUT)
            .json(&json!({ "user_id": user_id, "text": text }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

/// The announcement a user receives when their egg resolves.
pub fn hatch_message(species: &str, is_shiny: bool, traits: &TraitSet) -> String {
    let headline = if is_shiny {
        "🥚 Your egg wiggles… crack! ✨ A SHINY glitch pet bursts out! ✨"
    } else {
        "🥚 Your egg wiggles… crack! A glitch pet pops out!"
    };
    format!(
        "{}\n\nSpecies: {}\nTraits → {}",
        headline,
        species,
        traits.summary()
    )
}
