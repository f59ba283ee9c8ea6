//! HTTP tag-suggestion client. Posts the lead notes with a fixed
//! instruction to a completion endpoint and expects a JSON string array
//! back. Retryable failures get exactly one more attempt with a short
//! jittered delay.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};

use crate::suggester::{clean_tags, SuggestError, TagSuggester, MAX_TAGS};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(400);

const INSTRUCTION: &str = "Suggest up to 5 short tags for a property buyer lead \
based on the notes. Respond with a JSON array of strings only.";

#[derive(Clone)]
pub struct SuggesterConfig {
    /// Completion endpoint, e.g. `https://api.example.com/v1/complete`.
    pub url: String,
    pub api_key: SecretString,
}

pub struct HttpTagSuggester {
    client: Client,
    url: String,
    api_key: SecretString,
}

impl HttpTagSuggester {
    pub fn new(config: SuggesterConfig) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            url: config.url,
            api_key: config.api_key,
        }
    }

    async fn request(&self, notes: &str) -> Result<Vec<String>, SuggestError> {
        let body = json!({
            "instruction": INSTRUCTION,
            "input": notes,
            "max_tags": MAX_TAGS,
        });

        let resp = self
            .client
            .post(&self.url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SuggestError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SuggestError::Api { status: status.as_u16() });
        }

        let tags: Vec<String> = resp
            .json()
            .await
            .map_err(|e| SuggestError::Malformed(e.to_string()))?;
        Ok(clean_tags(tags))
    }
}

#[async_trait]
impl TagSuggester for HttpTagSuggester {
    async fn suggest(&self, notes: &str) -> Result<Vec<String>, SuggestError> {
        match self.request(notes).await {
            Ok(tags) => {
                debug!(count = tags.len(), "tag suggestions received");
                Ok(tags)
            }
            Err(err) if err.is_retryable() => {
                let delay = jittered(RETRY_BASE_DELAY);
                warn!(error = %err, delay_ms = delay.as_millis() as u64, "suggestion failed, retrying once");
                tokio::time::sleep(delay).await;
                self.request(notes).await
            }
            Err(err) => Err(err),
        }
    }
}

/// Base delay plus up to 50% random jitter.
fn jittered(base: Duration) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..=base.as_millis() as u64 / 2);
    base + Duration::from_millis(jitter)
}
