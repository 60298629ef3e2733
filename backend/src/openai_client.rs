use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

/// Client for an OpenAI-compatible chat-completion endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one completion request and returns the first choice's text.
    /// Never retries; the request is abandoned once `cancel` fires or the
    /// deadline passes.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        debug!("Sending completion request to {} (model {})", url, self.model);

        let exchange = async {
            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                warn!("Completion endpoint answered with status {}", status);
            }

            let bytes = resp.bytes().await?;
            Ok::<_, ApiError>(bytes)
        };

        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = exchange => result?,
        };

        let envelope: ChatCompletionResponse =
            serde_json::from_slice(&bytes).map_err(ApiError::InvalidCompletion)?;

        let choice = envelope
            .choices
            .into_iter()
            .next()
            .ok_or(ApiError::EmptyCompletion)?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
