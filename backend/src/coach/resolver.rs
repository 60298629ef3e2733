//! Picks the plan source per request and records generated plans.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::prompt::{self, SYSTEM_INSTRUCTION};
use crate::config::{Config, PersistencePolicy};
use crate::error::ApiError;
use crate::models::{ChatMessage, GeneratedPlan, UserProfile};
use crate::openai_client::OpenAiClient;
use crate::storage::Storage;

/// Where plans come from for the lifetime of the process.
#[derive(Clone)]
pub enum PlanSource {
    Mock,
    Live(OpenAiClient),
}

impl PlanSource {
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        match &config.openai_api_key {
            None => Ok(PlanSource::Mock),
            Some(key) => Ok(PlanSource::Live(OpenAiClient::new(
                &config.openai_base_url,
                key.clone(),
                config.openai_model.clone(),
                config.openai_timeout,
            )?)),
        }
    }
}

pub struct PlanResolver {
    source: PlanSource,
    storage: Arc<Storage>,
    policy: PersistencePolicy,
}

impl PlanResolver {
    pub fn new(source: PlanSource, storage: Arc<Storage>, policy: PersistencePolicy) -> Self {
        Self {
            source,
            storage,
            policy,
        }
    }

    /// Produces the JSON body for a plan request.
    pub async fn resolve(
        &self,
        profile: &UserProfile,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let client = match &self.source {
            PlanSource::Mock => {
                info!("No completion credential configured, serving mock plan");
                return Ok(serde_json::to_string(&GeneratedPlan::mock())?);
            }
            PlanSource::Live(client) => client,
        };

        let messages = [
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(prompt::compose(profile)),
        ];

        info!("Requesting plan from model {}", client.model());
        let reply = client.complete(&messages, cancel).await?;
        let content = normalize_reply(&reply).to_string();

        self.persist(profile, &content).await?;

        Ok(content)
    }

    async fn persist(&self, profile: &UserProfile, content: &str) -> Result<(), ApiError> {
        if profile.user_id.is_empty() {
            debug!("No user id on request, skipping persistence");
            return Ok(());
        }

        let Some(store) = self.storage.acquire().await else {
            debug!("Storage unavailable, skipping persistence");
            return Ok(());
        };

        match self.policy {
            PersistencePolicy::BestEffort => {
                if let Err(e) = store.upsert_user(profile).await {
                    error!("Error saving user {}: {}", profile.user_id, e);
                }
                if let Err(e) = store.insert_plan(&profile.user_id, content).await {
                    error!("Error saving plan for {}: {}", profile.user_id, e);
                }
                Ok(())
            }
            PersistencePolicy::Transactional => store
                .save_plan(profile, content)
                .await
                .map_err(|e| ApiError::PersistenceError(e.to_string())),
        }
    }
}

/// Strips code-fence markers and surrounding whitespace from a model reply.
///
/// The reply is trimmed before the markers are stripped as well as after, so
/// a closing fence followed by a newline is still removed. A plain
/// strip-then-trim would leave "{}\n```" for "```json\n{}\n```\n".
pub fn normalize_reply(reply: &str) -> &str {
    let content = reply.trim();
    let content = content.strip_prefix("```json").unwrap_or(content);
    let content = content.strip_suffix("```").unwrap_or(content);
    content.trim()
}
