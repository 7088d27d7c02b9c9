use std::time::Duration;

use async_trait::async_trait;
use common::config::JudgeConfig;
use common::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::JudgeError;
use super::ladder::{JudgeLadder, JudgeProvider};

const SYSTEM_PROMPT: &str = "You are an expert evaluator. Grade the submitted work strictly \
against the rubric and answer with a single JSON object matching the requested schema.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions provider for any OpenAI-compatible endpoint.
pub struct OpenAiJudge {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiJudge {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Primary then fallback model, sharing the key named by `api_key_env`.
    pub fn ladder_from_config(config: &JudgeConfig) -> Result<JudgeLadder, JudgeError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| JudgeError::MissingApiKey(config.api_key_env.clone()))?;
        let policy = RetryPolicy::new(
            config.max_retries,
            config.backoff_base_ms,
            config.backoff_max_ms,
        );

        let mut ladder = JudgeLadder::new(policy).with_provider(Self::new(
            &config.base_url,
            &api_key,
            &config.primary_model,
        )?);
        if config.fallback_model != config.primary_model {
            ladder = ladder.with_provider(Self::new(
                &config.base_url,
                &api_key,
                &config.fallback_model,
            )?);
        }
        Ok(ladder)
    }
}

#[async_trait]
impl JudgeProvider for OpenAiJudge {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, JudgeError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending judge request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| JudgeError::Transport("response had no message content".into()))
    }
}
