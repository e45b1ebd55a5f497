use anyhow::{anyhow, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client as OpenAiClient,
};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Free-text generation capability used by the intent, lessons and answer
/// steps. Implementations may return anything, including non-JSON text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Configuration for the LLM client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub requests_per_minute: u32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            temperature: 0.2,
            requests_per_minute: 60,
            timeout_seconds: 30,
            max_retries: 3,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, PartialEq)]
pub enum LlmProvider {
    OpenAI,
}

/// Completion text with metadata
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub model: String,
    pub tokens_used: Option<u32>,
}

/// Rate limited chat-completion client with retries
pub struct LlmClient {
    openai_client: OpenAiClient<OpenAIConfig>,
    rate_limiter: Arc<DirectLimiter>,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self> {
        tracing::info!(
            "Initializing LLM client: provider={:?}, model={}, rate_limit={}/min",
            config.provider,
            config.model,
            config.requests_per_minute
        );

        let openai_client = match config.provider {
            LlmProvider::OpenAI => {
                OpenAiClient::with_config(OpenAIConfig::new().with_api_key(api_key))
            }
        };

        let requests_per_minute = NonZeroU32::new(config.requests_per_minute)
            .ok_or_else(|| anyhow!("requests_per_minute must be > 0"))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(requests_per_minute)));

        Ok(Self {
            openai_client,
            rate_limiter,
            config,
        })
    }

    /// Build a client from `OPENAI_API_KEY`
    pub fn from_env(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::new(config, api_key)
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send one prompt, retrying with exponential backoff
    pub async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        tracing::debug!("Prompt: {} chars, model {}", prompt.len(), self.config.model);

        let response = with_retries(
            &self.rate_limiter,
            self.config.max_retries,
            backoff_delay,
            || self.call_openai(prompt),
        )
        .await?;

        tracing::debug!(
            "Completion: {} chars, tokens={:?}",
            response.text.len(),
            response.tokens_used
        );
        Ok(response)
    }

    fn build_request(&self, prompt: &str) -> CreateChatCompletionRequest {
        CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                    name: None,
                },
            )],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            ..Default::default()
        }
    }

    async fn call_openai(&self, prompt: &str) -> Result<LlmResponse> {
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let response = tokio::time::timeout(
            timeout,
            self.openai_client.chat().create(self.build_request(prompt)),
        )
        .await
        .map_err(|_| anyhow!("chat completion timed out after {:?}", timeout))?
        .map_err(|e| anyhow!("OpenAI API error: {}", e))?;

        let tokens_used = response.usage.as_ref().map(|u| u.total_tokens);
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("completion had no content"))?;

        Ok(LlmResponse {
            text,
            model: response.model,
            tokens_used,
        })
    }
}

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Run `call` up to `max_retries` times. Every attempt, retries included,
/// waits for its own rate-limiter permit.
async fn with_retries<T, F, Fut>(
    limiter: &DirectLimiter,
    max_retries: u32,
    backoff: fn(u32) -> Duration,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_retries.max(1);
    let mut attempt = 0;
    loop {
        limiter.until_ready().await;
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        attempt += 1;
        if attempt >= max_attempts {
            return Err(err.context(format!("completion failed after {} attempts", attempt)));
        }

        let delay = backoff(attempt);
        tracing::warn!(
            "Completion attempt {}/{} failed, retrying in {:?}: {:#}",
            attempt,
            max_attempts,
            delay,
            err
        );
        sleep(delay).await;
    }
}

/// 1s, 2s, 4s, ... after the n-th failed attempt
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.saturating_sub(1).min(6))
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(self.complete(prompt).await?.text.trim().to_string())
    }
}
