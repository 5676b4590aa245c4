//! Text-generation client backed by the OpenAI chat completions API.

use anyhow::{Context as _, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use secrecy::ExposeSecret as _;

use crate::config::AIConfig;

/// Anything that can turn a prompt into free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Chat-completions generator. One request per call, no retries.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    config: AIConfig,
}

impl OpenAiGenerator {
    /// Create a generator from the AI settings.
    ///
    /// Fails when the settings carry no credential.
    pub fn new(config: AIConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_owned())
            .context("No API key configured")?;

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = &config.base_url {
            openai_config = openai_config.with_api_base(base);
        }
        let client = Client::with_config(openai_config);

        Ok(Self { client, config })
    }

    fn system_prompt() -> &'static str {
        "You are a data analyst. You receive a statistical summary of a tabular dataset \
and reply with one short plain-text paragraph in English. No headings, no markdown."
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(Self::system_prompt())
                .build()
                .context("Failed to build system message")?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .context("Failed to build user message")?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(messages)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
            .context("Failed to build chat completion request")?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| anyhow::anyhow!("OpenAI API error: {e}"))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No response content received"))
    }
}
