use refshelf_core::ParsedReference;
use refshelf_parsing::ParsingConfig;
use serde::{Deserialize, Serialize};

use crate::prompt::{SYSTEM_PROMPT, references_prompt, summary_prompt};
use crate::{LlmConfig, LlmError, parse_reference_block_with_config};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Ask the model for a short summary of the paper.
    pub async fn summarize(&self, paper_text: &str) -> Result<String, LlmError> {
        let prompt = summary_prompt(paper_text, self.config.max_input_chars);
        self.complete(&prompt).await
    }

    /// Ask the model for the paper's bibliography.
    ///
    /// Fails with [`LlmError::MalformedBlock`] or [`LlmError::EmptyResponse`]
    /// when the reply holds no usable reference list.
    pub async fn extract_references(
        &self,
        paper_text: &str,
    ) -> Result<Vec<ParsedReference>, LlmError> {
        self.extract_references_with_config(paper_text, &ParsingConfig::default())
            .await
    }

    /// Like [`extract_references`](Self::extract_references), validating
    /// records with the extractor settings in `parsing`.
    pub async fn extract_references_with_config(
        &self,
        paper_text: &str,
        parsing: &ParsingConfig,
    ) -> Result<Vec<ParsedReference>, LlmError> {
        let prompt = references_prompt(paper_text, self.config.max_input_chars);
        let reply = self.complete(&prompt).await?;
        parse_reference_block_with_config(&reply, parsing)
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.config.model,
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
            temperature: 0.0,
        };

        tracing::debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "sending chat completion"
        );

        let resp = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: ChatResponse = resp.json().await?;
        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
