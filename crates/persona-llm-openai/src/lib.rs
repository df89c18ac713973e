//! OpenAI adapter.
//!
//! One vendor, two API shapes: reasoning-oriented model families only
//! accept the Responses API, everything else speaks Chat Completions.
//! The split is a static prefix rule on the model id and stays internal
//! to this crate — callers just see `generate()`.

mod types;

use async_trait::async_trait;
use persona_llm::{
    ConnectionCheck, Error, GenerateOptions, Provider, ProviderAdapter, ProviderBackend, Result,
    classify_key_error,
};

use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, OutputContent, OutputItem, ResponsesRequest,
    ResponsesResponse,
};

/// Model used when the caller supplies none.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Cheapest variant, used only for key checks.
const CONNECTION_TEST_MODEL: &str = "gpt-4o-mini";

/// Model-id prefixes that must go through the Responses API.
const RESPONSES_MODEL_PREFIXES: &[&str] = &["o1", "o3", "o4", "gpt-5"];

/// Configuration for the OpenAI adapter.
pub struct OpenAIConfig {
    pub base_url: String,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
        }
    }
}

/// Create an OpenAI adapter over the given HTTP client.
pub fn adapter(client: reqwest::Client, config: OpenAIConfig) -> ProviderAdapter {
    ProviderAdapter::new(OpenAIBackend { client, config })
}

struct OpenAIBackend {
    client: reqwest::Client,
    config: OpenAIConfig,
}

#[async_trait]
impl ProviderBackend for OpenAIBackend {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn generate(&self, options: &GenerateOptions, api_key: &str) -> Result<String> {
        let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);

        if uses_responses_api(model) {
            self.generate_responses(model, options, api_key).await
        } else {
            self.generate_chat(model, options, api_key).await
        }
    }

    async fn test_connection(&self, api_key: &str) -> ConnectionCheck {
        let probe = GenerateOptions::new("ping")
            .model(CONNECTION_TEST_MODEL)
            .max_tokens(1);

        match self.generate(&probe, api_key).await {
            Ok(_) | Err(Error::EmptyResponse) => ConnectionCheck::ok(),
            Err(err) => ConnectionCheck::rejected(classify_key_error(&err.to_string())),
        }
    }
}

impl OpenAIBackend {
    async fn generate_chat(
        &self,
        model: &str,
        options: &GenerateOptions,
        api_key: &str,
    ) -> Result<String> {
        let body = build_chat_request(model, options);
        let url = format!("{}/chat/completions", base(&self.config.base_url));

        let parsed: ChatResponse = self.post(&url, api_key, &body).await?;
        chat_text(parsed).ok_or(Error::EmptyResponse)
    }

    async fn generate_responses(
        &self,
        model: &str,
        options: &GenerateOptions,
        api_key: &str,
    ) -> Result<String> {
        let body = build_responses_request(model, options);
        let url = format!("{}/responses", base(&self.config.base_url));

        let parsed: ResponsesResponse = self.post(&url, api_key, &body).await?;
        responses_text(parsed).ok_or(Error::EmptyResponse)
    }

    async fn post<B, R>(&self, url: &str, api_key: &str, body: &B) -> Result<R>
    where
        B: serde::Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let resp = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(Box::new(e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                code: status.as_str().to_string(),
                message,
            });
        }

        resp.json().await.map_err(|e| Error::Http(Box::new(e)))
    }
}

/// Whether this model family only supports the Responses API.
fn uses_responses_api(model: &str) -> bool {
    RESPONSES_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

fn build_chat_request(model: &str, options: &GenerateOptions) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &options.system_prompt {
        messages.push(ChatMessage {
            role: "system",
            content: system.clone(),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: options.prompt.clone(),
    });

    ChatRequest {
        model: model.to_string(),
        messages,
        max_tokens: options.max_tokens,
    }
}

fn build_responses_request(model: &str, options: &GenerateOptions) -> ResponsesRequest {
    ResponsesRequest {
        model: model.to_string(),
        instructions: options.system_prompt.clone(),
        input: options.prompt.clone(),
        max_output_tokens: options.max_tokens,
    }
}

fn chat_text(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .filter(|text| !text.is_empty())
}

fn responses_text(response: ResponsesResponse) -> Option<String> {
    response
        .output
        .into_iter()
        .find_map(|item| match item {
            OutputItem::Message { content } => content.into_iter().find_map(|c| match c {
                OutputContent::OutputText { text } if !text.is_empty() => Some(text),
                _ => None,
            }),
            OutputItem::Unknown => None,
        })
}

fn base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}
