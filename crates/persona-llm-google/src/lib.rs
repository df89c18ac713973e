//! Google generateContent adapter.
//!
//! Unlike the other two vendors, Google authenticates via a `key` query
//! parameter on the request URL, and the model name is part of the path.

mod types;

use async_trait::async_trait;
use persona_llm::{
    ConnectionCheck, Error, GenerateOptions, Provider, ProviderAdapter, ProviderBackend, Result,
    classify_key_error,
};

use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    SystemInstruction,
};

/// Model used when the caller supplies none.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Cheapest variant, used only for key checks.
const CONNECTION_TEST_MODEL: &str = "gemini-2.0-flash-lite";

/// Configuration for the Google adapter.
pub struct GoogleConfig {
    pub base_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

/// Create a Google adapter over the given HTTP client.
pub fn adapter(client: reqwest::Client, config: GoogleConfig) -> ProviderAdapter {
    ProviderAdapter::new(GoogleBackend { client, config })
}

struct GoogleBackend {
    client: reqwest::Client,
    config: GoogleConfig,
}

#[async_trait]
impl ProviderBackend for GoogleBackend {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn generate(&self, options: &GenerateOptions, api_key: &str) -> Result<String> {
        let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let body = build_request(options);

        // The URL carries the API key, and reqwest errors display their
        // request URL — strip it so the key can never reach a log line
        // or an error message shown to the user.
        let url = build_url(&self.config.base_url, model, api_key);

        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(Box::new(e.without_url())))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                code: status.as_str().to_string(),
                message,
            });
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| Error::Http(Box::new(e.without_url())))?;
        first_text(parsed).ok_or(Error::EmptyResponse)
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

fn build_request(options: &GenerateOptions) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part {
                text: options.prompt.clone(),
            }],
        }],
        system_instruction: options.system_prompt.clone().map(|text| SystemInstruction {
            parts: vec![Part { text }],
        }),
        generation_config: options.max_tokens.map(|max_output_tokens| GenerationConfig {
            max_output_tokens,
        }),
    }
}

fn build_url(base_url: &str, model: &str, api_key: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/models/{model}:generateContent?key={api_key}")
}

/// First non-empty part of the first candidate, if any.
fn first_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .map(|part| part.text)
        .find(|text| !text.is_empty())
}
