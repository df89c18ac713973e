//! Anthropic Messages API adapter.

mod types;

use async_trait::async_trait;
use persona_llm::{
    ConnectionCheck, Error, GenerateOptions, Provider, ProviderAdapter, ProviderBackend, Result,
    classify_key_error,
};

use crate::types::{ContentBlock, Message, MessagesRequest, MessagesResponse};

/// Model used when the caller supplies none.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Cheapest variant, used only for key checks.
const CONNECTION_TEST_MODEL: &str = "claude-3-5-haiku-20241022";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The Messages API rejects requests without `max_tokens`, so this cap
/// applies whenever the caller does not set one.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Configuration for the Anthropic adapter.
pub struct AnthropicConfig {
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
        }
    }
}

/// Create an Anthropic adapter over the given HTTP client.
pub fn adapter(client: reqwest::Client, config: AnthropicConfig) -> ProviderAdapter {
    ProviderAdapter::new(AnthropicBackend { client, config })
}

struct AnthropicBackend {
    client: reqwest::Client,
    config: AnthropicConfig,
}

#[async_trait]
impl ProviderBackend for AnthropicBackend {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate(&self, options: &GenerateOptions, api_key: &str) -> Result<String> {
        let body = build_request(options);

        let resp = self
            .client
            .post(endpoint(&self.config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
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

        let parsed: MessagesResponse = resp.json().await.map_err(|e| Error::Http(Box::new(e)))?;
        first_text(parsed).ok_or(Error::EmptyResponse)
    }

    async fn test_connection(&self, api_key: &str) -> ConnectionCheck {
        let probe = GenerateOptions::new("ping")
            .model(CONNECTION_TEST_MODEL)
            .max_tokens(1);

        match self.generate(&probe, api_key).await {
            // An empty answer still proves the key is authorized.
            Ok(_) | Err(Error::EmptyResponse) => ConnectionCheck::ok(),
            Err(err) => ConnectionCheck::rejected(classify_key_error(&err.to_string())),
        }
    }
}

fn build_request(options: &GenerateOptions) -> MessagesRequest {
    MessagesRequest {
        model: options.model.clone().unwrap_or_else(|| DEFAULT_MODEL.into()),
        max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        messages: vec![Message {
            role: "user",
            content: options.prompt.clone(),
        }],
        system: options.system_prompt.clone(),
    }
}

/// First non-empty text block, if any.
fn first_text(response: MessagesResponse) -> Option<String> {
    response.content.into_iter().find_map(|block| match block {
        ContentBlock::Text { text } if !text.is_empty() => Some(text),
        _ => None,
    })
}

fn endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        format!("{trimmed}/messages")
    } else {
        format!("{trimmed}/v1/messages")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_with_and_without_v1() {
        assert_eq!(
            endpoint("https://api.anthropic.com"),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(
            endpoint("https://proxy.example.com/v1/"),
            "https://proxy.example.com/v1/messages"
        );
    }

    #[test]
    fn request_applies_defaults_and_omits_empty_system() {
        let body = build_request(&GenerateOptions::new("list three segments"));
        let json = serde_json::to_value(&body).expect("serializable");

        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("system").is_none());
    }

    #[test]
    fn request_honors_caller_overrides() {
        let options = GenerateOptions::new("hello")
            .system_prompt("you are a market researcher")
            .model("claude-opus-4-1")
            .max_tokens(512);
        let json = serde_json::to_value(build_request(&options)).expect("serializable");

        assert_eq!(json["model"], "claude-opus-4-1");
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["system"], "you are a market researcher");
    }

    #[test]
    fn first_text_skips_non_text_blocks_and_rejects_empty() {
        let parsed: MessagesResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "the answer"}
            ]}"#,
        )
        .expect("fixture parses");
        assert_eq!(first_text(parsed).as_deref(), Some("the answer"));

        let empty: MessagesResponse =
            serde_json::from_str(r#"{"content": [{"type": "text", "text": ""}]}"#)
                .expect("fixture parses");
        assert_eq!(first_text(empty), None);

        let none: MessagesResponse =
            serde_json::from_str(r#"{"content": []}"#).expect("fixture parses");
        assert_eq!(first_text(none), None);
    }
}
