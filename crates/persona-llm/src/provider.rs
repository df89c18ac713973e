use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::options::GenerateOptions;

/// A supported language model vendor.
///
/// The set is closed and compiled in — there is no dynamic provider
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAI,
    Google,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAI => "openai",
            Provider::Google => "google",
        }
    }

    /// All supported providers, in display order.
    pub const ALL: [Provider; 3] = [Provider::Anthropic, Provider::OpenAI, Provider::Google];
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "anthropic" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAI),
            "google" | "google-gemini" | "gemini" => Ok(Provider::Google),
            other => Err(Error::UnknownProvider(other.to_string())),
        }
    }
}

/// Outcome of an API key check, designed to report rather than raise.
///
/// Serialized as-is to the settings UI, so the error text is already
/// classified into something a user can act on.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionCheck {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}

/// Trait that vendor adapter crates implement.
///
/// Implementations must be stateless apart from their HTTP client and
/// base URL, so one instance can serve arbitrarily many concurrent
/// calls without coordination.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    fn provider(&self) -> Provider;

    /// Issue one text-completion request. A single attempt: no retries,
    /// no timeout beyond the HTTP client's defaults. Returns the first
    /// textual content block; an empty or missing block is an error,
    /// never an empty-string success.
    async fn generate(&self, options: &GenerateOptions, api_key: &str) -> Result<String>;

    /// Issue a minimal low-cost request solely to check that the key is
    /// authorized. Always reports; never bubbles an `Err`.
    async fn test_connection(&self, api_key: &str) -> ConnectionCheck;
}

/// A concrete, type-erased provider adapter.
///
/// Wraps a [`ProviderBackend`] behind a `Box<dyn ...>` so that callers
/// never need generic parameters — adapters can be stored side by side
/// and swapped freely.
pub struct ProviderAdapter {
    inner: Box<dyn ProviderBackend>,
}

impl fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("provider", &self.provider())
            .finish()
    }
}

impl ProviderAdapter {
    /// Wrap any backend implementation into an adapter.
    pub fn new(backend: impl ProviderBackend + 'static) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    /// The vendor this adapter talks to.
    pub fn provider(&self) -> Provider {
        self.inner.provider()
    }

    pub async fn generate(&self, options: &GenerateOptions, api_key: &str) -> Result<String> {
        self.inner.generate(options, api_key).await
    }

    pub async fn test_connection(&self, api_key: &str) -> ConnectionCheck {
        self.inner.test_connection(api_key).await
    }
}

/// Bucket a raw vendor error message into something a user can act on.
///
/// Best-effort substring matching, not a typed vendor error contract:
/// vendors change their wording, so anything unrecognized falls through
/// as the raw message. Quota is checked before rate limiting because
/// quota-exhaustion errors from some vendors arrive with a 429 and
/// rate-limit phrasing alongside the quota wording.
pub fn classify_key_error(raw: &str) -> String {
    let lower = raw.to_lowercase();

    if lower.contains("quota")
        || lower.contains("billing")
        || lower.contains("credit balance")
    {
        return "quota exhausted — check your plan and billing details".to_string();
    }
    if lower.contains("rate limit") || lower.contains("rate_limit") || lower.contains("429") {
        return "rate limited — try again shortly".to_string();
    }
    if lower.contains("permission") || lower.contains("forbidden") || lower.contains("403") {
        return "API key lacks permission for this model".to_string();
    }
    if lower.contains("invalid api key")
        || lower.contains("incorrect api key")
        || lower.contains("invalid x-api-key")
        || lower.contains("api key not valid")
        || lower.contains("authentication")
        || lower.contains("unauthorized")
        || lower.contains("401")
    {
        return "invalid API key".to_string();
    }

    raw.to_string()
}
