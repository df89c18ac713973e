//! Per-request generation settings and credential resolution.
//!
//! A fresh [`AiSettings`] value is produced for every generation
//! request — read from the user's persisted preferences by the web
//! layer, or defaulted. The resolved key itself is transient: fetched,
//! used for one call, dropped. Only its *source* is ever logged.

use persona_llm::{Error, Provider, Result};
use serde::{Deserialize, Serialize};

/// A user's (or the system default) generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettings {
    pub provider: Provider,
    /// Overrides the adapter's built-in default model when set.
    #[serde(default)]
    pub model: Option<String>,
    /// User-supplied key. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl AiSettings {
    /// The configuration used when a user has no stored preferences:
    /// system provider, built-in default model, system environment key.
    pub fn system_default() -> Self {
        Self {
            provider: Provider::Anthropic,
            model: None,
            api_key: None,
        }
    }
}

/// Where a resolved API key came from. This tag is what gets logged —
/// never the key itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Supplied by the end user through their settings.
    User,
    /// Fallback from the server's environment.
    System,
}

impl KeySource {
    pub fn as_str(self) -> &'static str {
        match self {
            KeySource::User => "user",
            KeySource::System => "system",
        }
    }
}

/// Environment variables checked, in order, for each provider's system
/// key.
pub fn env_candidates(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::Anthropic => &["ANTHROPIC_API_KEY"],
        Provider::OpenAI => &["OPENAI_API_KEY"],
        Provider::Google => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
    }
}

/// Resolve the API key for a request: the user's key wins, otherwise
/// the first matching environment variable. Fails *before* any network
/// call when neither is present.
pub fn resolve_api_key(settings: &AiSettings) -> Result<(String, KeySource)> {
    resolve_with(settings, |var| std::env::var(var).ok())
}

fn resolve_with(
    settings: &AiSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(String, KeySource)> {
    if let Some(key) = settings.api_key.as_deref() {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok((trimmed.to_string(), KeySource::User));
        }
    }

    for var in env_candidates(settings.provider) {
        if let Some(key) = lookup(var) {
            let trimmed = key.trim();
            if !trimmed.is_empty() {
                return Ok((trimmed.to_string(), KeySource::System));
            }
        }
    }

    Err(Error::MissingApiKey {
        provider: settings.provider.to_string(),
        env_hint: env_candidates(settings.provider)[0].to_string(),
    })
}
