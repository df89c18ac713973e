//! The closed registry: one adapter instance per supported provider.

use persona_llm::{Provider, ProviderAdapter, Result};
use persona_llm_anthropic::AnthropicConfig;
use persona_llm_google::GoogleConfig;
use persona_llm_openai::OpenAIConfig;

/// Holds one stateless adapter per provider, constructed up front over a
/// shared HTTP client. Adapters carry no mutable state, so a single
/// registry can serve arbitrarily many concurrent generation calls.
pub struct Registry {
    anthropic: ProviderAdapter,
    openai: ProviderAdapter,
    google: ProviderAdapter,
}

impl Registry {
    /// Build a registry with each vendor's default base URL.
    pub fn new() -> Self {
        let client = reqwest::Client::new();
        Self {
            anthropic: persona_llm_anthropic::adapter(
                client.clone(),
                AnthropicConfig::default(),
            ),
            openai: persona_llm_openai::adapter(client.clone(), OpenAIConfig::default()),
            google: persona_llm_google::adapter(client, GoogleConfig::default()),
        }
    }

    /// The adapter for a provider. Infallible — the enum is closed.
    pub fn adapter(&self, provider: Provider) -> &ProviderAdapter {
        match provider {
            Provider::Anthropic => &self.anthropic,
            Provider::OpenAI => &self.openai,
            Provider::Google => &self.google,
        }
    }

    /// Look up an adapter from a provider identifier string, as received
    /// from the web layer. Unknown identifiers fail with
    /// [`persona_llm::Error::UnknownProvider`].
    pub fn adapter_by_name(&self, name: &str) -> Result<&ProviderAdapter> {
        Ok(self.adapter(name.parse()?))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_resolves_to_its_own_adapter() {
        let registry = Registry::new();
        for provider in Provider::ALL {
            assert_eq!(registry.adapter(provider).provider(), provider);
        }
    }

    #[test]
    fn lookup_by_name_matches_lookup_by_enum() {
        let registry = Registry::new();
        let adapter = registry.adapter_by_name("openai").expect("known provider");
        assert_eq!(adapter.provider(), Provider::OpenAI);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry = Registry::new();
        let err = registry.adapter_by_name("cohere").unwrap_err();
        assert!(matches!(
            err,
            persona_llm::Error::UnknownProvider(name) if name == "cohere"
        ));
    }
}
