//! The single generation surface the rest of the application calls.

use persona_llm::{GenerateOptions, Result};

use crate::registry::Registry;
use crate::settings::{AiSettings, resolve_api_key};

/// Resolve credentials, pick the adapter, and run one generation call.
///
/// Model precedence: an explicit `options.model` beats the model stored
/// in the user's settings, which beats the adapter's built-in default.
/// Errors propagate unchanged — no retries, no swallowing; the caller
/// owns user-facing messaging and any backoff policy.
pub async fn generate_with_ai(
    registry: &Registry,
    settings: &AiSettings,
    options: GenerateOptions,
) -> Result<String> {
    let (api_key, source) = resolve_api_key(settings)?;

    tracing::info!(
        provider = %settings.provider,
        key_source = source.as_str(),
        "dispatching generation request"
    );

    let mut options = options;
    if options.model.is_none()
        && let Some(model) = &settings.model
    {
        options = options.model(model.clone());
    }

    registry.adapter(settings.provider).generate(&options, &api_key).await
}

#[cfg(test)]
mod tests {
    use persona_llm::{Error, Provider};

    use super::*;

    #[tokio::test]
    async fn fails_before_any_network_call_without_a_key() {
        let registry = Registry::new();
        let settings = AiSettings {
            provider: Provider::Anthropic,
            model: None,
            api_key: None,
        };

        // Shield the test from ambient developer machines: an env key
        // would make this resolve, so only assert when none is set.
        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            return;
        }

        let err = generate_with_ai(&registry, &settings, GenerateOptions::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingApiKey { .. }));
    }
}
