/// Knobs for a single text-generation call.
///
/// A frozen value object: built once by the caller, read by the adapter,
/// never mutated in place. `model` overrides the adapter's built-in
/// default when set; `max_tokens` caps the output length.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
}

impl GenerateOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: None,
            model: None,
        }
    }

    pub fn system_prompt(mut self, text: impl Into<String>) -> Self {
        self.system_prompt = Some(text.into());
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    pub fn model(mut self, id: impl Into<String>) -> Self {
        self.model = Some(id.into());
        self
    }
}
