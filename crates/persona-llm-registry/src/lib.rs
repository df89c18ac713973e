//! # persona-llm-registry
//!
//! Wires the vendor adapter crates into one closed registry and exposes
//! the single call surface the rest of the application uses:
//!
//! ```ignore
//! use persona_llm::GenerateOptions;
//! use persona_llm_registry::{AiSettings, Registry, generate_with_ai};
//!
//! let registry = Registry::new();
//!
//! // Settings come from the user's persisted preferences, or default
//! // to the system configuration.
//! let settings = AiSettings::system_default();
//!
//! let options = GenerateOptions::new("List five audience segments for a coffee brand")
//!     .system_prompt("Respond with a JSON array only")
//!     .max_tokens(1024);
//!
//! let text = generate_with_ai(&registry, &settings, options).await?;
//! let segments: Vec<String> = persona_llm::parse_json_response(&text)?;
//! ```

pub mod registry;
pub mod service;
pub mod settings;

pub use registry::Registry;
pub use service::generate_with_ai;
pub use settings::{AiSettings, KeySource, env_candidates, resolve_api_key};
