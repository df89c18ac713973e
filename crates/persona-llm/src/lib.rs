//! # persona-llm
//!
//! Core contract for persona's language-model layer.
//!
//! This crate defines:
//!
//! - The [`ProviderBackend`] trait that each vendor adapter crate
//!   implements, plus the type-erased [`ProviderAdapter`] wrapper so
//!   callers never need generic parameters.
//! - [`GenerateOptions`], the per-call value object.
//! - [`parse_json_response`], the resilient JSON extractor that turns a
//!   raw completion into structured data even when the model wrapped it
//!   in markdown fences or ran out of tokens mid-structure.
//!
//! Adapter crates (`persona-llm-anthropic`, `persona-llm-openai`,
//! `persona-llm-google`) depend on this crate; the registry crate wires
//! them together.

pub mod error;
pub mod extract;
pub mod options;
pub mod provider;

pub use error::{Error, Result};
pub use extract::parse_json_response;
pub use options::GenerateOptions;
pub use provider::{
    ConnectionCheck, Provider, ProviderAdapter, ProviderBackend, classify_key_error,
};
