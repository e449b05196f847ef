//! Genrefy LLM provider infrastructure adapter.
//!
//! Implements the [`catalog::TextGenerator`] trait for Google's Gemini API.
//! Additional providers are added as new modules in this crate without any
//! changes to the `catalog` or `classifier` crates.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, response decoding
//! and API-key handling live here. The orchestration layer sees only
//! [`catalog::TextGenerator`] and [`catalog::GenerationError`]; retrying is its
//! concern, not this crate's.

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiProvider, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
