//! Port traits implemented by infrastructure and orchestration crates.
//!
//! Both traits are object-safe (via `async-trait`) so the CLI can hold them as
//! `Box<dyn ...>` and tests can substitute deterministic stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{BookRecord, ClassificationResult, ClassifyError, GenerationError, ModelName};

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

/// One prompt sent to a generative text service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model to run the prompt against.
    pub model: ModelName,
    /// Full prompt text.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Number of candidates to generate; only the first is used.
    pub candidate_count: u32,
    /// MIME type the response text should be produced in.
    pub response_mime_type: String,
}

/// A generative text service (e.g. Gemini).
///
/// Implementations perform exactly one request per call; retrying is the
/// caller's concern.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends `request` and returns the text of the first candidate.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

// ---------------------------------------------------------------------------
// Batch classification
// ---------------------------------------------------------------------------

/// Assigns a genre to every book in a batch.
///
/// The dataset merger depends only on this trait, so a run can be driven by
/// the LLM-backed classifier in production and by a stub in tests.
#[async_trait]
pub trait BatchClassifier: Send + Sync {
    /// Classifies `batch`, returning one result per book the service answered
    /// for, or an error once the classifier has given up on the batch.
    async fn classify(&self, batch: &[BookRecord]) -> Result<BatchOutcome, ClassifyError>;
}

/// What a [`BatchClassifier`] produced for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// One result per object the service returned, in reply order.
    pub results: Vec<ClassificationResult>,
    /// How many of `results` carry a label that was outside the vocabulary
    /// and was replaced by [`crate::Genre::Unknown`].
    pub coerced: usize,
}

impl From<Vec<ClassificationResult>> for BatchOutcome {
    fn from(results: Vec<ClassificationResult>) -> Self {
        Self {
            results,
            coerced: 0,
        }
    }
}
