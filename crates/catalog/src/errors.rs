//! Error types for the genre classification domain.
//!
//! The taxonomy follows how each failure is treated:
//!
//! - [`GenerationError`] and the parse variants of [`ClassifyError`] are
//!   retried by the batch classifier.
//! - [`ClassifyError::RetriesExhausted`] is absorbed by the dataset merger,
//!   which falls back to [`crate::Genre::Unknown`] for the whole batch.
//! - [`DatasetError`] and [`ConfigError`] are caller errors and are returned
//!   before any service call is made.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Service errors
// ---------------------------------------------------------------------------

/// A failure reported by a [`crate::TextGenerator`] implementation.
///
/// Produced by infrastructure adapters; the orchestration layer treats every
/// variant as transient and retries it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The request never produced an HTTP response (connect failure, timeout,
    /// TLS error) or the response body could not be read.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the underlying transport failure.
        message: String,
    },

    /// The service answered with a non-success status (rate limit, quota,
    /// invalid request, server error).
    #[error("Service returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text, for diagnostics.
        body: String,
    },

    /// The service returned no candidate text.
    ///
    /// `block_reason` is set when the prompt was rejected by a safety filter.
    #[error("Service returned no content (block reason: {})", .block_reason.as_deref().unwrap_or("none"))]
    EmptyResponse {
        /// Reason the prompt was blocked, if the service reported one.
        block_reason: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Batch classification errors
// ---------------------------------------------------------------------------

/// Errors produced while classifying one batch.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The generation service failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The batch could not be serialised into a prompt.
    #[error("Failed to serialise batch for the prompt: {0}")]
    Serialise(#[source] serde_json::Error),

    /// The response text was not valid JSON.
    #[error("Response is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// The response was valid JSON but not a list of `{item_id, genre}` objects.
    #[error("Unexpected response structure: {detail}")]
    UnexpectedShape {
        /// What was wrong with the structure.
        detail: String,
    },

    /// Every attempt failed; no partial results are returned.
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts that were made.
        attempts: u32,
        /// Error from the final attempt.
        last: Box<ClassifyError>,
    },
}

// ---------------------------------------------------------------------------
// Dataset and configuration errors
// ---------------------------------------------------------------------------

/// Errors that prevent a table from being classified at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    /// A required column is absent from the input table.
    #[error("Table is missing the '{column}' column")]
    MissingColumn {
        /// Header of the missing column.
        column: String,
    },
}

/// An invalid configuration value.
///
/// Produced at construction time; nothing runs with an invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Configuration error: {message}")]
pub struct ConfigError {
    /// Description of the configuration problem.
    pub message: String,
}

impl ConfigError {
    /// Creates a [`ConfigError`] with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
