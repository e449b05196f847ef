//! Configuration structures passed into the classifier and the dataset merger.
//!
//! Every structure has a documented [`Default`] matching the production
//! settings and a `validate` method that rejects values the orchestration layer
//! cannot work with.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ModelName};

/// Default model used for classification.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Default number of books sent in one request.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default number of attempts per batch (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts for the same batch.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default pause between consecutive batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);

/// Default sampling temperature. Low, so classification is near-deterministic.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed(Duration),
    /// `initial` before the first retry, doubling for each later retry, never
    /// exceeding `max`.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Upper bound for any single delay.
        max: Duration,
    },
}

/// How many times to attempt a batch and how long to wait in between.
///
/// The policy only computes delays; the batch classifier does the waiting. A
/// policy built with [`RetryPolicy::no_delay`] never waits, which keeps tests
/// free of real sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, first try included. Must be at least 1.
    pub max_attempts: u32,
    /// Delay schedule applied between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// A fixed-delay policy.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// An exponential policy starting at `initial` and capped at `max`.
    pub fn exponential(max_attempts: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { initial, max },
        }
    }

    /// A policy that retries immediately.
    pub fn no_delay(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Returns `None` once `attempt` reaches `max_attempts`: there is no retry
    /// after the final attempt, so there is nothing to wait for.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let delay = match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let exponent = attempt.saturating_sub(1).min(31);
                initial
                    .checked_mul(1u32 << exponent)
                    .unwrap_or(max)
                    .min(max)
            }
        };
        Some(delay)
    }

    /// Rejects a policy that would never attempt anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::new("max_attempts must be at least 1"));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    /// Three attempts, five seconds apart.
    fn default() -> Self {
        Self::fixed(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

// ---------------------------------------------------------------------------
// Component configuration
// ---------------------------------------------------------------------------

/// Settings for the LLM-backed batch classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Model asked to classify each batch. Default: [`DEFAULT_MODEL`].
    pub model: ModelName,
    /// Sampling temperature. Default: [`DEFAULT_TEMPERATURE`].
    pub temperature: f32,
    /// Number of candidates requested. Default: 1.
    pub candidate_count: u32,
    /// MIME type the response is requested in. Default: `application/json`.
    pub response_mime_type: String,
    /// Attempts and delays per batch. Default: [`RetryPolicy::default`].
    pub retry: RetryPolicy,
}

impl ClassifierConfig {
    /// Checks every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::new(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if self.candidate_count == 0 {
            return Err(ConfigError::new("candidate_count must be at least 1"));
        }
        self.retry.validate()
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: ModelName::default(),
            temperature: DEFAULT_TEMPERATURE,
            candidate_count: 1,
            response_mime_type: "application/json".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------

/// Settings for the dataset merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Maximum number of books per batch. Default: [`DEFAULT_BATCH_SIZE`].
    pub batch_size: usize,
    /// Pause between consecutive batches. Default: [`DEFAULT_BATCH_DELAY`].
    pub batch_delay: Duration,
}

impl DatasetConfig {
    /// Rejects a zero batch size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::new("batch_size must be at least 1"));
        }
        Ok(())
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }
}
