//! The LLM-backed [`BatchClassifier`].
//!
//! One call to [`LlmBatchClassifier::classify`] builds the prompt once, then
//! sends it up to `retry.max_attempts` times. Service errors, invalid JSON and
//! a malformed reply structure all count as a failed attempt; the first reply
//! that parses wins. There are no partial results: either the whole reply is
//! accepted or the batch fails.

use async_trait::async_trait;
use catalog::{
    BatchClassifier, BatchOutcome, BookRecord, ClassifierConfig, ClassifyError, ConfigError,
    GenerationRequest, TextGenerator,
};
use tracing::{debug, error, info, warn};

use crate::prompt::build_prompt;
use crate::response::parse_reply;

/// Characters of the prompt included in debug logs.
const PROMPT_LOG_SNIPPET: usize = 500;

/// Classifies batches by prompting a [`TextGenerator`].
pub struct LlmBatchClassifier<G> {
    generator: G,
    config: ClassifierConfig,
}

impl<G: TextGenerator> LlmBatchClassifier<G> {
    /// Creates a classifier, rejecting an invalid `config`.
    pub fn new(generator: G, config: ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { generator, config })
    }

    /// The configuration this classifier was built with.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn request_for(&self, prompt: String) -> GenerationRequest {
        GenerationRequest {
            model: self.config.model.clone(),
            prompt,
            temperature: self.config.temperature,
            candidate_count: self.config.candidate_count,
            response_mime_type: self.config.response_mime_type.clone(),
        }
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<BatchOutcome, ClassifyError> {
        let reply = self.generator.generate(request).await?;
        let parsed = parse_reply(&reply).inspect_err(|err| {
            debug!(error = %err, reply = %reply, "Reply rejected");
        })?;
        if parsed.coerced > 0 {
            warn!(coerced = parsed.coerced, "Replaced unrecognised genres with fallback");
        }
        Ok(BatchOutcome {
            results: parsed.results,
            coerced: parsed.coerced,
        })
    }
}

#[async_trait]
impl<G: TextGenerator> BatchClassifier for LlmBatchClassifier<G> {
    async fn classify(&self, batch: &[BookRecord]) -> Result<BatchOutcome, ClassifyError> {
        let request = self.request_for(build_prompt(batch)?);
        let max_attempts = self.config.retry.max_attempts;
        let mut attempt = 1;

        loop {
            debug!(
                attempt,
                max_attempts,
                prompt = %snippet(&request.prompt),
                "Sending classification prompt"
            );

            let err = match self.attempt(&request).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => err,
            };
            error!(attempt, max_attempts, error = %err, "Classification attempt failed");

            match self.config.retry.delay_after(attempt) {
                Some(delay) => {
                    info!(delay_secs = delay.as_secs_f64(), "Retrying batch");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    error!(attempts = attempt, "Max retries reached for batch");
                    return Err(ClassifyError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
            }
        }
    }
}

fn snippet(text: &str) -> &str {
    match text.char_indices().nth(PROMPT_LOG_SNIPPET) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
