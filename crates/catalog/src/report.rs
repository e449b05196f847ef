//! Summary of one dataset classification run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Genre, ModelName, RunId, Timestamp};

/// Counters collected while classifying a table.
///
/// Serialised as JSON by the CLI when a report path is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Identifier of the run.
    pub run_id: RunId,
    /// Model the batches were sent to.
    pub model: ModelName,
    /// When classification started.
    pub started_at: Timestamp,
    /// When the output table was assembled.
    pub finished_at: Timestamp,
    /// Number of rows in the input (and output) table.
    pub rows: usize,
    /// Number of batches the table was split into.
    pub batches: usize,
    /// Batches that fell back to [`Genre::Unknown`] after exhausting retries.
    pub failed_batches: usize,
    /// Labels the service returned outside the vocabulary, replaced by
    /// [`Genre::Unknown`].
    pub coerced_labels: usize,
    /// Rows that received no result from a successful batch.
    pub unmatched_rows: usize,
    /// Output rows per label, keyed by label string.
    pub genre_counts: BTreeMap<String, usize>,
}

impl RunReport {
    /// Starts a report with every counter at zero.
    pub fn start(run_id: RunId, model: ModelName) -> Self {
        let now = Timestamp::now();
        Self {
            run_id,
            model,
            started_at: now,
            finished_at: now,
            rows: 0,
            batches: 0,
            failed_batches: 0,
            coerced_labels: 0,
            unmatched_rows: 0,
            genre_counts: BTreeMap::new(),
        }
    }

    /// Adds one output row labelled `genre` to the per-label counts.
    pub fn count_genre(&mut self, genre: Genre) {
        *self.genre_counts.entry(genre.as_str().to_string()).or_default() += 1;
    }

    /// Rows that ended up as [`Genre::Unknown`].
    pub fn unknown_rows(&self) -> usize {
        self.genre_counts
            .get(Genre::Unknown.as_str())
            .copied()
            .unwrap_or_default()
    }

    /// Stamps the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Timestamp::now();
    }
}
