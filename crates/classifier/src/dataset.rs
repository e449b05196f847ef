//! The dataset merger: classifies a whole [`Table`] batch by batch.
//!
//! The merger is fail-open. A batch the classifier gives up on is labelled
//! [`Genre::Unknown`] and the run moves on; the only error it returns is a
//! table that lacks the required columns, which is detected before any call.

use std::collections::HashMap;

use catalog::{
    BatchClassifier, BookRecord, ClassificationResult, ConfigError, DatasetConfig, DatasetError,
    Genre, ItemId, RunReport, Table, GENRE_COLUMN,
};
use tracing::{info, warn};

/// Splits a table into batches, classifies each, and writes the "Genre" column.
pub struct DatasetClassifier<C> {
    classifier: C,
    config: DatasetConfig,
}

impl<C: BatchClassifier> DatasetClassifier<C> {
    /// Creates a merger, rejecting an invalid `config`.
    pub fn new(classifier: C, config: DatasetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { classifier, config })
    }

    /// Returns `table` with a "Genre" column holding one label per row.
    ///
    /// Rows keep their order and every other column is preserved. An existing
    /// "Genre" column is overwritten. Batch, failure, coercion and per-label
    /// counts are added to `report`; the caller stamps its finish time.
    pub async fn classify_dataset(
        &self,
        mut table: Table,
        report: &mut RunReport,
    ) -> Result<Table, DatasetError> {
        let records = table.book_records()?;
        let batches: Vec<&[BookRecord]> = records.chunks(self.config.batch_size).collect();
        let total = batches.len();

        report.rows += records.len();
        report.batches += total;

        let mut collected: Vec<ClassificationResult> = Vec::with_capacity(records.len());
        for (index, batch) in batches.iter().enumerate() {
            let number = index + 1;
            info!(batch = number, total, books = batch.len(), "Processing batch");

            match self.classifier.classify(batch).await {
                Ok(outcome) => {
                    report.coerced_labels += outcome.coerced;
                    collected.extend(outcome.results);
                }
                Err(err) => {
                    warn!(
                        batch = number,
                        error = %err,
                        fallback = %Genre::FALLBACK_UNKNOWN,
                        "Batch failed, marking its books with fallback"
                    );
                    report.failed_batches += 1;
                    collected.extend(batch.iter().map(ClassificationResult::unknown_for));
                }
            }

            if number < total && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        let genres = if collected.is_empty() {
            if !records.is_empty() {
                warn!("No books were classified, labelling every row as fallback");
            }
            vec![Genre::FALLBACK_UNKNOWN; records.len()]
        } else {
            let (genres, unmatched) = merge_results(&records, collected);
            if unmatched > 0 {
                warn!(unmatched, "Rows without a classification were labelled as fallback");
            }
            report.unmatched_rows += unmatched;
            genres
        };

        for genre in &genres {
            report.count_genre(*genre);
        }
        table.set_column(
            GENRE_COLUMN,
            genres.iter().map(|g| g.as_str().to_string()).collect(),
        );
        Ok(table)
    }
}

/// Left-joins `results` onto `records` by id.
///
/// Returns one genre per record plus the number of records that had no
/// result. When the same id appears more than once in `results` the first
/// occurrence wins, so the output always has exactly one entry per record.
fn merge_results(
    records: &[BookRecord],
    results: Vec<ClassificationResult>,
) -> (Vec<Genre>, usize) {
    let mut by_id: HashMap<ItemId, Genre> = HashMap::with_capacity(results.len());
    for result in results {
        by_id.entry(result.id).or_insert(result.genre);
    }

    let mut unmatched = 0;
    let genres = records
        .iter()
        .map(|record| match by_id.get(&record.id) {
            Some(genre) => *genre,
            None => {
                unmatched += 1;
                Genre::FALLBACK_UNKNOWN
            }
        })
        .collect();
    (genres, unmatched)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use catalog::{
        BatchOutcome, ClassifierConfig, ClassifyError, GenerationError, GenerationRequest,
        ModelName, RetryPolicy, RunId, TextGenerator, ITEM_ID_COLUMN,
    };
    use tokio::time::Instant;

    use super::*;
    use crate::LlmBatchClassifier;

    /// Labels each book from a title lookup, `Other` when the title is unknown,
    /// and records the ids of every batch it sees.
    struct LookupClassifier {
        by_title: HashMap<&'static str, Genre>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl LookupClassifier {
        fn new(entries: &[(&'static str, Genre)]) -> Self {
            Self {
                by_title: entries.iter().copied().collect(),
                seen: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl BatchClassifier for LookupClassifier {
        async fn classify(&self, batch: &[BookRecord]) -> Result<BatchOutcome, ClassifyError> {
            self.seen
                .lock()
                .unwrap()
                .push(batch.iter().map(|b| b.id.to_string()).collect());
            Ok(batch
                .iter()
                .map(|b| {
                    let genre = self.by_title.get(b.title.as_str()).copied().unwrap_or(Genre::Other);
                    ClassificationResult::new(b.id.clone(), genre)
                })
                .collect::<Vec<_>>()
                .into())
        }
    }

    /// Always gives up.
    struct FailingClassifier;

    #[async_trait]
    impl BatchClassifier for FailingClassifier {
        async fn classify(&self, _batch: &[BookRecord]) -> Result<BatchOutcome, ClassifyError> {
            Err(ClassifyError::RetriesExhausted {
                attempts: 3,
                last: Box::new(ClassifyError::Generation(GenerationError::Transport {
                    message: "connection refused".to_string(),
                })),
            })
        }
    }

    /// Fails every batch whose first id is listed, otherwise echoes `Mystery`.
    struct PartiallyFailingClassifier {
        fail_starting_at: Vec<&'static str>,
    }

    #[async_trait]
    impl BatchClassifier for PartiallyFailingClassifier {
        async fn classify(&self, batch: &[BookRecord]) -> Result<BatchOutcome, ClassifyError> {
            let first = batch[0].id.as_str();
            if self.fail_starting_at.iter().any(|id| *id == first) {
                return Err(ClassifyError::UnexpectedShape {
                    detail: "simulated".to_string(),
                });
            }
            Ok(batch
                .iter()
                .map(|b| ClassificationResult::new(b.id.clone(), Genre::Mystery))
                .collect::<Vec<_>>()
                .into())
        }
    }

    /// Returns a fixed reply regardless of the batch.
    struct FixedReplyClassifier(Vec<ClassificationResult>);

    #[async_trait]
    impl BatchClassifier for FixedReplyClassifier {
        async fn classify(&self, _batch: &[BookRecord]) -> Result<BatchOutcome, ClassifyError> {
            Ok(self.0.clone().into())
        }
    }

    fn config(batch_size: usize) -> DatasetConfig {
        DatasetConfig {
            batch_size,
            batch_delay: Duration::ZERO,
        }
    }

    fn report() -> RunReport {
        RunReport::start(RunId::new_random(), ModelName::default())
    }

    fn books(n: usize) -> Table {
        let mut table = Table::new(["Item ID", "Title", "Author"]);
        for i in 0..n {
            table.push_row([i.to_string(), format!("Book {i}"), format!("Author {i}")]);
        }
        table
    }

    fn genre_column(table: &Table) -> Vec<&str> {
        table.column(GENRE_COLUMN).unwrap()
    }

    #[tokio::test]
    async fn output_has_one_valid_genre_per_input_row() {
        for rows in 0..8 {
            let merger = DatasetClassifier::new(LookupClassifier::new(&[]), config(3)).unwrap();
            let out = merger.classify_dataset(books(rows), &mut report()).await.unwrap();

            assert_eq!(out.len(), rows);
            for label in genre_column(&out) {
                assert!(Genre::from_label(label).is_some(), "invalid label {label}");
            }
        }
    }

    #[tokio::test]
    async fn batches_follow_row_order_and_size() {
        let classifier = LookupClassifier::new(&[]);
        let merger = DatasetClassifier::new(classifier, config(2)).unwrap();
        let mut report = report();

        merger.classify_dataset(books(5), &mut report).await.unwrap();

        let seen = merger.classifier.seen.lock().unwrap();
        assert_eq!(*seen, vec![vec!["0", "1"], vec!["2", "3"], vec!["4"]]);
        assert_eq!(report.batches, 3);
        assert_eq!(report.rows, 5);
    }

    #[tokio::test]
    async fn labels_are_keyed_by_id() {
        let mut table = Table::new(["Item ID", "Title", "Author", "Shelf"]);
        table.push_row(["a", "Dune", "Frank Herbert", "1"]);
        table.push_row(["b", "Emma", "Jane Austen", "2"]);
        table.push_row(["c", "Salt Fat Acid Heat", "Samin Nosrat", "3"]);

        let classifier =
            LookupClassifier::new(&[("Dune", Genre::SciFi), ("Emma", Genre::Romance)]);
        let merger = DatasetClassifier::new(classifier, config(2)).unwrap();

        let out = merger.classify_dataset(table, &mut report()).await.unwrap();

        assert_eq!(genre_column(&out), vec!["Sci Fi", "Romance", "Other"]);
        assert_eq!(out.column("Shelf").unwrap(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn every_row_is_unknown_when_classifier_always_fails() {
        let merger = DatasetClassifier::new(FailingClassifier, config(4)).unwrap();
        let mut report = report();

        let out = merger.classify_dataset(books(10), &mut report).await.unwrap();

        assert_eq!(out.len(), 10);
        assert!(genre_column(&out).iter().all(|g| *g == "Unknown"));
        assert_eq!(report.failed_batches, 3);
        assert_eq!(report.unknown_rows(), 10);
    }

    #[tokio::test]
    async fn failed_batch_does_not_affect_other_batches() {
        let classifier = PartiallyFailingClassifier {
            fail_starting_at: vec!["2"],
        };
        let merger = DatasetClassifier::new(classifier, config(2)).unwrap();
        let mut report = report();

        let out = merger.classify_dataset(books(6), &mut report).await.unwrap();

        assert_eq!(
            genre_column(&out),
            vec!["Mystery", "Mystery", "Unknown", "Unknown", "Mystery", "Mystery"]
        );
        assert_eq!(report.failed_batches, 1);
    }

    #[tokio::test]
    async fn rows_missing_from_reply_fall_back_and_duplicates_keep_first() {
        let reply = vec![
            ClassificationResult::new("0", Genre::Western),
            ClassificationResult::new("0", Genre::Horror),
            ClassificationResult::new("99", Genre::Thriller),
        ];
        let merger = DatasetClassifier::new(FixedReplyClassifier(reply), config(10)).unwrap();
        let mut report = report();

        let out = merger.classify_dataset(books(2), &mut report).await.unwrap();

        assert_eq!(genre_column(&out), vec!["Western", "Unknown"]);
        assert_eq!(report.unmatched_rows, 1);
    }

    #[tokio::test]
    async fn empty_replies_label_everything_unknown() {
        let merger = DatasetClassifier::new(FixedReplyClassifier(Vec::new()), config(10)).unwrap();

        let out = merger.classify_dataset(books(3), &mut report()).await.unwrap();

        assert_eq!(genre_column(&out), vec!["Unknown"; 3]);
    }

    #[tokio::test]
    async fn empty_table_gets_an_empty_genre_column() {
        let merger = DatasetClassifier::new(FailingClassifier, config(10)).unwrap();
        let mut report = report();

        let out = merger.classify_dataset(books(0), &mut report).await.unwrap();

        assert!(out.is_empty());
        assert_eq!(out.headers().last().map(String::as_str), Some("Genre"));
        assert_eq!(report.batches, 0);
    }

    #[tokio::test]
    async fn missing_column_fails_before_any_call() {
        let classifier = LookupClassifier::new(&[]);
        let merger = DatasetClassifier::new(classifier, config(10)).unwrap();
        let mut table = Table::new(["Item ID", "Title"]);
        table.push_row(["1", "Dune"]);

        let err = merger.classify_dataset(table, &mut report()).await.unwrap_err();

        assert_eq!(
            err,
            DatasetError::MissingColumn {
                column: "Author".to_string()
            }
        );
        assert!(merger.classifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_batches_but_not_after_the_last() {
        let merger = DatasetClassifier::new(
            LookupClassifier::new(&[]),
            DatasetConfig {
                batch_size: 2,
                batch_delay: Duration::from_secs(1),
            },
        )
        .unwrap();

        let started = Instant::now();
        merger.classify_dataset(books(5), &mut report()).await.unwrap();

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(2), "waited {waited:?}");
        assert!(waited < Duration::from_secs(3), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn single_batch_does_not_pause() {
        let merger = DatasetClassifier::new(
            FailingClassifier,
            DatasetConfig {
                batch_size: 10,
                batch_delay: Duration::from_secs(1),
            },
        )
        .unwrap();

        let started = Instant::now();
        merger.classify_dataset(books(4), &mut report()).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn zero_batch_size_is_rejected_at_construction() {
        assert!(DatasetClassifier::new(FailingClassifier, config(0)).is_err());
    }

    // -----------------------------------------------------------------------
    // End to end through the LLM-backed classifier
    // -----------------------------------------------------------------------

    struct CannedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    fn llm_merger(reply: &'static str) -> DatasetClassifier<LlmBatchClassifier<CannedGenerator>> {
        let classifier = LlmBatchClassifier::new(
            CannedGenerator(reply),
            ClassifierConfig {
                retry: RetryPolicy::no_delay(3),
                ..ClassifierConfig::default()
            },
        )
        .unwrap();
        DatasetClassifier::new(classifier, config(500)).unwrap()
    }

    #[tokio::test]
    async fn dune_is_science_fiction() {
        let mut table = Table::new(["Item ID", "Title", "Author"]);
        table.push_row(["1", "Dune", "Frank Herbert"]);

        let merger = llm_merger(r#"[{"item_id":"1","genre":"Sci Fi"}]"#);
        let out = merger.classify_dataset(table, &mut report()).await.unwrap();

        assert_eq!(out.cell(0, ITEM_ID_COLUMN), Some("1"));
        assert_eq!(out.cell(0, GENRE_COLUMN), Some("Sci Fi"));
    }

    #[tokio::test]
    async fn invalid_label_only_affects_its_own_row() {
        let mut table = Table::new(["Item ID", "Title", "Author"]);
        table.push_row(["1", "Dune", "Frank Herbert"]);
        table.push_row(["2", "Gone Girl", "Gillian Flynn"]);

        let merger = llm_merger(
            "```json\n[{\"item_id\":\"1\",\"genre\":\"Sci-Fi\"},{\"item_id\":\"2\",\"genre\":\"Thriller\"}]\n```",
        );
        let mut report = report();
        let out = merger.classify_dataset(table, &mut report).await.unwrap();

        assert_eq!(genre_column(&out), vec!["Unknown", "Thriller"]);
        assert_eq!(report.coerced_labels, 1);
        assert_eq!(report.failed_batches, 0);
    }

    #[tokio::test]
    async fn null_item_id_leaves_other_rows_classified() {
        let mut table = Table::new(["Item ID", "Title", "Author"]);
        table.push_row(["0", "It", "Stephen King"]);
        table.push_row(["1", "Dune", "Frank Herbert"]);

        let merger = llm_merger(
            r#"[{"item_id":"0","genre":"Horror"},{"item_id":null,"genre":"Sci Fi"}]"#,
        );
        let mut report = report();
        let out = merger.classify_dataset(table, &mut report).await.unwrap();

        assert_eq!(genre_column(&out), vec!["Horror", "Unknown"]);
        assert_eq!(report.failed_batches, 0);
        assert_eq!(report.unmatched_rows, 1);
    }

    #[tokio::test]
    async fn unparseable_replies_exhaust_retries_and_fall_back() {
        let merger = llm_merger("I cannot help with that.");
        let mut report = report();

        let out = merger.classify_dataset(books(3), &mut report).await.unwrap();

        assert_eq!(genre_column(&out), vec!["Unknown"; 3]);
        assert_eq!(report.failed_batches, 1);
    }
}
