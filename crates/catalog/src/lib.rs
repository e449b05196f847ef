//! Core domain for Genrefy.
//!
//! This crate contains every domain concept, newtype identifier, configuration
//! structure, and error type used to classify a book table into genres.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ItemId`, `RunId`, `ModelName`) |
//! | [`genres`] | The closed `Genre` vocabulary and its fallback labels |
//! | [`types`] | `BookRecord`, `ClassificationResult`, `Timestamp` |
//! | [`table`] | The in-memory `Table` and its well-known column names |
//! | [`config`] | `ClassifierConfig`, `DatasetConfig`, `RetryPolicy` |
//! | [`errors`] | Service, classification, dataset and configuration errors |
//! | [`ports`] | `TextGenerator` and `BatchClassifier` traits, `BatchOutcome` |
//! | [`report`] | `RunReport` counters for one run |

pub mod config;
pub mod errors;
pub mod genres;
pub mod identifiers;
pub mod ports;
pub mod report;
pub mod table;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{Backoff, ClassifierConfig, DatasetConfig, RetryPolicy};
pub use errors::{ClassifyError, ConfigError, DatasetError, GenerationError};
pub use genres::{Genre, UnknownGenreLabel};
pub use identifiers::{ItemId, ModelName, RunId};
pub use ports::{BatchClassifier, BatchOutcome, GenerationRequest, TextGenerator};
pub use report::RunReport;
pub use table::{Table, AUTHOR_COLUMN, GENRE_COLUMN, ITEM_ID_COLUMN, TITLE_COLUMN};
pub use types::{BookRecord, ClassificationResult, Timestamp};
