//! Genrefy classification orchestration.
//!
//! This crate provides the LLM-backed batch classifier (prompt construction,
//! reply parsing, bounded retries) and the dataset merger that drives it over a
//! whole table.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Components sequence calls between the domain types
//! in [`catalog`] and the [`catalog::TextGenerator`] port. They know nothing
//! about HTTP or files.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`prompt`] | Classification prompt text |
//! | [`response`] | Code-fence stripping, reply validation, genre coercion |
//! | [`batch`] | [`LlmBatchClassifier`], one batch with retries |
//! | [`dataset`] | [`DatasetClassifier`], batching and merging a table |

pub mod batch;
pub mod dataset;
pub mod prompt;
pub mod response;

pub use batch::LlmBatchClassifier;
pub use dataset::DatasetClassifier;
pub use prompt::build_prompt;
pub use response::{parse_reply, strip_code_fence, ParsedReply};
