//! Shared value types for the genre classification domain.
//!
//! [`BookRecord`] is the unit of input, [`ClassificationResult`] the unit of
//! output. Both serialise to the field names the generation service sees
//! (`item_id`, `title`, `author`, `genre`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Genre, ItemId};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One book to classify, taken from a single table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Value of the "Item ID" column.
    #[serde(rename = "item_id")]
    pub id: ItemId,

    /// Value of the "Title" column.
    pub title: String,

    /// Value of the "Author" column.
    pub author: String,
}

impl BookRecord {
    /// Creates a [`BookRecord`].
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
        }
    }
}

// ---------------------------------------------------------------------------

/// The genre assigned to one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Identifier of the [`BookRecord`] this result belongs to.
    #[serde(rename = "item_id")]
    pub id: ItemId,

    /// Assigned label; always a member of [`Genre::ALL`].
    pub genre: Genre,
}

impl ClassificationResult {
    /// Creates a [`ClassificationResult`].
    pub fn new(id: impl Into<ItemId>, genre: Genre) -> Self {
        Self {
            id: id.into(),
            genre,
        }
    }

    /// Creates a result carrying [`Genre::FALLBACK_UNKNOWN`] for `record`.
    pub fn unknown_for(record: &BookRecord) -> Self {
        Self::new(record.id.clone(), Genre::FALLBACK_UNKNOWN)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
