//! The closed genre vocabulary.
//!
//! Ten named genres plus three reserved fallback labels. The service is told to
//! use these exact strings; anything else it returns is coerced to
//! [`Genre::Unknown`] by the response parser.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A genre label that may appear in the output "Genre" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Genre {
    Romance,
    SciFi,
    Fantasy,
    HistoricalFiction,
    Horror,
    BiographiesMemoirs,
    Mystery,
    Western,
    ChristianFiction,
    Thriller,
    /// Fallback for works of fiction that match none of the named genres.
    LiteraryFiction,
    /// Fallback for non-fiction (textbooks, self-help, cookbooks, manuals).
    Other,
    /// Fallback when classification is not possible or failed outright.
    Unknown,
}

impl Genre {
    /// The named genres, in the order they are presented to the model.
    pub const ALLOWED: [Genre; 10] = [
        Genre::Romance,
        Genre::SciFi,
        Genre::Fantasy,
        Genre::HistoricalFiction,
        Genre::Horror,
        Genre::BiographiesMemoirs,
        Genre::Mystery,
        Genre::Western,
        Genre::ChristianFiction,
        Genre::Thriller,
    ];

    /// Fallback for fiction outside the named genres.
    pub const FALLBACK_FICTION: Genre = Genre::LiteraryFiction;

    /// Fallback for non-fiction.
    pub const FALLBACK_NON_FICTION: Genre = Genre::Other;

    /// Fallback for anything that could not be classified.
    pub const FALLBACK_UNKNOWN: Genre = Genre::Unknown;

    /// Every label that may appear in the output, named genres first.
    pub const ALL: [Genre; 13] = [
        Genre::Romance,
        Genre::SciFi,
        Genre::Fantasy,
        Genre::HistoricalFiction,
        Genre::Horror,
        Genre::BiographiesMemoirs,
        Genre::Mystery,
        Genre::Western,
        Genre::ChristianFiction,
        Genre::Thriller,
        Genre::LiteraryFiction,
        Genre::Other,
        Genre::Unknown,
    ];

    /// Returns the exact label string used on the wire and in the output table.
    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci Fi",
            Genre::Fantasy => "Fantasy",
            Genre::HistoricalFiction => "Historical Fiction",
            Genre::Horror => "Horror",
            Genre::BiographiesMemoirs => "Biographies/Memoirs",
            Genre::Mystery => "Mystery",
            Genre::Western => "Western",
            Genre::ChristianFiction => "Christian Fiction",
            Genre::Thriller => "Thriller",
            Genre::LiteraryFiction => "Literary Fiction",
            Genre::Other => "Other",
            Genre::Unknown => "Unknown",
        }
    }

    /// Returns `true` for the three reserved fallback labels.
    pub fn is_fallback(self) -> bool {
        matches!(self, Genre::LiteraryFiction | Genre::Other | Genre::Unknown)
    }

    /// Looks up a label by its exact, case-sensitive string.
    pub fn from_label(label: &str) -> Option<Genre> {
        Genre::ALL.into_iter().find(|genre| genre.as_str() == label)
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Genre::from_str`] for a string outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a recognised genre label")]
pub struct UnknownGenreLabel(pub String);

impl FromStr for Genre {
    type Err = UnknownGenreLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::from_label(s).ok_or_else(|| UnknownGenreLabel(s.to_string()))
    }
}

impl Serialize for Genre {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Genre {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}
