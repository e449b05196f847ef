//! Classification prompt construction.

use catalog::{BookRecord, ClassifyError, Genre};

const EXAMPLE_INPUT: &str = r#"[
  {"item_id": "101", "title": "The Martian", "author": "Andy Weir"},
  {"item_id": "102", "title": "Sapiens: A Brief History of Humankind", "author": "Yuval Noah Harari"},
  {"item_id": "103", "title": "The Da Vinci Code", "author": "Dan Brown"},
  {"item_id": "104", "title": "A Brief History of Time", "author": "Stephen Hawking"},
  {"item_id": "105", "title": "The Hobbit", "author": "J.R.R. Tolkien"},
  {"item_id": "106", "title": "Becoming", "author": "Michelle Obama"},
  {"item_id": "107", "title": "It", "author": "Stephen King"},
  {"item_id": "108", "title": "The Love Hypothesis", "author": "Ali Hazelwood"},
  {"item_id": "109", "title": "The Lincoln Highway", "author": "Amor Towles"},
  {"item_id": "110", "title": "Redeeming Love", "author": "Francine Rivers"},
  {"item_id": "111", "title": "Lonesome Dove", "author": "Larry McMurtry"},
  {"item_id": "112", "title": "The Mysterious Affair at Styles", "author": "Agatha Christie"}
]"#;

const EXAMPLE_OUTPUT: &str = r#"[
  {"item_id": "101", "genre": "Sci Fi"},
  {"item_id": "102", "genre": "Other"},
  {"item_id": "103", "genre": "Thriller"},
  {"item_id": "104", "genre": "Other"},
  {"item_id": "105", "genre": "Fantasy"},
  {"item_id": "106", "genre": "Biographies/Memoirs"},
  {"item_id": "107", "genre": "Horror"},
  {"item_id": "108", "genre": "Romance"},
  {"item_id": "109", "genre": "Historical Fiction"},
  {"item_id": "110", "genre": "Christian Fiction"},
  {"item_id": "111", "genre": "Western"},
  {"item_id": "112", "genre": "Mystery"}
]"#;

/// Builds the full prompt asking the model to classify `batch`.
///
/// The batch is embedded as a pretty-printed JSON array of
/// `{item_id, title, author}` objects after the rules and a worked example.
pub fn build_prompt(batch: &[BookRecord]) -> Result<String, ClassifyError> {
    let books = serde_json::to_string_pretty(batch).map_err(ClassifyError::Serialise)?;

    let allowed = Genre::ALLOWED
        .iter()
        .map(|g| g.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let fiction = Genre::FALLBACK_FICTION;
    let non_fiction = Genre::FALLBACK_NON_FICTION;
    let unknown = Genre::FALLBACK_UNKNOWN;

    Ok(format!(
        "You are an expert book genre classifier.
Your task is to classify each book in the provided list into ONE of the following genres:
{allowed}.

Follow these rules strictly:
1. If none of the listed genre names are applicable but the book is clearly a work of fiction, assign \"{fiction}\".
2. If the book is not a work of fiction (e.g., textbook, self-help, technical manual, cookbook), assign \"{non_fiction}\".
3. If you do not have enough information from the title and author to confidently classify, or if the item doesn't seem like a book, assign \"{unknown}\".
4. You MUST ONLY use the provided genre names or the specified fallback options. Do not invent new genres.
5. Respond with a JSON list of objects. Each object must have an \"item_id\" (matching the input) and a \"genre\" key.

Example input format (you will receive a list of books like this):
{EXAMPLE_INPUT}

Example JSON output for the above:
{EXAMPLE_OUTPUT}

Classify the following books:
{books}
"
    ))
}
