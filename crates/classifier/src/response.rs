//! Parsing and validation of the model's classification reply.
//!
//! The reply must be a JSON array of objects each carrying `item_id` and
//! `genre`. Structural problems are errors (and get the batch retried); a
//! genre outside the vocabulary is not, and is coerced to [`Genre::Unknown`].
//! An `item_id` of any JSON type is accepted and compared as text, so an odd
//! id only leaves its own row unmatched.

use catalog::{ClassificationResult, ClassifyError, Genre, ItemId};
use serde_json::Value;
use tracing::warn;

/// Results parsed from one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// One result per object in the reply, in reply order.
    pub results: Vec<ClassificationResult>,
    /// How many genres were outside the vocabulary and replaced by `Unknown`.
    pub coerced: usize,
}

/// Removes a surrounding markdown code fence (```` ```json ```` or ```` ``` ````).
///
/// Text without a leading fence is returned trimmed but otherwise unchanged.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses a raw reply into classification results.
pub fn parse_reply(raw: &str) -> Result<ParsedReply, ClassifyError> {
    let value: Value =
        serde_json::from_str(strip_code_fence(raw)).map_err(ClassifyError::MalformedJson)?;

    let Value::Array(items) = value else {
        return Err(ClassifyError::UnexpectedShape {
            detail: format!("expected a JSON array, got {}", kind_of(&value)),
        });
    };

    let mut results = Vec::with_capacity(items.len());
    let mut coerced = 0;

    for (index, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(ClassifyError::UnexpectedShape {
                detail: format!("element {index} is {}, not an object", kind_of(item)),
            });
        };

        let Some(raw_id) = fields.get("item_id") else {
            return Err(ClassifyError::UnexpectedShape {
                detail: format!("element {index} is missing item_id"),
            });
        };
        let id = item_id_from(raw_id);

        let Some(raw_genre) = fields.get("genre") else {
            return Err(ClassifyError::UnexpectedShape {
                detail: format!("element {index} is missing genre"),
            });
        };

        let genre = match raw_genre.as_str().and_then(Genre::from_label) {
            Some(genre) => genre,
            None => {
                warn!(
                    item_id = %id,
                    genre = %raw_genre,
                    fallback = %Genre::FALLBACK_UNKNOWN,
                    "Unexpected genre in reply, replacing with fallback"
                );
                coerced += 1;
                Genre::FALLBACK_UNKNOWN
            }
        };

        results.push(ClassificationResult::new(id, genre));
    }

    Ok(ParsedReply { results, coerced })
}

/// Renders any JSON value as an id. Strings are taken verbatim; anything else
/// uses its JSON text, so a `null` id becomes `"null"` and simply matches no row.
fn item_id_from(value: &Value) -> ItemId {
    match value {
        Value::String(s) => ItemId::new(s.as_str()),
        other => ItemId::new(other.to_string()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"[{"item_id": "1", "genre": "Sci Fi"}, {"item_id": "2", "genre": "Romance"}]"#;

    #[test]
    fn fenced_reply_parses_like_plain_reply() {
        let fenced = format!("```json\n{PLAIN}\n```");
        assert_eq!(parse_reply(&fenced).unwrap(), parse_reply(PLAIN).unwrap());

        let bare_fence = format!("  ```\n{PLAIN}\n```  \n");
        assert_eq!(parse_reply(&bare_fence).unwrap(), parse_reply(PLAIN).unwrap());
    }

    #[test]
    fn strip_code_fence_leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("  [1, 2]\n"), "[1, 2]");
        assert_eq!(strip_code_fence("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("```json\n[]"), "[]");
    }

    #[test]
    fn invalid_genre_is_coerced_without_touching_neighbours() {
        let reply = r#"[
            {"item_id": "1", "genre": "Sci-Fi"},
            {"item_id": "2", "genre": "Mystery"}
        ]"#;
        let parsed = parse_reply(reply).unwrap();

        assert_eq!(parsed.coerced, 1);
        assert_eq!(
            parsed.results,
            vec![
                ClassificationResult::new("1", Genre::Unknown),
                ClassificationResult::new("2", Genre::Mystery),
            ]
        );
    }

    #[test]
    fn non_string_genre_is_coerced() {
        let parsed = parse_reply(r#"[{"item_id": "1", "genre": null}]"#).unwrap();
        assert_eq!(parsed.results[0].genre, Genre::Unknown);
        assert_eq!(parsed.coerced, 1);
    }

    #[test]
    fn numeric_item_ids_are_accepted() {
        let parsed = parse_reply(r#"[{"item_id": 17, "genre": "Western"}]"#).unwrap();
        assert_eq!(parsed.results[0].id.as_str(), "17");
    }

    #[test]
    fn non_string_item_ids_do_not_reject_the_reply() {
        let parsed = parse_reply(
            r#"[
                {"item_id": "0", "genre": "Horror"},
                {"item_id": null, "genre": "Horror"},
                {"item_id": true, "genre": "Mystery"},
                {"item_id": [1], "genre": "Romance"}
            ]"#,
        )
        .unwrap();

        let ids: Vec<&str> = parsed.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "null", "true", "[1]"]);
        assert_eq!(parsed.results[0].genre, Genre::Horror);
        assert_eq!(parsed.coerced, 0);
    }

    #[test]
    fn missing_item_id_is_rejected() {
        let err = parse_reply(r#"[{"genre": "Horror"}]"#).unwrap_err();
        assert!(matches!(err, ClassifyError::UnexpectedShape { .. }));
    }

    #[test]
    fn fallback_labels_are_valid_replies() {
        let parsed = parse_reply(
            r#"[{"item_id": "1", "genre": "Literary Fiction"}, {"item_id": "2", "genre": "Other"}]"#,
        )
        .unwrap();
        assert_eq!(parsed.coerced, 0);
        assert_eq!(parsed.results[1].genre, Genre::Other);
    }

    #[test]
    fn object_reply_is_rejected() {
        let err = parse_reply(r#"{"item_id": "1", "genre": "Horror"}"#).unwrap_err();
        assert!(matches!(err, ClassifyError::UnexpectedShape { .. }));
    }

    #[test]
    fn missing_genre_is_rejected() {
        let err = parse_reply(r#"[{"item_id": "1"}]"#).unwrap_err();
        assert!(matches!(err, ClassifyError::UnexpectedShape { .. }));
    }

    #[test]
    fn non_object_element_is_rejected() {
        let err = parse_reply(r#"[{"item_id": "1", "genre": "Horror"}, "Horror"]"#).unwrap_err();
        assert!(matches!(err, ClassifyError::UnexpectedShape { .. }));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = parse_reply("Here are your genres: [").unwrap_err();
        assert!(matches!(err, ClassifyError::MalformedJson(_)));
    }

    #[test]
    fn empty_array_is_a_valid_reply() {
        let parsed = parse_reply("[]").unwrap();
        assert!(parsed.results.is_empty());
    }
}
