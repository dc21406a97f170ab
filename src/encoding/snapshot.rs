//! Snapshot document codec

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::entity::{Entity, Kind};

const AUTHORS_KEY: &str = "authors";
const BOOKS_KEY: &str = "books";

/// Decoded contents of a backing file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub authors: BTreeMap<String, Entity>,
    pub books: BTreeMap<String, Entity>,
    /// Collections that were absent or malformed and loaded empty
    pub skipped: Vec<Kind>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    authors: Vec<(&'a String, &'a Entity)>,
    books: Vec<(&'a String, &'a Entity)>,
}

/// Serialize both collections into the snapshot document
pub fn encode(
    authors: &BTreeMap<String, Entity>,
    books: &BTreeMap<String, Entity>,
) -> Result<Vec<u8>, serde_json::Error> {
    let doc = SnapshotRef {
        authors: authors.iter().collect(),
        books: books.iter().collect(),
    };
    serde_json::to_vec(&doc)
}

/// Parse a snapshot document.
///
/// Only a document that is not a JSON object at all is an error. Each
/// collection is decoded on its own: if its value is missing, is not an
/// array, or holds anything other than `[id, object]` pairs, that collection
/// comes back empty and is listed in [`Snapshot::skipped`].
pub fn decode(bytes: &[u8]) -> Result<Snapshot, DecodeError> {
    let doc: Value = serde_json::from_slice(bytes).map_err(|_| DecodeError::NotJson)?;
    let Value::Object(mut doc) = doc else {
        return Err(DecodeError::NotAnObject);
    };

    let mut snapshot = Snapshot::default();
    match decode_collection(doc.remove(AUTHORS_KEY)) {
        Some(authors) => snapshot.authors = authors,
        None => snapshot.skipped.push(Kind::Authors),
    }
    match decode_collection(doc.remove(BOOKS_KEY)) {
        Some(books) => snapshot.books = books,
        None => snapshot.skipped.push(Kind::Books),
    }
    Ok(snapshot)
}

fn decode_collection(value: Option<Value>) -> Option<BTreeMap<String, Entity>> {
    let pairs: Vec<(String, Value)> = serde_json::from_value(value?).ok()?;

    let mut entries = BTreeMap::new();
    for (id, value) in pairs {
        let Value::Object(object) = value else {
            return None;
        };
        // The pair key is authoritative
        entries.insert(id.clone(), Entity::from_object(id, object));
    }
    Some(entries)
}

/// Errors that make a whole snapshot unusable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Content is not valid JSON
    #[error("snapshot is not valid JSON")]
    NotJson,
    /// Content is JSON but not an object
    #[error("snapshot is not a JSON object")]
    NotAnObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> (BTreeMap<String, Entity>, BTreeMap<String, Entity>) {
        let mut authors = BTreeMap::new();
        authors.insert("a1".to_string(), Entity::new("a1").with("name", "Ada"));
        let mut books = BTreeMap::new();
        let notes = Entity::new("b1")
            .with("title", "Notes")
            .with("authorId", "a1");
        books.insert("b1".to_string(), notes);
        (authors, books)
    }

    #[test]
    fn test_encode_layout() {
        let (authors, books) = sample();
        let bytes = encode(&authors, &books).unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            doc,
            json!({
                "authors": [["a1", {"id": "a1", "name": "Ada"}]],
                "books": [["b1", {"id": "b1", "title": "Notes", "authorId": "a1"}]],
            })
        );
    }

    #[test]
    fn test_encode_empty() {
        let bytes = encode(&BTreeMap::new(), &BTreeMap::new()).unwrap();
        assert_eq!(bytes, br#"{"authors":[],"books":[]}"#);
    }

    #[test]
    fn test_decode_encoded() {
        let (authors, books) = sample();
        let snapshot = decode(&encode(&authors, &books).unwrap()).unwrap();

        assert_eq!(snapshot.authors, authors);
        assert_eq!(snapshot.books, books);
        assert!(snapshot.skipped.is_empty());
    }

    #[test]
    fn test_decode_collection_not_an_array() {
        let snapshot = decode(br#"{"authors": "not-an-array"}"#).unwrap();

        assert!(snapshot.authors.is_empty());
        assert!(snapshot.books.is_empty());
        assert_eq!(snapshot.skipped, vec![Kind::Authors, Kind::Books]);
    }

    #[test]
    fn test_decode_keeps_valid_collection() {
        let doc = json!({
            "authors": [["a1", "not-an-object"]],
            "books": [["b1", {"id": "b1", "title": "Dune"}]],
        });
        let snapshot = decode(doc.to_string().as_bytes()).unwrap();

        assert!(snapshot.authors.is_empty());
        assert_eq!(snapshot.books.len(), 1);
        assert_eq!(snapshot.skipped, vec![Kind::Authors]);
    }

    #[test]
    fn test_decode_rejects_bad_pairs() {
        let doc = json!({"authors": [["a1"]], "books": [["b1", {}, "extra"]]});
        let snapshot = decode(doc.to_string().as_bytes()).unwrap();

        assert!(snapshot.authors.is_empty());
        assert!(snapshot.books.is_empty());
        assert_eq!(snapshot.skipped.len(), 2);
    }

    #[test]
    fn test_decode_pair_key_wins() {
        let doc = json!({
            "authors": [["a1", {"name": "Ada"}], ["a2", {"id": "zz", "name": "Bo"}]],
            "books": [],
        });
        let snapshot = decode(doc.to_string().as_bytes()).unwrap();

        assert_eq!(snapshot.authors["a1"].id, "a1");
        assert_eq!(snapshot.authors["a2"].id, "a2");
    }

    #[test]
    fn test_decode_ignores_non_string_entity_id() {
        let doc = json!({
            "authors": [
                ["a1", {"id": "a1", "name": "Ada"}],
                ["a2", {"id": null, "name": "Bo"}],
                ["a3", {"id": 5}],
            ],
            "books": [],
        });
        let snapshot = decode(doc.to_string().as_bytes()).unwrap();

        assert!(snapshot.skipped.is_empty());
        assert_eq!(snapshot.authors.len(), 3);
        assert_eq!(snapshot.authors["a1"], Entity::new("a1").with("name", "Ada"));
        assert_eq!(snapshot.authors["a2"], Entity::new("a2").with("name", "Bo"));
        assert_eq!(snapshot.authors["a3"], Entity::new("a3"));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode(b""), Err(DecodeError::NotJson));
        assert_eq!(decode(b"{garbage"), Err(DecodeError::NotJson));
        assert_eq!(decode(b"[1, 2]"), Err(DecodeError::NotAnObject));
    }
}
