use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

pub mod ops;

pub use ops::BookError;

/// Fields every book must carry with a truthy value when it is created.
pub const REQUIRED_FIELDS: [&str; 6] = ["book_id", "title", "author", "genre", "year", "copies"];

/// A single book record.
///
/// Books have no fixed schema beyond [`REQUIRED_FIELDS`].
/// Any additional fields are kept verbatim and in their original order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Book(Map<String, Value>);

impl Book {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns `None` if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// The `book_id` of this book, if it is a string.
    pub fn book_id(&self) -> Option<&str> {
        self.0.get("book_id").and_then(Value::as_str)
    }

    /// The raw `book_id` value, whatever its type.
    pub fn raw_book_id(&self) -> Option<&Value> {
        self.0.get("book_id")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Required fields that are absent or falsy.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|field| !self.0.get(*field).map(is_truthy).unwrap_or(false))
            .collect()
    }

    /// Overlays every field of `patch` on this book.
    ///
    /// Existing fields keep their position, new fields are appended.
    pub fn merge(&mut self, patch: BookPatch) {
        for (field, value) in patch.0 {
            self.0.insert(field, value);
        }
    }
}

/// Partial book sent with an update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct BookPatch(Map<String, Value>);

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn book(value: Value) -> Book {
        Book::from_value(value).expect("Not an object")
    }

    #[test]
    fn only_objects_are_books() {
        assert!(Book::from_value(json!([1, 2])).is_none());
        assert!(Book::from_value(json!("b1")).is_none());
        assert!(Book::from_value(json!({})).is_some());
    }

    #[test]
    fn falsy_values() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));

        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn reports_missing_and_falsy_required_fields() {
        let book = book(json!({
            "book_id": "b1",
            "title": "",
            "author": "A",
            "year": 0,
            "copies": "3",
        }));

        assert_eq!(book.missing_required_fields(), vec!["title", "genre", "year"]);
    }

    #[test]
    fn merge_keeps_field_order() {
        let mut book = book(json!({"book_id": "b1", "title": "T", "copies": 3}));
        let patch: BookPatch =
            serde_json::from_value(json!({"shelf": "A4", "copies": 5})).expect("Invalid patch");

        book.merge(patch);

        let keys: Vec<_> = book.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["book_id", "title", "copies", "shelf"]);
        assert_eq!(book.get("copies"), Some(&json!(5)));
    }

    #[test]
    fn string_book_id_only() {
        assert_eq!(book(json!({"book_id": "b1"})).book_id(), Some("b1"));
        assert_eq!(book(json!({"book_id": 1})).book_id(), None);
        assert_eq!(book(json!({"book_id": 1})).raw_book_id(), Some(&json!(1)));
    }
}
