//! Operations on an in-memory collection of books.
//!
//! All lookups are linear scans by exact `book_id` equality.
//! Every operation leaves the collection untouched when it fails.

use serde_json::Value;

use super::{Book, BookPatch};

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("Book with id `{id}` not found")]
    NotFound { id: String },
    #[error("Invalid book data, missing or empty fields: {}", missing.join(", "))]
    Invalid { missing: Vec<&'static str> },
    #[error("Book with id `{id}` already exists")]
    Conflict { id: String },
}

fn position(books: &[Book], id: &str) -> Result<usize, BookError> {
    books
        .iter()
        .position(|book| book.book_id() == Some(id))
        .ok_or_else(|| BookError::NotFound { id: id.to_string() })
}

pub fn find_by_id<'a>(books: &'a [Book], id: &str) -> Result<&'a Book, BookError> {
    let index = position(books, id)?;

    Ok(&books[index])
}

/// Appends `candidate` to the collection.
///
/// Required fields are checked before uniqueness of `book_id`.
/// Only scalar ids can conflict, array or object ids are never equal to another record's.
pub fn create(books: &mut Vec<Book>, candidate: Book) -> Result<Book, BookError> {
    let missing = candidate.missing_required_fields();
    if !missing.is_empty() {
        return Err(BookError::Invalid { missing });
    }

    let candidate_id = candidate.raw_book_id().filter(|id| is_scalar(id));
    if candidate_id.is_some() && books.iter().any(|book| book.raw_book_id() == candidate_id) {
        return Err(BookError::Conflict {
            id: candidate_id.map(display_id).unwrap_or_default(),
        });
    }

    books.push(candidate.clone());

    Ok(candidate)
}

/// Shallow-merges `patch` over the book with `id`, in place.
///
/// Nothing is re-validated, `patch` may even replace `book_id`.
pub fn update(books: &mut [Book], id: &str, patch: BookPatch) -> Result<Book, BookError> {
    let index = position(books, id)?;

    let book = &mut books[index];
    book.merge(patch);

    Ok(book.clone())
}

/// Removes the first book with `id`.
pub fn remove(books: &mut Vec<Book>, id: &str) -> Result<Book, BookError> {
    let index = position(books, id)?;

    Ok(books.remove(index))
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn display_id(id: &Value) -> String {
    match id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn book(value: Value) -> Book {
        Book::from_value(value).expect("Not an object")
    }

    fn patch(value: Value) -> BookPatch {
        serde_json::from_value(value).expect("Not an object")
    }

    fn valid(id: &str) -> Book {
        book(json!({
            "book_id": id,
            "title": "T",
            "author": "A",
            "genre": "G",
            "year": 2000,
            "copies": 3,
        }))
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().filter_map(Book::book_id).collect()
    }

    #[test]
    fn find_returns_first_match() {
        let mut second = valid("b1");
        second.merge(patch(json!({"title": "Second"})));
        let books = vec![valid("b0"), valid("b1"), second];

        let found = find_by_id(&books, "b1").expect("Book not found");
        assert_eq!(found.get("title"), Some(&json!("T")));
    }

    #[test]
    fn find_unknown_id() {
        let books = vec![valid("b1")];

        assert!(matches!(
            find_by_id(&books, "b2"),
            Err(BookError::NotFound { id }) if id == "b2"
        ));
    }

    #[test]
    fn find_does_not_coerce_numeric_ids() {
        let books = vec![book(json!({"book_id": 1}))];

        assert!(find_by_id(&books, "1").is_err());
    }

    #[test]
    fn create_appends_and_keeps_extra_fields() {
        let mut books = vec![valid("b0")];
        let mut candidate = valid("b1");
        candidate.merge(patch(json!({"isbn": "978-0-316-76948-0"})));

        let created = create(&mut books, candidate.clone()).expect("Create failed");

        assert_eq!(created, candidate);
        assert_eq!(ids(&books), vec!["b0", "b1"]);
        assert_eq!(books[1].get("isbn"), Some(&json!("978-0-316-76948-0")));
    }

    #[test]
    fn create_rejects_each_missing_field() {
        for field in crate::book::REQUIRED_FIELDS {
            let mut fields = valid("b1").into_fields();
            fields.remove(field);

            let mut books = Vec::new();
            let result = create(&mut books, Book::new(fields));

            assert!(
                matches!(&result, Err(BookError::Invalid { missing }) if missing == &vec![field]),
                "expected `{field}` to be reported, got {result:?}"
            );
            assert!(books.is_empty());
        }
    }

    #[test]
    fn create_rejects_falsy_field() {
        let mut candidate = valid("b1");
        candidate.merge(patch(json!({"copies": 0})));

        let mut books = Vec::new();
        assert!(matches!(
            create(&mut books, candidate),
            Err(BookError::Invalid { .. })
        ));
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let mut books = vec![valid("b1")];

        assert!(matches!(
            create(&mut books, valid("b1")),
            Err(BookError::Conflict { id }) if id == "b1"
        ));
        assert_eq!(books.len(), 1);
    }

    #[test]
    fn numeric_ids_conflict_by_value() {
        let mut first = valid("b1");
        first.merge(patch(json!({"book_id": 7})));
        let mut books = vec![first.clone()];

        assert!(matches!(
            create(&mut books, first),
            Err(BookError::Conflict { id }) if id == "7"
        ));
    }

    #[test]
    fn structured_ids_never_conflict() {
        let mut candidate = valid("b1");
        candidate.merge(patch(json!({"book_id": {"isbn": "978-0-316-76948-0"}})));
        let mut books = vec![candidate.clone()];

        create(&mut books, candidate).expect("Create failed");

        assert_eq!(books.len(), 2);
    }

    #[test]
    fn validation_wins_over_conflict() {
        let mut books = vec![valid("b1")];

        assert!(matches!(
            create(&mut books, book(json!({"book_id": "b1"}))),
            Err(BookError::Invalid { .. })
        ));
    }

    #[test]
    fn update_merges_in_place() {
        let mut books = vec![valid("b0"), valid("b1"), valid("b2")];

        let updated = update(&mut books, "b1", patch(json!({"copies": 5, "shelf": "A4"})))
            .expect("Update failed");

        assert_eq!(updated.get("copies"), Some(&json!(5)));
        assert_eq!(updated.get("title"), Some(&json!("T")));
        assert_eq!(updated.get("shelf"), Some(&json!("A4")));
        assert_eq!(books[1], updated);
        assert_eq!(ids(&books), vec!["b0", "b1", "b2"]);
    }

    #[test]
    fn update_does_not_revalidate() {
        let mut books = vec![valid("b1")];

        let updated =
            update(&mut books, "b1", patch(json!({"title": ""}))).expect("Update failed");

        assert_eq!(updated.get("title"), Some(&json!("")));
    }

    #[test]
    fn update_unknown_id() {
        let mut books = vec![valid("b1")];

        assert!(matches!(
            update(&mut books, "b2", patch(json!({"copies": 5}))),
            Err(BookError::NotFound { .. })
        ));
        assert_eq!(books, vec![valid("b1")]);
    }

    #[test]
    fn remove_first_match_only() {
        let mut books = vec![valid("b1"), valid("b2"), valid("b1")];

        let removed = remove(&mut books, "b1").expect("Remove failed");

        assert_eq!(removed, valid("b1"));
        assert_eq!(ids(&books), vec!["b2", "b1"]);
    }

    #[test]
    fn remove_unknown_id() {
        let mut books = vec![valid("b1")];

        assert!(remove(&mut books, "b2").is_err());
        assert_eq!(books.len(), 1);
    }
}
