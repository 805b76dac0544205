use std::path::{Path, PathBuf};

use axum::async_trait;
use uuid::Uuid;

use crate::book::Book;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read books from `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse books from `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize books: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Failed to write books to `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads and saves the whole book collection at once.
#[async_trait]
pub trait BookStorage: Send + Sync {
    /// Reads the entire collection.
    async fn load(&self) -> Result<Vec<Book>, StorageError>;

    /// Overwrites the entire collection.
    async fn save(&self, books: &[Book]) -> Result<(), StorageError>;
}

/// Stores the collection as a pretty-printed JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Initializes the file with an empty collection if it does not exist yet.
    #[tracing::instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn ensure_exists(&self) -> Result<(), StorageError> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|source| StorageError::Read {
                path: self.path.clone(),
                source,
            })?;

        if !exists {
            tracing::info!("Data file not found, creating an empty one");

            self.save(&[]).await?;
        }

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "books".to_string());

        self.path
            .with_file_name(format!(".{file_name}-{}.tmp", Uuid::new_v4()))
    }
}

#[async_trait]
impl BookStorage for JsonFileStorage {
    #[tracing::instrument(skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<Book>, StorageError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StorageError::Read {
                path: self.path.clone(),
                source,
            })?;

        let books: Vec<Book> =
            serde_json::from_str(&content).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;

        tracing::trace!(count = books.len(), "Loaded");

        Ok(books)
    }

    #[tracing::instrument(skip_all, fields(path = %self.path.display()))]
    async fn save(&self, books: &[Book]) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(books).map_err(StorageError::Serialize)?;

        // Write next to the target so the rename stays on one filesystem.
        let temp_path = self.temp_path();

        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|source| StorageError::Write {
                path: temp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;

            return Err(StorageError::Write {
                path: self.path.clone(),
                source,
            });
        }

        tracing::trace!(count = books.len(), "Saved");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn book(value: serde_json::Value) -> Book {
        Book::from_value(value).expect("Not an object")
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage = JsonFileStorage::new(dir.path().join("data.json"));

        let books = vec![
            book(json!({"book_id": "b2", "title": "T", "extra": {"nested": [1, 2]}})),
            book(json!({"book_id": "b1", "year": "1951", "copies": 3})),
        ];

        storage.save(&books).await.expect("Save failed");
        let loaded = storage.load().await.expect("Load failed");

        assert_eq!(loaded, books);
        let keys: Vec<_> = loaded[0].fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["book_id", "title", "extra"]);
    }

    #[tokio::test]
    async fn saves_with_two_space_indentation() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("data.json");
        let storage = JsonFileStorage::new(&path);

        storage
            .save(&[book(json!({"book_id": "b1"}))])
            .await
            .expect("Save failed");

        let content = std::fs::read_to_string(&path).expect("Failed to read file");
        assert_eq!(content, "[\n  {\n    \"book_id\": \"b1\"\n  }\n]");
    }

    #[tokio::test]
    async fn save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage = JsonFileStorage::new(dir.path().join("data.json"));

        storage.save(&[]).await.expect("Save failed");
        storage
            .save(&[book(json!({"book_id": "b1"}))])
            .await
            .expect("Save failed");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("Failed to read dir")
            .map(|entry| entry.expect("Bad entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("data.json")]);
    }

    #[tokio::test]
    async fn load_missing_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage = JsonFileStorage::new(dir.path().join("missing.json"));

        assert!(matches!(
            storage.load().await,
            Err(StorageError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn load_invalid_json() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ not json").expect("Failed to write file");

        assert!(matches!(
            JsonFileStorage::new(path).load().await,
            Err(StorageError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn save_into_missing_directory() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage = JsonFileStorage::new(dir.path().join("nope").join("data.json"));

        assert!(matches!(
            storage.save(&[]).await,
            Err(StorageError::Write { .. })
        ));
    }

    #[tokio::test]
    async fn ensure_exists_creates_empty_collection_once() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage = JsonFileStorage::new(dir.path().join("data.json"));

        storage.ensure_exists().await.expect("Init failed");
        assert!(storage.load().await.expect("Load failed").is_empty());

        storage
            .save(&[book(json!({"book_id": "b1"}))])
            .await
            .expect("Save failed");
        storage.ensure_exists().await.expect("Init failed");

        assert_eq!(storage.load().await.expect("Load failed").len(), 1);
    }
}
