use tokio::sync::RwLock;

use crate::{
    book::{ops, Book, BookError, BookPatch},
    storage::{BookStorage, StorageError},
};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Book(#[from] BookError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The only way to reach the stored books.
///
/// Every operation reloads the whole collection from storage.
/// Mutations hold the write lock across load, change and save, so two
/// concurrent writers never overwrite each other's changes.
pub struct BookRepository {
    storage: Box<dyn BookStorage>,
    lock: RwLock<()>,
}

impl BookRepository {
    pub fn new<S: BookStorage + 'static>(storage: S) -> Self {
        Self {
            storage: Box::new(storage),
            lock: RwLock::new(()),
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        let _guard = self.lock.read().await;

        Ok(self.storage.load().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Book, RepositoryError> {
        let _guard = self.lock.read().await;

        let books = self.storage.load().await?;
        let book = ops::find_by_id(&books, id)?;

        Ok(book.clone())
    }

    #[tracing::instrument(skip_all)]
    pub async fn create(&self, candidate: Book) -> Result<Book, RepositoryError> {
        let _guard = self.lock.write().await;

        let mut books = self.storage.load().await?;
        let created = ops::create(&mut books, candidate)?;
        self.storage.save(&books).await?;

        tracing::debug!(book_id = ?created.raw_book_id(), "Created");

        Ok(created)
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: BookPatch) -> Result<Book, RepositoryError> {
        let _guard = self.lock.write().await;

        let mut books = self.storage.load().await?;
        let updated = ops::update(&mut books, id, patch)?;

        if updated.book_id() != Some(id) {
            tracing::warn!(new_book_id = ?updated.raw_book_id(), "Update changed the book id");
        }

        self.storage.save(&books).await?;

        tracing::debug!("Updated");

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<Book, RepositoryError> {
        let _guard = self.lock.write().await;

        let mut books = self.storage.load().await?;
        let removed = ops::remove(&mut books, id)?;
        self.storage.save(&books).await?;

        tracing::debug!("Removed");

        Ok(removed)
    }
}
