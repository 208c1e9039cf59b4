//! The in-memory catalogue.
//!
//! [`BookStore`] is a plain ordered `Vec<Book>` with the catalogue's rules on
//! top: ids are unique, updates keep a book's position, deletes keep everyone
//! else's. It knows nothing about locking; handlers share it as a
//! [`SharedStore`], which makes each operation atomic with respect to the rest.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::Book;

/// The store as handlers share it. Reads run concurrently; each write holds
/// the lock for exactly one operation.
pub type SharedStore = Arc<RwLock<BookStore>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Book with id {0} already exists")]
    DuplicateId(String),

    #[error("Book with id {0} not found")]
    NotFound(String),
}

/// Books in insertion order. Lookups are linear; the catalogue is small.
#[derive(Debug, Default)]
pub struct BookStore {
    books: Vec<Book>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn list(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn insert(&mut self, book: Book) -> Result<(), StoreError> {
        if self.find_by_id(&book.id).is_some() {
            return Err(StoreError::DuplicateId(book.id));
        }
        self.books.push(book);
        Ok(())
    }

    /// Replaces the book with the same id, keeping its position.
    pub fn update(&mut self, book: Book) -> Result<(), StoreError> {
        match self.books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book;
                Ok(())
            }
            None => Err(StoreError::NotFound(book.id)),
        }
    }

    /// Removes and returns the book with `id`; the rest keep their order.
    pub fn delete(&mut self, id: &str) -> Result<Book, StoreError> {
        let pos = self.books.iter()
            .position(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        Ok(self.books.remove(pos))
    }
}
