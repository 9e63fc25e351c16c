//! Catalog management service

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookSummary, CreateBook, UpdateBook},
        copy::{BookCopy, CopyStatus, CopyStatusUpdate},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get book by ID with full details
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// List all books with derived copy counts
    pub async fn list_books(&self) -> AppResult<Vec<BookSummary>> {
        self.repository.books.list().await
    }

    /// Create a book together with its initial copies
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        let book = self.repository.books.create(&data).await?;
        tracing::info!(
            "Catalog create: book id={} with {} copies",
            book.id,
            book.copies.len()
        );
        Ok(book)
    }

    /// Update book fields and/or resize its copy pool
    pub async fn update_book(&self, id: i32, data: UpdateBook) -> AppResult<Book> {
        self.repository.books.update(id, &data).await
    }

    /// Append new Available copies to a book
    pub async fn add_copies(&self, book_id: i32, quantity: i32) -> AppResult<Vec<BookCopy>> {
        self.repository.books.add_copies(book_id, quantity).await
    }

    /// Direct copy-status change (the loan return path bypasses this)
    pub async fn update_copy_status(
        &self,
        copy_id: i32,
        new_status: CopyStatus,
    ) -> AppResult<CopyStatusUpdate> {
        self.repository
            .books
            .update_copy_status(copy_id, new_status)
            .await
    }

    /// Copies filtered by status
    pub async fn copies_by_status(&self, status: CopyStatus) -> AppResult<Vec<BookCopy>> {
        self.repository.books.copies_by_status(status).await
    }

    /// Delete a book and its copies (refused while a copy is out on loan)
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Catalog delete: book id={}", id);
        Ok(())
    }

    /// Delete a single copy after checking it belongs to the book
    pub async fn delete_copy(&self, book_id: i32, copy_id: i32) -> AppResult<()> {
        self.repository.books.delete_copy(book_id, copy_id).await
    }
}
