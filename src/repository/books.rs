//! Books repository: catalog rows plus the per-copy availability ledger.
//!
//! Copy counts (`nb_copies`, `nb_available`) are always computed from the
//! live `book_copies` rows with correlated subqueries; nothing is cached on
//! the book row.

use sqlx::{Pool, Postgres};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookSummary, CreateBook, UpdateBook},
        copy::{BookCopy, CopyStatus, CopyStatusUpdate, TransitionCheck},
        loan::LoanStatus,
    },
};

const SUMMARY_SELECT: &str = r#"
SELECT b.id, b.title, b.author, b.category, b.publication_year, b.created_at,
       COALESCE((SELECT COUNT(*) FROM book_copies c WHERE c.book_id = b.id), 0) AS nb_copies,
       COALESCE((SELECT COUNT(*) FROM book_copies c WHERE c.book_id = b.id AND c.status = 0), 0) AS nb_available
FROM books b
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID with its copies loaded
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        if id <= 0 {
            return Err(AppError::InvalidId(format!("Invalid book id {}", id)));
        }
        let mut book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::BookNotFound(format!("Book with id {} not found", id)))?;

        book.copies = self.get_copies(id).await?;
        Ok(book)
    }

    /// All copies of a book, oldest first
    pub async fn get_copies(&self, book_id: i32) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(
            "SELECT * FROM book_copies WHERE book_id = $1 ORDER BY acquired_at, id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Get a single copy by ID
    pub async fn get_copy(&self, copy_id: i32) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>("SELECT * FROM book_copies WHERE id = $1")
            .bind(copy_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::BookCopyNotFound(format!("Book copy with id {} not found", copy_id))
            })
    }

    /// List all books with derived copy counts
    pub async fn list(&self) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} ORDER BY b.title, b.id", SUMMARY_SELECT);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Newest books first, for the dashboard
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} ORDER BY b.created_at DESC, b.id DESC LIMIT $1", SUMMARY_SELECT);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Books with at least one Borrowed copy
    pub async fn borrowed(&self) -> AppResult<Vec<BookSummary>> {
        let query = format!(
            "{} WHERE EXISTS (SELECT 1 FROM book_copies c WHERE c.book_id = b.id AND c.status = $1) ORDER BY b.title, b.id",
            SUMMARY_SELECT
        );
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(CopyStatus::Borrowed as i16)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// All copies currently in the given status
    pub async fn copies_by_status(&self, status: CopyStatus) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(
            "SELECT * FROM book_copies WHERE status = $1 ORDER BY book_id, id",
        )
        .bind(i16::from(status))
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// All copies that cannot be lent right now (anything but Available)
    pub async fn unavailable_copies(&self) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(
            "SELECT * FROM book_copies WHERE status <> $1 ORDER BY book_id, id",
        )
        .bind(CopyStatus::Available as i16)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Create a book together with `quantity` Available copies.
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        if data.quantity < 1 {
            return Err(AppError::InvalidQuantity(format!(
                "Cannot create a book with {} copies",
                data.quantity
            )));
        }
        data.validate()?;

        let mut tx = self.pool.begin().await?;

        let mut book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, category, publisher, publication_year, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.category)
        .bind(&data.publisher)
        .bind(data.publication_year)
        .bind(&data.description)
        .fetch_one(&mut *tx)
        .await?;

        let copies = sqlx::query_as::<_, BookCopy>(
            r#"
            INSERT INTO book_copies (book_id, status)
            SELECT $1, $2 FROM generate_series(1, $3)
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(CopyStatus::Available as i16)
        .bind(data.quantity)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        book.copies = copies;
        Ok(book)
    }

    /// Append `quantity` new Available copies to an existing book.
    pub async fn add_copies(&self, book_id: i32, quantity: i32) -> AppResult<Vec<BookCopy>> {
        if book_id <= 0 {
            return Err(AppError::InvalidId(format!("Invalid book id {}", book_id)));
        }
        if quantity < 1 {
            return Err(AppError::InvalidQuantity(format!(
                "Cannot add {} copies",
                quantity
            )));
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::BookNotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }

        let copies = sqlx::query_as::<_, BookCopy>(
            r#"
            INSERT INTO book_copies (book_id, status)
            SELECT $1, $2 FROM generate_series(1, $3)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(CopyStatus::Available as i16)
        .bind(quantity)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Update book fields; a supplied quantity grows or shrinks the copy pool.
    ///
    /// Shrinking draws exclusively from Available copies; asking for a
    /// reduction larger than the Available pool removes nothing and is
    /// rejected as InvalidCopiesQuantity.
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        if id <= 0 {
            return Err(AppError::InvalidId(format!("Invalid book id {}", id)));
        }
        data.validate()?;
        if let Some(q) = data.quantity {
            if q < 1 {
                return Err(AppError::InvalidQuantity(format!(
                    "A book must keep at least one copy, got {}",
                    q
                )));
            }
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::BookNotFound(format!(
                "Book with id {} not found",
                id
            )));
        }

        let mut tx = self.pool.begin().await?;

        let mut sets = Vec::new();
        let mut idx = 1;

        macro_rules! add_f {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_f!(data.title, "title");
        add_f!(data.author, "author");
        add_f!(data.category, "category");
        add_f!(data.publisher, "publisher");
        add_f!(data.publication_year, "publication_year");
        add_f!(data.description, "description");
        let _ = idx;

        if !sets.is_empty() {
            let query = format!("UPDATE books SET {} WHERE id = {}", sets.join(", "), id);
            let mut builder = sqlx::query(&query);

            macro_rules! bind_f {
                ($field:expr) => {
                    if let Some(ref val) = $field {
                        builder = builder.bind(val);
                    }
                };
            }

            bind_f!(data.title);
            bind_f!(data.author);
            bind_f!(data.category);
            bind_f!(data.publisher);
            if let Some(year) = data.publication_year {
                builder = builder.bind(year);
            }
            bind_f!(data.description);

            builder.execute(&mut *tx).await?;
        }

        if let Some(target) = data.quantity {
            let target = target as i64;
            let current: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM book_copies WHERE book_id = $1")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;

            if target > current {
                sqlx::query(
                    r#"
                    INSERT INTO book_copies (book_id, status)
                    SELECT $1, $2 FROM generate_series(1, $3)
                    "#,
                )
                .bind(id)
                .bind(CopyStatus::Available as i16)
                .bind(target - current)
                .execute(&mut *tx)
                .await?;
            } else if target < current {
                let available: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM book_copies WHERE book_id = $1 AND status = $2",
                )
                .bind(id)
                .bind(CopyStatus::Available as i16)
                .fetch_one(&mut *tx)
                .await?;

                let reduction = current - target;
                if available < reduction {
                    // Never removes borrowed/reserved copies to satisfy a shrink.
                    return Err(AppError::InvalidCopiesQuantity(format!(
                        "Cannot remove {} copies from book {}: only {} available",
                        reduction, id, available
                    )));
                }

                sqlx::query(
                    r#"
                    DELETE FROM book_copies WHERE id IN (
                        SELECT id FROM book_copies
                        WHERE book_id = $1 AND status = $2
                        ORDER BY acquired_at DESC, id DESC
                        LIMIT $3
                    )
                    "#,
                )
                .bind(id)
                .bind(CopyStatus::Available as i16)
                .bind(reduction)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Change a copy's status through the direct path.
    ///
    /// Same-status writes report NoChange; Borrowed copies refuse the move
    /// to Available (that flip belongs to the loan return path).
    pub async fn update_copy_status(
        &self,
        copy_id: i32,
        new_status: CopyStatus,
    ) -> AppResult<CopyStatusUpdate> {
        if copy_id <= 0 {
            return Err(AppError::InvalidId(format!("Invalid copy id {}", copy_id)));
        }
        let copy = self.get_copy(copy_id).await?;

        match CopyStatus::from(copy.status).check_transition(new_status) {
            TransitionCheck::NoChange => Ok(CopyStatusUpdate::NoChange(copy)),
            TransitionCheck::Rejected => Err(AppError::InvalidStatusTransition(format!(
                "Copy {} is borrowed; it becomes available through the loan return",
                copy_id
            ))),
            TransitionCheck::Allowed => {
                let updated = sqlx::query_as::<_, BookCopy>(
                    "UPDATE book_copies SET status = $1 WHERE id = $2 RETURNING *",
                )
                .bind(i16::from(new_status))
                .bind(copy_id)
                .fetch_one(&self.pool)
                .await?;
                Ok(CopyStatusUpdate::Updated(updated))
            }
        }
    }

    /// Delete a book and its copies.
    ///
    /// Refused while any of its copies is tied to an InProgress loan.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if id <= 0 {
            return Err(AppError::InvalidId(format!("Invalid book id {}", id)));
        }
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::BookNotFound(format!(
                "Book with id {} not found",
                id
            )));
        }

        let has_open_loan: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans l
                JOIN book_copies c ON l.book_copy_id = c.id
                WHERE c.book_id = $1 AND l.status = $2
            )
            "#,
        )
        .bind(id)
        .bind(LoanStatus::InProgress as i16)
        .fetch_one(&self.pool)
        .await?;
        if has_open_loan {
            return Err(AppError::CannotDelete(format!(
                "Book {} has a copy out on an in-progress loan",
                id
            )));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM book_copies WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Delete a single copy, verifying it belongs to the given book.
    pub async fn delete_copy(&self, book_id: i32, copy_id: i32) -> AppResult<()> {
        if book_id <= 0 {
            return Err(AppError::InvalidId(format!("Invalid book id {}", book_id)));
        }
        if copy_id <= 0 {
            return Err(AppError::InvalidId(format!("Invalid copy id {}", copy_id)));
        }

        let copy = self.get_copy(copy_id).await?;
        if copy.book_id != book_id {
            return Err(AppError::CopyNotInBook(format!(
                "Copy {} belongs to book {}, not book {}",
                copy_id, copy.book_id, book_id
            )));
        }

        sqlx::query("DELETE FROM book_copies WHERE id = $1")
            .bind(copy_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
