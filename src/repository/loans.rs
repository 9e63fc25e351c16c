//! Loans repository: borrow transactions and their lifecycle transitions.
//!
//! Closing a loan and releasing its copy happen in one transaction; nothing
//! else coordinates the loan and copy status machines (callers sequence the
//! two, matching the original behavior).

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        copy::{BookCopy, CopyStatus},
        loan::{return_date_acceptable, CreateLoan, Loan, LoanStatus, UpdateLoan},
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// All loans, newest first
    pub async fn list(&self) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans ORDER BY loan_date DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    /// Loans for a user, newest first
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE user_id = $1 ORDER BY loan_date DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Create a new loan. Always starts Pending, whatever the caller sent.
    pub async fn create(&self, data: &CreateLoan) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, librarian_id, book_copy_id, loan_date, return_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.book_id)
        .bind(data.librarian_id)
        .bind(data.book_copy_id)
        .bind(data.loan_date)
        .bind(data.return_date)
        .bind(LoanStatus::Pending as i16)
        .fetch_one(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Update a loan's return date and/or status.
    ///
    /// Settled loans (Finished, Canceled) only flip into each other. A past
    /// return date is rejected unless the resulting status is Finished. When
    /// the resulting status is Finished, the linked copy is flipped back to
    /// Available in the same transaction; a loan with no linked copy aborts
    /// the whole update with BookNotFound.
    pub async fn update(&self, id: i32, data: &UpdateLoan) -> AppResult<Loan> {
        let loan = self.get_by_id(id).await?;
        let current = LoanStatus::from(loan.status);
        let requested = data.status.map(LoanStatus::from).unwrap_or(current);

        if !current.accepts(requested) {
            return Err(AppError::InvalidStatusTransition(format!(
                "Loan {} cannot move from {} to {}",
                id, current, requested
            )));
        }

        if let Some(rd) = data.return_date {
            if !return_date_acceptable(rd, requested, Utc::now()) {
                return Err(AppError::InvalidReturnDate(
                    "A past return date is only accepted when closing the loan".to_string(),
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET return_date = COALESCE($1, return_date),
                status = $2,
                book_copy_id = COALESCE($3, book_copy_id)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(data.return_date)
        .bind(i16::from(requested))
        .bind(data.book_copy_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if requested == LoanStatus::Finished {
            self.release_copy(&mut tx, id).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Close an in-progress loan: status Finished, return date now, copy
    /// released. Any other current status is refused.
    pub async fn register_return(&self, id: i32) -> AppResult<Loan> {
        let loan = self.get_by_id(id).await?;
        let current = LoanStatus::from(loan.status);
        if current != LoanStatus::InProgress {
            return Err(AppError::InvalidStatus(format!(
                "Loan {} is {}; only loans in progress can be returned",
                id, current
            )));
        }

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $1, return_date = $2 WHERE id = $3 RETURNING *",
        )
        .bind(LoanStatus::Finished as i16)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        self.release_copy(&mut tx, id).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Push an in-progress loan's due date further out.
    pub async fn extend(&self, id: i32, new_date: DateTime<Utc>) -> AppResult<Loan> {
        let loan = self.get_by_id(id).await?;
        let current = LoanStatus::from(loan.status);
        if current != LoanStatus::InProgress {
            return Err(AppError::InvalidStatus(format!(
                "Loan {} is {}; only loans in progress can be extended",
                id, current
            )));
        }
        if new_date <= loan.return_date {
            return Err(AppError::InvalidDate(format!(
                "New return date must be after {}",
                loan.return_date
            )));
        }

        let updated = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET return_date = $1 WHERE id = $2 RETURNING *",
        )
        .bind(new_date)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    /// Delete a resolved loan. Pending and InProgress loans are kept.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let loan = self.get_by_id(id).await?;
        let status = LoanStatus::from(loan.status);
        if matches!(status, LoanStatus::Pending | LoanStatus::InProgress) {
            return Err(AppError::CannotDelete(format!(
                "Loan {} is still {}; resolve it before deleting",
                id, status
            )));
        }

        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Book-level availability: a book with any InProgress loan against it is
    /// not available for new loans. Independent of the copy-status ledger.
    pub async fn is_book_available(&self, book_id: i32) -> AppResult<bool> {
        let in_progress: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND status = $2)",
        )
        .bind(book_id)
        .bind(LoanStatus::InProgress as i16)
        .fetch_one(&self.pool)
        .await?;
        Ok(!in_progress)
    }

    /// Count loans currently in progress
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status = $1")
            .bind(LoanStatus::InProgress as i16)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count open loans past their due date
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE (status = $1 AND return_date < NOW()) OR status = $2",
        )
        .bind(LoanStatus::InProgress as i16)
        .bind(LoanStatus::Overdue as i16)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Flip the copy linked to a loan back to Available, inside the caller's
    /// transaction. A loan without a copy fails the whole unit of work.
    async fn release_copy(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        loan_id: i32,
    ) -> AppResult<BookCopy> {
        let copy = sqlx::query_as::<_, BookCopy>(
            r#"
            SELECT c.* FROM book_copies c
            JOIN loans l ON l.book_copy_id = c.id
            WHERE l.id = $1
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::BookNotFound(format!("No book copy is linked to loan {}", loan_id))
        })?;

        sqlx::query("UPDATE book_copies SET status = $1 WHERE id = $2")
            .bind(CopyStatus::Available as i16)
            .bind(copy.id)
            .execute(&mut **tx)
            .await?;

        Ok(copy)
    }
}
