//! Loan management service

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, UpdateLoan},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get loans for a user
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<Loan>> {
        self.repository.loans.get_user_loans(user_id).await
    }

    /// Create a new loan (always starts Pending).
    ///
    /// The referenced book must exist; the availability check is a separate
    /// query the caller sequences explicitly.
    pub async fn create_loan(&self, data: CreateLoan) -> AppResult<Loan> {
        self.repository.books.get_by_id(data.book_id).await?;
        self.repository.loans.create(&data).await
    }

    /// Update a loan's return date and/or status
    pub async fn update_loan(&self, id: i32, data: UpdateLoan) -> AppResult<Loan> {
        self.repository.loans.update(id, &data).await
    }

    /// Close an in-progress loan and release its copy
    pub async fn register_return(&self, id: i32) -> AppResult<Loan> {
        let loan = self.repository.loans.register_return(id).await?;
        tracing::info!("Loan {} returned, copy released", id);
        Ok(loan)
    }

    /// Push an in-progress loan's due date further out
    pub async fn extend_loan(&self, id: i32, new_date: DateTime<Utc>) -> AppResult<Loan> {
        self.repository.loans.extend(id, new_date).await
    }

    /// Delete a resolved loan
    pub async fn delete_loan(&self, id: i32) -> AppResult<()> {
        self.repository.loans.delete(id).await
    }

    /// Book-level availability query
    pub async fn is_book_available(&self, book_id: i32) -> AppResult<bool> {
        self.repository.loans.is_book_available(book_id).await
    }

    /// Like `is_book_available`, but reported as a status for callers that
    /// want the refusal as data.
    pub async fn ensure_book_available(&self, book_id: i32) -> AppResult<()> {
        if self.repository.loans.is_book_available(book_id).await? {
            Ok(())
        } else {
            Err(AppError::BookNotAvailable(format!(
                "Book {} already has a loan in progress",
                book_id
            )))
        }
    }

    /// Count loans currently in progress
    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.loans.count_active().await
    }

    /// Count open loans past their due date
    pub async fn count_overdue(&self) -> AppResult<i64> {
        self.repository.loans.count_overdue().await
    }
}
