//! Dashboard service: read-side composition of catalog, loan and event views.
//!
//! No business rules live here; each field is the underlying query's result
//! packaged verbatim.

use serde::Serialize;

use crate::{
    error::AppResult,
    models::{book::BookSummary, copy::BookCopy, event::Event},
    repository::Repository,
};

/// Aggregated dashboard payload
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub recent_books: Vec<BookSummary>,
    pub books: Vec<BookSummary>,
    pub borrowed_books: Vec<BookSummary>,
    pub unavailable_copies: Vec<BookCopy>,
    pub active_events: Vec<Event>,
    pub active_loans: i64,
    pub overdue_loans: i64,
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
    recent_books: i64,
}

impl DashboardService {
    pub fn new(repository: Repository, recent_books: i64) -> Self {
        Self {
            repository,
            recent_books,
        }
    }

    /// Gather the dashboard in one pass
    pub async fn overview(&self) -> AppResult<DashboardResponse> {
        let recent_books = self.repository.books.recent(self.recent_books).await?;
        let books = self.repository.books.list().await?;
        let borrowed_books = self.repository.books.borrowed().await?;
        let unavailable_copies = self.repository.books.unavailable_copies().await?;
        let active_events = self.repository.events.list_active().await?;
        let active_loans = self.repository.loans.count_active().await?;
        let overdue_loans = self.repository.loans.count_overdue().await?;

        Ok(DashboardResponse {
            recent_books,
            books,
            borrowed_books,
            unavailable_copies,
            active_events,
            active_loans,
            overdue_loans,
        })
    }
}
