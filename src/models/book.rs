//! Book (catalog entry) model and related types.
//!
//! A book owns zero or more physical copies; availability counts are always
//! derived from the live copy rows, never stored on the book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::copy::BookCopy;

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i16>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Populated by the repository after the row fetch.
    #[sqlx(skip)]
    #[serde(default)]
    pub copies: Vec<BookCopy>,
}

impl Book {
    /// Count of Available copies, derived from the loaded copy collection.
    pub fn available_copies(&self) -> usize {
        self.copies
            .iter()
            .filter(|c| c.status == super::copy::CopyStatus::Available as i16)
            .count()
    }
}

/// Compact book listing with derived copy counts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub publication_year: Option<i16>,
    pub created_at: DateTime<Utc>,
    /// Total copies (computed, never stored)
    pub nb_copies: i64,
    /// Copies currently Available (computed, never stored)
    pub nb_available: i64,
}

/// Create book request. `quantity` physical copies are allocated with it.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub category: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 1000, max = 2100, message = "Implausible publication year"))]
    pub publication_year: Option<i16>,
    pub description: Option<String>,
    pub quantity: i32,
}

/// Update book request. A supplied `quantity` grows or shrinks the copy pool;
/// shrinking only ever draws from Available copies.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 1000, max = 2100, message = "Implausible publication year"))]
    pub publication_year: Option<i16>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
}
