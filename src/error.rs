//! Error types for the Lectern core

use serde::Serialize;
use thiserror::Error;

/// Stable status codes exposed to callers (the HTTP layer maps these to
/// response codes). One closed enumeration covering both operation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    NullObject = 3,
    NotFound = 4,
    InvalidId = 5,
    InvalidQuantity = 6,
    InvalidCopiesQuantity = 7,
    BookNotFound = 8,
    BookCopyNotFound = 9,
    BookCopyDoesNotBelongToBook = 10,
    InvalidStatusTransition = 11,
    NoChange = 12,
    CannotDelete = 13,
    InvalidStatus = 14,
    InvalidReturnDate = 15,
    InvalidDate = 16,
    BookNotAvailable = 17,
    BadValue = 18,
}

/// Main application error type.
///
/// Business-rule violations are ordinary values of this enum; infrastructure
/// failures surface through the `Database` variant and propagate with `?`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Book copy not found: {0}")]
    BookCopyNotFound(String),

    #[error("Book copy does not belong to book: {0}")]
    CopyNotInBook(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid copies quantity: {0}")]
    InvalidCopiesQuantity(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid status transition: {0}")]
    InvalidStatusTransition(String),

    #[error("Invalid return date: {0}")]
    InvalidReturnDate(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Book not available: {0}")]
    BookNotAvailable(String),

    #[error("Cannot delete: {0}")]
    CannotDelete(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable code for the caller-facing enumeration.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::BookNotFound(_) => ErrorCode::BookNotFound,
            AppError::BookCopyNotFound(_) => ErrorCode::BookCopyNotFound,
            AppError::CopyNotInBook(_) => ErrorCode::BookCopyDoesNotBelongToBook,
            AppError::InvalidId(_) => ErrorCode::InvalidId,
            AppError::InvalidQuantity(_) => ErrorCode::InvalidQuantity,
            AppError::InvalidCopiesQuantity(_) => ErrorCode::InvalidCopiesQuantity,
            AppError::InvalidStatus(_) => ErrorCode::InvalidStatus,
            AppError::InvalidStatusTransition(_) => ErrorCode::InvalidStatusTransition,
            AppError::InvalidReturnDate(_) => ErrorCode::InvalidReturnDate,
            AppError::InvalidDate(_) => ErrorCode::InvalidDate,
            AppError::BookNotAvailable(_) => ErrorCode::BookNotAvailable,
            AppError::CannotDelete(_) => ErrorCode::CannotDelete,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Serializable error body handed to the transport layer.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = err.code();
        if let AppError::Database(e) = err {
            tracing::error!("Database error: {:?}", e);
        }
        ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message: err.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
