//! Loan (borrow transaction) model and lifecycle rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Loan lifecycle status.
///
/// A loan starts Pending, is moved to InProgress when the copy is handed
/// over, and ends at Finished or Canceled. Overdue is a bookkeeping status
/// set on open loans past their due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum LoanStatus {
    Pending = 0,
    InProgress = 1,
    Finished = 2,
    Canceled = 3,
    Overdue = 4,
}

impl From<i16> for LoanStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => LoanStatus::InProgress,
            2 => LoanStatus::Finished,
            3 => LoanStatus::Canceled,
            4 => LoanStatus::Overdue,
            _ => LoanStatus::Pending,
        }
    }
}

impl From<LoanStatus> for i16 {
    fn from(s: LoanStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Pending => "Pending",
            LoanStatus::InProgress => "In progress",
            LoanStatus::Finished => "Finished",
            LoanStatus::Canceled => "Canceled",
            LoanStatus::Overdue => "Overdue",
        };
        write!(f, "{}", label)
    }
}

impl LoanStatus {
    /// True once the loan has reached one of the two settled states.
    pub fn is_settled(self) -> bool {
        matches!(self, LoanStatus::Finished | LoanStatus::Canceled)
    }

    /// Transition rule: Finished and Canceled only flip into each other;
    /// every other current state accepts any requested status.
    pub fn accepts(self, requested: LoanStatus) -> bool {
        match self {
            LoanStatus::Finished => requested == LoanStatus::Canceled,
            LoanStatus::Canceled => requested == LoanStatus::Finished,
            _ => true,
        }
    }
}

/// A return date in the past is only accepted when the loan is being closed
/// at the same time.
pub fn return_date_acceptable(
    return_date: DateTime<Utc>,
    resulting_status: LoanStatus,
    now: DateTime<Utc>,
) -> bool {
    return_date >= now || resulting_status == LoanStatus::Finished
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub librarian_id: i32,
    /// Set once a specific copy has been handed over; released on return.
    pub book_copy_id: Option<i32>,
    pub loan_date: DateTime<Utc>,
    /// Due date while the loan is open; actual return timestamp once Finished.
    pub return_date: DateTime<Utc>,
    pub status: i16,
}

/// Create loan request. The supplied status is ignored: every loan starts
/// Pending.
#[derive(Debug, Deserialize)]
pub struct CreateLoan {
    pub user_id: i32,
    pub book_id: i32,
    pub librarian_id: i32,
    pub book_copy_id: Option<i32>,
    pub loan_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub status: Option<i16>,
}

/// Update loan request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLoan {
    pub return_date: Option<DateTime<Utc>>,
    pub status: Option<i16>,
    pub book_copy_id: Option<i32>,
}
