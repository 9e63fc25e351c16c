//! Book copy (physical volume) model and the status ledger rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ErrorCode;

/// Availability status of a single physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum CopyStatus {
    Available = 0,
    Borrowed = 1,
    Reserved = 2,
    UnderMaintenance = 3,
    Lost = 4,
    Damaged = 5,
    Archived = 6,
    NotAvailable = 7,
}

impl From<i16> for CopyStatus {
    fn from(v: i16) -> Self {
        match v {
            0 => CopyStatus::Available,
            1 => CopyStatus::Borrowed,
            2 => CopyStatus::Reserved,
            3 => CopyStatus::UnderMaintenance,
            4 => CopyStatus::Lost,
            5 => CopyStatus::Damaged,
            6 => CopyStatus::Archived,
            _ => CopyStatus::NotAvailable,
        }
    }
}

impl From<CopyStatus> for i16 {
    fn from(s: CopyStatus) -> Self {
        s as i16
    }
}

impl Default for CopyStatus {
    fn default() -> Self {
        CopyStatus::Available
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CopyStatus::Available => "Available",
            CopyStatus::Borrowed => "Borrowed",
            CopyStatus::Reserved => "Reserved",
            CopyStatus::UnderMaintenance => "Under maintenance",
            CopyStatus::Lost => "Lost",
            CopyStatus::Damaged => "Damaged",
            CopyStatus::Archived => "Archived",
            CopyStatus::NotAvailable => "Not available",
        };
        write!(f, "{}", label)
    }
}

/// Verdict on a requested direct status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    Allowed,
    NoChange,
    Rejected,
}

impl CopyStatus {
    /// Ledger rule for direct status writes: a same-status write is a no-op,
    /// and a Borrowed copy only becomes Available through the loan return
    /// path. Every other pair is accepted as-is.
    pub fn check_transition(self, next: CopyStatus) -> TransitionCheck {
        if self == next {
            TransitionCheck::NoChange
        } else if self == CopyStatus::Borrowed && next == CopyStatus::Available {
            TransitionCheck::Rejected
        } else {
            TransitionCheck::Allowed
        }
    }
}

/// Physical copy row. `status` holds the raw smallint code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookCopy {
    pub id: i32,
    pub book_id: i32,
    pub status: i16,
    pub acquired_at: DateTime<Utc>,
}

/// Outcome of a direct copy-status update. A no-op is not an error but is
/// reported distinctly from an applied change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "copy", rename_all = "snake_case")]
pub enum CopyStatusUpdate {
    Updated(BookCopy),
    NoChange(BookCopy),
}

impl CopyStatusUpdate {
    pub fn code(&self) -> ErrorCode {
        match self {
            CopyStatusUpdate::Updated(_) => ErrorCode::Success,
            CopyStatusUpdate::NoChange(_) => ErrorCode::NoChange,
        }
    }

    pub fn copy(&self) -> &BookCopy {
        match self {
            CopyStatusUpdate::Updated(c) | CopyStatusUpdate::NoChange(c) => c,
        }
    }
}
