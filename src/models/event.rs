//! Library event model (lectures, exhibitions, reading groups)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Event type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum EventType {
    Lecture = 0,
    Exhibition = 1,
    ReadingGroup = 2,
    Workshop = 3,
    BookSale = 4,
    Other = 5,
}

impl From<i16> for EventType {
    fn from(v: i16) -> Self {
        match v {
            0 => EventType::Lecture,
            1 => EventType::Exhibition,
            2 => EventType::ReadingGroup,
            3 => EventType::Workshop,
            4 => EventType::BookSale,
            _ => EventType::Other,
        }
    }
}

impl From<EventType> for i16 {
    fn from(e: EventType) -> Self {
        e as i16
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EventType::Lecture => "Lecture",
            EventType::Exhibition => "Exhibition",
            EventType::ReadingGroup => "Reading group",
            EventType::Workshop => "Workshop",
            EventType::BookSale => "Book sale",
            EventType::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

/// Event record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i32,
    pub title: String,
    /// Type (0=lecture, 1=exhibition, 2=reading_group, 3=workshop, 4=book_sale, 5=other)
    pub event_type: i16,
    pub location: Option<String>,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Cleared by the periodic sweep once `ends_at` has passed.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Create event request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEvent {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub event_type: Option<i16>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Update event request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub event_type: Option<i16>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}
