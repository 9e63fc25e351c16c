//! Events repository

use sqlx::{Pool, Postgres};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::event::{CreateEvent, Event, UpdateEvent},
};

#[derive(Clone)]
pub struct EventsRepository {
    pool: Pool<Postgres>,
}

impl EventsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All events, upcoming first
    pub async fn list(&self) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY starts_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    /// Events the sweep has not retired yet
    pub async fn list_active(&self) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE is_active ORDER BY starts_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    /// Get event by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Event> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }

    /// Create an event
    pub async fn create(&self, data: &CreateEvent) -> AppResult<Event> {
        data.validate()?;
        if data.ends_at <= data.starts_at {
            return Err(AppError::InvalidDate(
                "Event must end after it starts".to_string(),
            ));
        }

        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, event_type, location, description, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(data.event_type.unwrap_or(0))
        .bind(&data.location)
        .bind(&data.description)
        .bind(data.starts_at)
        .bind(data.ends_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    /// Update an event
    pub async fn update(&self, id: i32, data: &UpdateEvent) -> AppResult<Event> {
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
        add_f!(data.event_type, "event_type");
        add_f!(data.location, "location");
        add_f!(data.description, "description");
        add_f!(data.starts_at, "starts_at");
        add_f!(data.ends_at, "ends_at");
        add_f!(data.is_active, "is_active");
        let _ = idx;

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE events SET {} WHERE id = {} RETURNING *",
            sets.join(", "),
            id
        );
        let mut builder = sqlx::query_as::<_, Event>(&query);

        macro_rules! bind_f {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_f!(data.title);
        if let Some(t) = data.event_type {
            builder = builder.bind(t);
        }
        bind_f!(data.location);
        bind_f!(data.description);
        if let Some(d) = data.starts_at {
            builder = builder.bind(d);
        }
        if let Some(d) = data.ends_at {
            builder = builder.bind(d);
        }
        if let Some(a) = data.is_active {
            builder = builder.bind(a);
        }

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }

    /// Delete an event
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        Ok(())
    }

    /// Retire events whose end has passed; returns how many were flipped.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE events SET is_active = FALSE WHERE is_active AND ends_at < NOW()")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
