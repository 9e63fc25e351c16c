//! Events service and the periodic expiry sweep

use std::time::Duration;

use crate::{
    error::AppResult,
    models::event::{CreateEvent, Event, UpdateEvent},
    repository::Repository,
};

#[derive(Clone)]
pub struct EventsService {
    repository: Repository,
}

impl EventsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_events(&self) -> AppResult<Vec<Event>> {
        self.repository.events.list().await
    }

    pub async fn list_active_events(&self) -> AppResult<Vec<Event>> {
        self.repository.events.list_active().await
    }

    pub async fn get_event(&self, id: i32) -> AppResult<Event> {
        self.repository.events.get_by_id(id).await
    }

    pub async fn create_event(&self, data: CreateEvent) -> AppResult<Event> {
        self.repository.events.create(&data).await
    }

    pub async fn update_event(&self, id: i32, data: UpdateEvent) -> AppResult<Event> {
        self.repository.events.update(id, &data).await
    }

    pub async fn delete_event(&self, id: i32) -> AppResult<()> {
        self.repository.events.delete(id).await
    }

    /// Retire expired events on a fixed interval. Runs until the task is
    /// dropped; intended for `tokio::spawn` from the worker binary.
    pub async fn run_sweeper(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; that initial sweep is wanted.
        loop {
            ticker.tick().await;
            match self.repository.events.sweep_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Event sweep retired {} event(s)", n),
                Err(e) => tracing::error!("Event sweep failed: {}", e),
            }
        }
    }
}
