//! Lectern University Library Management Core
//!
//! Inventory ledger, loan lifecycle and dashboard aggregation for a
//! university library, persisted in PostgreSQL. Transport (HTTP), identity
//! and notification layers live outside this crate and consume the
//! repositories and services exposed here.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorCode};

/// Application state shared with embedding layers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
