//! Business logic services

pub mod catalog;
pub mod dashboard;
pub mod events;
pub mod loans;

use crate::{config::DashboardConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub events: events::EventsService,
    pub dashboard: dashboard::DashboardService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, dashboard_config: &DashboardConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            events: events::EventsService::new(repository.clone()),
            dashboard: dashboard::DashboardService::new(repository, dashboard_config.recent_books),
        }
    }
}
