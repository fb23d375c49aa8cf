//! Library catalog API
//!
//! A REST JSON API for managing the books of a library catalog:
//! search, pagination, circulation status and soft deletion.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

use sqlx::{Pool, Postgres};

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire repository and services on top of an existing pool
    pub fn new(config: AppConfig, pool: Pool<Postgres>) -> Self {
        let repository = repository::Repository::new(pool);
        let services = services::Services::new(repository, &config);

        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
