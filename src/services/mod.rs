//! Business logic services

pub mod books;
pub mod tokens;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub tokens: tokens::TokenService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            books: books::BooksService::new(repository.clone(), config.catalog.clone()),
            tokens: tokens::TokenService::new(config.auth.clone()),
            repository,
        }
    }
}
