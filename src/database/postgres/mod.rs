//! Postgres implementation of the store traits.

mod campaigns;
mod characters;
mod content;
mod homebrew;
mod instances;
mod rows;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;

use super::manager::{DatabaseError, DatabaseManager};
use super::store::Store;

#[derive(Clone)]
pub struct PgStore {
    manager: DatabaseManager,
    pool: PgPool,
}

impl PgStore {
    pub fn new(manager: &DatabaseManager) -> Self {
        Self {
            pool: manager.pool().clone(),
            manager: manager.clone(),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.manager.health_check().await
    }
}
