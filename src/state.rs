use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::import::UserImporter;
use crate::store::SeaOrmStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Application configuration
    pub config: Arc<Config>,
    /// Spreadsheet importer, shared by all upload requests
    pub importer: Arc<UserImporter>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let importer = UserImporter::new(config.import.clone());
        Self {
            db,
            config: Arc::new(config),
            importer: Arc::new(importer),
        }
    }

    /// Import store backed by this state's connection pool
    pub fn store(&self) -> SeaOrmStore {
        SeaOrmStore::new(self.db.clone())
    }
}
