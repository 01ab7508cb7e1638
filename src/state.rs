use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{auth::AuthState, config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection, auth: AuthState) -> Arc<Self> {
        Arc::new(Self { config, db, auth })
    }
}
