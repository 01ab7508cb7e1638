use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{Router, middleware};
use sea_orm::DatabaseConnection;

use crate::{
    auth::{AuthState, ResetNotifier},
    config::{AppConfig, AuthConfig, DatabaseConfig, SeedConfig},
    db::{connection, entities::user, schema, seed},
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    services::ServiceContext,
    state::AppState,
};

pub const TEST_SECRET: &str = "test-secret-key-123456";

fn memory_database_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_idle: 1,
    }
}

/// Empty in-memory database, no tables.
pub async fn memory_db() -> DatabaseConnection {
    connection::open(&memory_database_config())
        .await
        .expect("open in-memory database")
}

/// In-memory database with every table created.
pub async fn test_db() -> DatabaseConnection {
    let db = memory_db().await;
    schema::ensure_schema(&db).await.expect("apply schema");
    db
}

/// SQLite file under the temp dir, removed on drop. Needed when a test wants
/// more than one pooled connection.
pub struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("dormcart-test-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    pub fn config(&self, max_connections: u32) -> DatabaseConfig {
        DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", self.path.display()),
            max_connections,
            min_idle: 1,
        }
    }

    /// Pool with every table created.
    pub async fn open(&self, max_connections: u32) -> DatabaseConnection {
        connection::connect(&self.config(max_connections))
            .await
            .expect("open file database")
    }
}

impl Default for TempDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database: memory_database_config(),
        auth: Some(AuthConfig::with_secret(TEST_SECRET)),
        seed: SeedConfig { demo_data: false },
        ..Default::default()
    }
}

/// Keeps every reset link instead of delivering it.
#[derive(Default)]
pub struct CapturingResetNotifier {
    links: Mutex<Vec<String>>,
}

impl CapturingResetNotifier {
    pub fn links(&self) -> Vec<String> {
        self.links.lock().expect("notifier lock").clone()
    }

    /// Token part of the most recent link.
    pub fn last_token(&self) -> Option<String> {
        self.links()
            .last()
            .and_then(|link| link.rsplit('/').next())
            .map(str::to_string)
    }
}

#[async_trait]
impl ResetNotifier for CapturingResetNotifier {
    async fn send_reset_link(&self, _user: &user::Model, link: &str) {
        self.links
            .lock()
            .expect("notifier lock")
            .push(link.to_string());
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub notifier: Arc<CapturingResetNotifier>,
}

impl TestApp {
    pub fn services(&self) -> ServiceContext {
        ServiceContext::from_state(&self.state)
    }

    pub fn auth(&self) -> &AuthState {
        &self.state.auth
    }

    /// Full router with the same layers the server installs.
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.state))
            .layer(middleware::from_fn(json_error_middleware))
            .layer(catch_panic_layer())
    }
}

/// Schema applied and categories seeded; no demo data.
pub async fn test_app() -> TestApp {
    test_app_on(test_db().await).await
}

/// Same as [`test_app`] over a database the caller opened with the schema applied.
pub async fn test_app_on(db: DatabaseConnection) -> TestApp {
    let cfg = test_config();
    seed::seed_defaults(&db, &cfg.seed)
        .await
        .expect("seed categories");

    let notifier = Arc::new(CapturingResetNotifier::default());
    let auth_cfg = cfg.require_auth().expect("auth config").clone();
    let auth = AuthState::from_config(&auth_cfg).with_notifier(notifier.clone());

    TestApp {
        state: AppState::new(cfg, db, auth),
        notifier,
    }
}
